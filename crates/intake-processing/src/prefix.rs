//! The bounded leading slice of an upload that sniffing and inspection work on.

use std::str;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPrefix {
    bytes: Vec<u8>,
    lowercase: Vec<u8>,
    /// The upload continues past the end of this prefix.
    truncated: bool,
}

impl ContentPrefix {
    pub fn new(bytes: Vec<u8>, truncated: bool) -> Self {
        let lowercase = bytes.to_ascii_lowercase();
        Self {
            bytes,
            lowercase,
            truncated,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn starts_with(&self, magic: &[u8]) -> bool {
        self.bytes.starts_with(magic)
    }

    /// Case-sensitive substring search.
    pub fn contains(&self, needle: &[u8]) -> bool {
        contains_subslice(&self.bytes, needle)
    }

    /// ASCII case-insensitive search; `needle` must already be lowercase.
    pub fn contains_lowercase(&self, needle: &[u8]) -> bool {
        contains_subslice(&self.lowercase, needle)
    }

    /// Decode the prefix as UTF-8.
    ///
    /// A multi-byte sequence cut off by the end of a truncated prefix is dropped rather than
    /// treated as invalid, since the rest of the character lives past the prefix boundary.
    pub fn as_utf8(&self) -> Option<&str> {
        match str::from_utf8(&self.bytes) {
            Ok(text) => Some(text),
            Err(err) if self.truncated && err.error_len().is_none() => {
                str::from_utf8(&self.bytes[..err.valid_up_to()]).ok()
            }
            Err(_) => None,
        }
    }
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_search() {
        let prefix = ContentPrefix::new(b"Hello <SCRIPT>".to_vec(), false);
        assert!(prefix.contains_lowercase(b"<script"));
        assert!(!prefix.contains(b"<script"));
        assert!(prefix.contains(b"<SCRIPT"));
    }

    #[test]
    fn truncated_multibyte_tail_is_tolerated() {
        // "é" is 0xC3 0xA9; keep only the lead byte at the end.
        let mut bytes = b"caf".to_vec();
        bytes.push(0xC3);
        let truncated = ContentPrefix::new(bytes.clone(), true);
        assert_eq!(truncated.as_utf8(), Some("caf"));

        let complete = ContentPrefix::new(bytes, false);
        assert_eq!(complete.as_utf8(), None);
    }

    #[test]
    fn invalid_sequences_are_rejected_even_when_truncated() {
        let prefix = ContentPrefix::new(vec![b'a', 0xFF, b'b'], true);
        assert_eq!(prefix.as_utf8(), None);
    }
}
