//! Content sniffing: determine an upload's real MIME type from its bytes.
//!
//! Two implementations are available and one is chosen when the pipeline is built:
//! [`MagicSniffer`] inspects magic numbers, [`DeclaredTypeSniffer`] trusts the extension and
//! runs the pipeline in reduced-assurance mode.

use intake_core::constants::PDF_MAGIC;
use intake_core::TypePolicy;

use crate::prefix::ContentPrefix;

const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const RTF_MAGIC: &[u8] = b"{\\rtf";

const MIME_PDF: &str = "application/pdf";
const MIME_MSWORD: &str = "application/msword";
const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const MIME_ODT: &str = "application/vnd.oasis.opendocument.text";
const MIME_RTF: &str = "application/rtf";
const MIME_ZIP: &str = "application/zip";
const MIME_TEXT: &str = "text/plain";
const MIME_BINARY: &str = "application/octet-stream";

pub trait ContentSniffer: Send + Sync {
    /// Detected MIME type, or `None` when nothing can be said (e.g. empty content).
    fn sniff(&self, prefix: &ContentPrefix, extension: &str, policy: &TypePolicy)
        -> Option<String>;

    /// True when the sniffer does not actually look at content.
    fn is_reduced_assurance(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str;
}

/// Magic-number based detection for the document formats the pipeline accepts.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicSniffer;

impl MagicSniffer {
    pub fn detect(prefix: &ContentPrefix) -> Option<&'static str> {
        if prefix.is_empty() {
            return None;
        }

        let mime = if prefix.starts_with(PDF_MAGIC) {
            MIME_PDF
        } else if prefix.starts_with(OLE2_MAGIC) {
            // Legacy Office compound documents
            MIME_MSWORD
        } else if prefix.starts_with(ZIP_MAGIC) {
            detect_zip_container(prefix)
        } else if prefix.starts_with(RTF_MAGIC) {
            MIME_RTF
        } else if looks_like_text(prefix) {
            MIME_TEXT
        } else {
            MIME_BINARY
        };

        Some(mime)
    }
}

impl ContentSniffer for MagicSniffer {
    fn sniff(
        &self,
        prefix: &ContentPrefix,
        _extension: &str,
        _policy: &TypePolicy,
    ) -> Option<String> {
        Self::detect(prefix).map(str::to_string)
    }

    fn name(&self) -> &'static str {
        "magic"
    }
}

/// Reduced-assurance fallback: reports the declared extension's canonical MIME type, so the
/// mismatch check can never fire. Only the Content Inspector looks at the bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredTypeSniffer;

impl ContentSniffer for DeclaredTypeSniffer {
    fn sniff(
        &self,
        _prefix: &ContentPrefix,
        extension: &str,
        policy: &TypePolicy,
    ) -> Option<String> {
        policy.canonical_mime_type(extension).map(str::to_string)
    }

    fn is_reduced_assurance(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "declared"
    }
}

/// ZIP-based formats: OpenDocument stores its MIME type uncompressed as the first entry,
/// Office Open XML starts with `[Content_Types].xml` or its part directories.
fn detect_zip_container(prefix: &ContentPrefix) -> &'static str {
    if prefix.contains(b"mimetypeapplication/vnd.oasis.opendocument.text") {
        MIME_ODT
    } else if prefix.contains(b"[Content_Types].xml")
        || prefix.contains(b"word/")
        || prefix.contains(b"_rels/")
    {
        MIME_DOCX
    } else {
        MIME_ZIP
    }
}

fn looks_like_text(prefix: &ContentPrefix) -> bool {
    !prefix.contains(&[0]) && prefix.as_utf8().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix(bytes: &[u8]) -> ContentPrefix {
        ContentPrefix::new(bytes.to_vec(), false)
    }

    #[test]
    fn detects_document_formats() {
        assert_eq!(MagicSniffer::detect(&prefix(b"%PDF-1.7\n")), Some(MIME_PDF));
        assert_eq!(
            MagicSniffer::detect(&prefix(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0])),
            Some(MIME_MSWORD)
        );
        assert_eq!(
            MagicSniffer::detect(&prefix(b"{\\rtf1\\ansi hello}")),
            Some(MIME_RTF)
        );
        assert_eq!(
            MagicSniffer::detect(&prefix(b"Jane Doe\nSoftware Engineer\n")),
            Some(MIME_TEXT)
        );
    }

    #[test]
    fn distinguishes_zip_containers() {
        let docx = b"PK\x03\x04\x14\x00\x06\x00[Content_Types].xml";
        assert_eq!(MagicSniffer::detect(&prefix(docx)), Some(MIME_DOCX));

        let odt = b"PK\x03\x04\x14\x00\x00\x00mimetypeapplication/vnd.oasis.opendocument.text";
        assert_eq!(MagicSniffer::detect(&prefix(odt)), Some(MIME_ODT));

        let zip = b"PK\x03\x04\x14\x00\x00\x00payload.bin";
        assert_eq!(MagicSniffer::detect(&prefix(zip)), Some(MIME_ZIP));
    }

    #[test]
    fn unknown_binary_is_octet_stream() {
        let elf = b"\x7fELF\x02\x01\x01\x00\x00\x00";
        assert_eq!(MagicSniffer::detect(&prefix(elf)), Some(MIME_BINARY));
    }

    #[test]
    fn empty_content_is_undetermined() {
        assert_eq!(MagicSniffer::detect(&prefix(b"")), None);
    }

    #[test]
    fn declared_sniffer_trusts_extension() {
        let policy = TypePolicy::default();
        let sniffer = DeclaredTypeSniffer;
        assert!(sniffer.is_reduced_assurance());
        assert_eq!(
            sniffer.sniff(&prefix(b"\x7fELF"), "docx", &policy).as_deref(),
            Some(MIME_DOCX)
        );
        assert_eq!(sniffer.sniff(&prefix(b"x"), "md", &policy), None);
    }
}
