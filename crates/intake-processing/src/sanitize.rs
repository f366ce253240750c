//! Filename sanitization.

use intake_core::constants::{MAX_FILENAME_LENGTH, UNNAMED_FILE};

/// Substrings replaced with `_`. `..` goes first so `...` cannot leave a traversal behind.
const DANGEROUS_SEQUENCES: &[&str] = &["..", "/", "\\", ":", "*", "?", "\"", "<", ">", "|"];

/// Sanitize an untrusted filename to prevent path traversal and invalid characters.
///
/// Keeps only the final path component (either separator style), replaces dangerous
/// sequences and control characters with `_`, substitutes a placeholder for empty names,
/// and truncates names longer than 255 bytes while keeping the extension.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let mut sanitized: String = base
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();
    for sequence in DANGEROUS_SEQUENCES {
        sanitized = sanitized.replace(sequence, "_");
    }

    if sanitized.trim().is_empty() {
        return UNNAMED_FILE.to_string();
    }

    if sanitized.len() > MAX_FILENAME_LENGTH {
        sanitized = truncate_preserving_extension(&sanitized, MAX_FILENAME_LENGTH);
    }

    sanitized
}

fn truncate_preserving_extension(name: &str, max_len: usize) -> String {
    // A leading dot marks a hidden file, not an extension.
    let (stem, extension) = match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    };

    if extension.len() >= max_len {
        return floor_char_boundary(name, max_len).to_string();
    }

    let stem = floor_char_boundary(stem, max_len - extension.len());
    format!("{stem}{extension}")
}

fn floor_char_boundary(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
