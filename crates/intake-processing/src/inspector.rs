//! Content Inspector: pattern and structure checks over the leading bytes of an upload.

use std::sync::Arc;

use intake_core::constants::PDF_MAGIC;
use intake_core::{ContentRules, FileValidationError, InspectionVerdict};
use regex::Regex;

use crate::prefix::ContentPrefix;

#[derive(Debug, Clone)]
pub struct ContentInspector {
    rules: Arc<ContentRules>,
    shortener_pattern: Option<Regex>,
}

impl ContentInspector {
    pub fn new(rules: ContentRules) -> Result<Self, regex::Error> {
        let shortener_pattern = build_shortener_pattern(&rules.link_shortener_domains)?;
        Ok(Self {
            rules: Arc::new(rules),
            shortener_pattern,
        })
    }

    /// Inspect `prefix` for an upload whose (already gated) extension is `extension`.
    ///
    /// Universal patterns run first, then the checks specific to the logical type.
    pub fn inspect(&self, prefix: &ContentPrefix, extension: &str) -> InspectionVerdict {
        self.check(prefix, extension).into()
    }

    fn check(&self, prefix: &ContentPrefix, extension: &str) -> Result<(), FileValidationError> {
        if prefix.is_empty() {
            return Err(FileValidationError::EmptyFile);
        }

        if let Some(pattern) = self
            .rules
            .suspicious_patterns
            .iter()
            .find(|p| prefix.contains_lowercase(&p.needle))
        {
            tracing::debug!(
                category = ?pattern.category,
                extension = %extension,
                "Suspicious pattern found in upload"
            );
            return Err(FileValidationError::SuspiciousContent(pattern.category));
        }

        match extension {
            "pdf" => self.check_pdf(prefix),
            "doc" | "docx" => self.check_office(prefix, extension),
            "txt" => self.check_text(prefix),
            _ => Ok(()),
        }
    }

    fn check_pdf(&self, prefix: &ContentPrefix) -> Result<(), FileValidationError> {
        if !prefix.starts_with(PDF_MAGIC) {
            return Err(unsafe_structure("pdf", "Missing PDF header"));
        }
        if contains_any(prefix, &self.rules.pdf_script_markers) {
            return Err(unsafe_structure("pdf", "PDF contains JavaScript"));
        }
        if contains_any(prefix, &self.rules.pdf_embedded_file_markers) {
            return Err(unsafe_structure("pdf", "PDF contains embedded files"));
        }
        Ok(())
    }

    fn check_office(
        &self,
        prefix: &ContentPrefix,
        extension: &str,
    ) -> Result<(), FileValidationError> {
        if contains_any(prefix, &self.rules.office_macro_markers) {
            return Err(unsafe_structure(extension, "Document contains macros"));
        }
        Ok(())
    }

    fn check_text(&self, prefix: &ContentPrefix) -> Result<(), FileValidationError> {
        let Some(text) = prefix.as_utf8() else {
            return Err(unsafe_structure("txt", "Text file is not valid UTF-8"));
        };
        if let Some(pattern) = &self.shortener_pattern {
            if pattern.is_match(text) {
                return Err(unsafe_structure("txt", "Text contains shortened links"));
            }
        }
        Ok(())
    }
}

fn unsafe_structure(file_type: &str, reason: &str) -> FileValidationError {
    FileValidationError::UnsafeStructure {
        file_type: file_type.to_string(),
        reason: reason.to_string(),
    }
}

fn contains_any(prefix: &ContentPrefix, markers: &[String]) -> bool {
    markers.iter().any(|m| prefix.contains(m.as_bytes()))
}

/// Match shortener domains only as whole hosts: `t.co` must not fire inside `microsoft.com`.
fn build_shortener_pattern(domains: &[String]) -> Result<Option<Regex>, regex::Error> {
    let alternation = domains
        .iter()
        .map(|d| d.trim())
        .filter(|d| !d.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    if alternation.is_empty() {
        return Ok(None);
    }

    let pattern = format!(
        r"(?i)(?:^|[^a-z0-9\-])(?:{alternation})(?:$|[^a-z0-9.\-]|\.(?:$|[^a-z0-9]))"
    );
    Regex::new(&pattern).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::PatternCategory;

    fn inspector() -> ContentInspector {
        ContentInspector::new(ContentRules::default()).unwrap()
    }

    fn prefix(bytes: &[u8]) -> ContentPrefix {
        ContentPrefix::new(bytes.to_vec(), false)
    }

    fn reason(verdict: InspectionVerdict) -> String {
        match verdict.into_result() {
            Err(FileValidationError::UnsafeStructure { reason, .. }) => reason,
            other => panic!("expected unsafe structure, got {other:?}"),
        }
    }

    #[test]
    fn empty_content_is_rejected() {
        assert_eq!(
            inspector().inspect(&prefix(b""), "txt"),
            InspectionVerdict::Unsafe(FileValidationError::EmptyFile)
        );
    }

    #[test]
    fn universal_patterns_are_case_insensitive() {
        let verdict = inspector().inspect(&prefix(b"Hello <ScRiPt>alert(1)</script>"), "txt");
        assert_eq!(
            verdict,
            InspectionVerdict::Unsafe(FileValidationError::SuspiciousContent(
                PatternCategory::ScriptInjection
            ))
        );

        let verdict = inspector().inspect(&prefix(b"%PDF-1.4 EVAL(payload)"), "pdf");
        assert_eq!(
            verdict,
            InspectionVerdict::Unsafe(FileValidationError::SuspiciousContent(
                PatternCategory::CodeExecution
            ))
        );
    }

    #[test]
    fn universal_patterns_apply_to_every_type() {
        let verdict = inspector().inspect(&prefix(b"{\\rtf1 fopen(\"/etc/passwd\")}"), "rtf");
        assert_eq!(
            verdict,
            InspectionVerdict::Unsafe(FileValidationError::SuspiciousContent(
                PatternCategory::FileAccess
            ))
        );
    }

    #[test]
    fn pdf_checks() {
        let inspector = inspector();
        assert!(inspector
            .inspect(&prefix(b"%PDF-1.7\n1 0 obj << /Type /Catalog >>"), "pdf")
            .is_safe());
        assert_eq!(
            reason(inspector.inspect(&prefix(b"not a pdf"), "pdf")),
            "Missing PDF header"
        );
        assert_eq!(
            reason(inspector.inspect(&prefix(b"%PDF-1.4\n<< /OpenAction /JavaScript >>"), "pdf")),
            "PDF contains JavaScript"
        );
        assert_eq!(
            reason(inspector.inspect(&prefix(b"%PDF-1.4\n<< /Type /EmbeddedFile >>"), "pdf")),
            "PDF contains embedded files"
        );
    }

    #[test]
    fn office_macro_markers() {
        let verdict = inspector().inspect(&prefix(b"PK\x03\x04 word/vbaProject.bin VBA"), "docx");
        assert_eq!(reason(verdict), "Document contains macros");

        assert!(inspector()
            .inspect(&prefix(b"PK\x03\x04 word/document.xml"), "docx")
            .is_safe());
    }

    #[test]
    fn text_must_be_utf8() {
        let verdict = inspector().inspect(&prefix(&[b'h', b'i', 0xFF, 0xFE]), "txt");
        assert_eq!(reason(verdict), "Text file is not valid UTF-8");
    }

    #[test]
    fn truncated_text_tail_is_tolerated() {
        let mut bytes = b"Experience: caf".to_vec();
        bytes.push(0xC3);
        assert!(inspector()
            .inspect(&ContentPrefix::new(bytes, true), "txt")
            .is_safe());
    }

    #[test]
    fn shortened_links_in_text() {
        let inspector = inspector();
        assert_eq!(
            reason(inspector.inspect(&prefix(b"Portfolio: https://bit.ly/abc123"), "txt")),
            "Text contains shortened links"
        );
        assert_eq!(
            reason(inspector.inspect(&prefix(b"see T.CO/xyz"), "txt")),
            "Text contains shortened links"
        );
        assert!(inspector
            .inspect(&prefix(b"Worked at microsoft.com and at.company.org"), "txt")
            .is_safe());
    }

    #[test]
    fn shorteners_only_checked_in_text() {
        assert!(inspector()
            .inspect(&prefix(b"{\\rtf1 https://bit.ly/abc}"), "rtf")
            .is_safe());
    }

    #[test]
    fn no_shortener_domains_disables_link_check() {
        let rules = ContentRules {
            link_shortener_domains: Vec::new(),
            ..ContentRules::default()
        };
        let inspector = ContentInspector::new(rules).unwrap();
        assert!(inspector.inspect(&prefix(b"https://bit.ly/x"), "txt").is_safe());
    }
}
