use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CODE_EXECUTION_PATTERNS, FILE_ACCESS_PATTERNS, LINK_SHORTENER_DOMAINS, OFFICE_MACRO_MARKERS,
    PDF_EMBEDDED_FILE_MARKERS, PDF_SCRIPT_MARKERS, SCRIPT_INJECTION_PATTERNS,
};

/// Category reported when a suspicious pattern matches. The raw pattern is never surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    ScriptInjection,
    CodeExecution,
    FileAccess,
}

impl fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PatternCategory::ScriptInjection => "embedded script or markup detected",
            PatternCategory::CodeExecution => "code execution instructions detected",
            PatternCategory::FileAccess => "file access instructions detected",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspiciousPattern {
    /// Lowercase needle, matched against the lowercased prefix.
    pub needle: Vec<u8>,
    pub category: PatternCategory,
}

impl SuspiciousPattern {
    pub fn new(needle: &str, category: PatternCategory) -> Self {
        Self {
            needle: needle.to_ascii_lowercase().into_bytes(),
            category,
        }
    }
}

/// Inspection tables used by the Content Inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRules {
    pub suspicious_patterns: Vec<SuspiciousPattern>,
    pub pdf_script_markers: Vec<String>,
    pub pdf_embedded_file_markers: Vec<String>,
    pub office_macro_markers: Vec<String>,
    pub link_shortener_domains: Vec<String>,
}

impl Default for ContentRules {
    fn default() -> Self {
        let tagged = |patterns: &[&str], category| {
            patterns
                .iter()
                .map(move |p| SuspiciousPattern::new(p, category))
                .collect::<Vec<_>>()
        };

        let mut suspicious_patterns =
            tagged(SCRIPT_INJECTION_PATTERNS, PatternCategory::ScriptInjection);
        suspicious_patterns.extend(tagged(CODE_EXECUTION_PATTERNS, PatternCategory::CodeExecution));
        suspicious_patterns.extend(tagged(FILE_ACCESS_PATTERNS, PatternCategory::FileAccess));

        let owned =
            |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };

        Self {
            suspicious_patterns,
            pdf_script_markers: owned(PDF_SCRIPT_MARKERS),
            pdf_embedded_file_markers: owned(PDF_EMBEDDED_FILE_MARKERS),
            office_macro_markers: owned(OFFICE_MACRO_MARKERS),
            link_shortener_domains: owned(LINK_SHORTENER_DOMAINS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_tag_every_pattern() {
        let rules = ContentRules::default();
        let count = |category| {
            rules
                .suspicious_patterns
                .iter()
                .filter(|p| p.category == category)
                .count()
        };
        assert_eq!(count(PatternCategory::ScriptInjection), 8);
        assert_eq!(count(PatternCategory::CodeExecution), 5);
        assert_eq!(count(PatternCategory::FileAccess), 8);
    }

    #[test]
    fn category_display_does_not_leak_patterns() {
        let label = PatternCategory::ScriptInjection.to_string();
        assert!(!label.contains("<script"));
    }
}
