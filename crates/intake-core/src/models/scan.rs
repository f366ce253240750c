use serde::{Deserialize, Serialize};

/// Result reported by a virus scanner.
///
/// `ScannerUnavailable` lets the upload through (the engine is missing, which says nothing
/// about the file) but stays distinguishable from `Clean` in logs and summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOutcome {
    Clean,
    Infected(String),
    ScannerUnavailable,
}

impl ScanOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanOutcome::Clean => "clean",
            ScanOutcome::Infected(_) => "infected",
            ScanOutcome::ScannerUnavailable => "scanner_unavailable",
        }
    }
}
