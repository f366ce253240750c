use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ContentHash, ScanOutcome};

/// Serializable description of a processed upload, handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub upload_id: Uuid,
    pub sanitized_filename: String,
    /// Caller-declared name, for display only.
    pub original_filename: String,
    pub extension: String,
    pub size_bytes: u64,
    pub content_hash: ContentHash,
    pub scan_outcome: ScanOutcome,
    pub temp_path: PathBuf,
    pub processed_at: DateTime<Utc>,
}
