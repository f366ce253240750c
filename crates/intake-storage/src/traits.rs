//! Artifact store abstraction

use std::path::PathBuf;

use async_trait::async_trait;
use intake_core::{ArtifactSummary, ContentHash};
use intake_processing::ProcessedArtifact;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Commit failed: {0}")]
    CommitFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Artifact not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// An artifact that now lives in permanent storage.
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub key: String,
    pub path: PathBuf,
    /// `summary.temp_path` is rewritten to `path`; the quarantine file no longer exists.
    pub summary: ArtifactSummary,
    /// Identical content was already stored; the quarantine copy was discarded.
    pub deduplicated: bool,
}

/// Storage key for content with this digest: `<shard>/<hex digest>.<extension>`.
pub fn artifact_key(hash: &ContentHash, extension: &str) -> String {
    if extension.is_empty() {
        format!("{}/{}", hash.shard(), hash.as_hex())
    } else {
        format!("{}/{}.{}", hash.shard(), hash.as_hex(), extension)
    }
}

/// Where accepted artifacts go once the pipeline is done with them.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Take ownership of a processed artifact and persist it under its content key.
    async fn commit(&self, artifact: ProcessedArtifact) -> StorageResult<StoredArtifact>;

    async fn exists(&self, hash: &ContentHash, extension: &str) -> StorageResult<bool>;

    async fn delete(&self, key: &str) -> StorageResult<()>;
}
