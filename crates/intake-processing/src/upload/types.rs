//! Types for the upload pipeline.

use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use intake_core::{ArtifactSummary, ContentHash, ScanOutcome};
use tokio::io::{AsyncRead, AsyncSeek};
use uuid::Uuid;

use super::quarantine::QuarantinedFile;

/// A seekable byte stream the pipeline can measure, sniff, and copy.
pub trait UploadSource: AsyncRead + AsyncSeek + Unpin + Send {}

impl<T> UploadSource for T where T: AsyncRead + AsyncSeek + Unpin + Send {}

/// An untrusted upload as it arrives from the caller.
#[derive(Debug)]
pub struct UploadCandidate<R> {
    pub source: R,
    /// Client-declared filename, untrusted
    pub filename: String,
    /// Client-declared MIME type, advisory only
    pub content_type: Option<String>,
    /// Client-declared length, never trusted over the stream itself
    pub declared_length: Option<u64>,
}

impl<R: UploadSource> UploadCandidate<R> {
    pub fn new(source: R, filename: impl Into<String>) -> Self {
        Self {
            source,
            filename: filename.into(),
            content_type: None,
            declared_length: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_declared_length(mut self, length: u64) -> Self {
        self.declared_length = Some(length);
        self
    }
}

impl UploadCandidate<Cursor<Vec<u8>>> {
    /// Candidate backed by an in-memory buffer.
    pub fn from_bytes(data: Vec<u8>, filename: impl Into<String>) -> Self {
        Self::new(Cursor::new(data), filename)
    }
}

/// A candidate that passed every check and now sits in quarantine.
///
/// The quarantined file is deleted when this value is dropped, unless ownership of it is taken
/// with [`ProcessedArtifact::keep`] or [`ProcessedArtifact::into_parts`].
#[derive(Debug)]
pub struct ProcessedArtifact {
    pub upload_id: Uuid,
    pub sanitized_filename: String,
    pub original_filename: String,
    pub extension: String,
    pub size_bytes: u64,
    pub content_hash: ContentHash,
    pub scan_outcome: ScanOutcome,
    pub processed_at: DateTime<Utc>,
    quarantine: QuarantinedFile,
}

impl ProcessedArtifact {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        upload_id: Uuid,
        sanitized_filename: String,
        original_filename: String,
        extension: String,
        size_bytes: u64,
        content_hash: ContentHash,
        scan_outcome: ScanOutcome,
        quarantine: QuarantinedFile,
    ) -> Self {
        Self {
            upload_id,
            sanitized_filename,
            original_filename,
            extension,
            size_bytes,
            content_hash,
            scan_outcome,
            processed_at: Utc::now(),
            quarantine,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.quarantine.path()
    }

    pub fn content_hash_hex(&self) -> &str {
        self.content_hash.as_hex()
    }

    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            upload_id: self.upload_id,
            sanitized_filename: self.sanitized_filename.clone(),
            original_filename: self.original_filename.clone(),
            extension: self.extension.clone(),
            size_bytes: self.size_bytes,
            content_hash: self.content_hash.clone(),
            scan_outcome: self.scan_outcome.clone(),
            temp_path: self.quarantine.path().to_path_buf(),
            processed_at: self.processed_at,
        }
    }

    /// Split into the summary and the still-owned quarantine file.
    pub fn into_parts(self) -> (ArtifactSummary, QuarantinedFile) {
        let summary = self.summary();
        (summary, self.quarantine)
    }

    /// Persist the quarantined file: it will no longer be deleted on drop.
    pub fn keep(self) -> io::Result<(ArtifactSummary, PathBuf)> {
        let (summary, quarantine) = self.into_parts();
        let path = quarantine.keep()?;
        Ok((summary, path))
    }
}
