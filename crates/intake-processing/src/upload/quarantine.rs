//! Quarantine files: uniquely named temp files that delete themselves unless kept.

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use intake_core::constants::{QUARANTINE_PREFIX, QUARANTINE_SUFFIX};
use intake_core::{FileValidationError, IntakeError};
use tempfile::TempPath;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use uuid::Uuid;

use super::types::UploadSource;

/// Owns a file in the quarantine directory. Dropping it removes the file.
#[derive(Debug)]
pub struct QuarantinedFile {
    path: TempPath,
}

impl QuarantinedFile {
    /// Create an empty quarantine file named `intake-<upload_id>-<random>.upload` inside `dir`.
    pub async fn create(dir: &Path, upload_id: Uuid) -> io::Result<(Self, tokio::fs::File)> {
        let dir = dir.to_path_buf();
        let prefix = format!("{QUARANTINE_PREFIX}{upload_id}-");
        let named = tokio::task::spawn_blocking(move || {
            let mut builder = tempfile::Builder::new();
            builder.prefix(&prefix).suffix(QUARANTINE_SUFFIX);
            builder.tempfile_in(&dir)
        })
        .await
        .map_err(io::Error::other)??;

        let (file, path) = named.into_parts();
        Ok((Self { path }, tokio::fs::File::from_std(file)))
    }

    /// Stream `source` into quarantine from its first byte, refusing to write more than
    /// `max_bytes`. Returns the number of bytes written.
    pub async fn fill<R: UploadSource>(
        file: &mut tokio::fs::File,
        source: &mut R,
        max_bytes: u64,
    ) -> Result<u64, IntakeError> {
        source
            .seek(SeekFrom::Start(0))
            .await
            .map_err(|e| IntakeError::io("rewinding upload", e))?;

        // One byte past the limit is enough to tell that the stream is too large.
        let mut limited = (&mut *source).take(max_bytes.saturating_add(1));
        let written = tokio::io::copy(&mut limited, file)
            .await
            .map_err(|e| IntakeError::io("writing quarantine file", e))?;
        if written > max_bytes {
            return Err(FileValidationError::FileTooLarge {
                max_mb: max_bytes / (1024 * 1024),
            }
            .into());
        }

        file.flush()
            .await
            .map_err(|e| IntakeError::io("flushing quarantine file", e))?;
        file.sync_all()
            .await
            .map_err(|e| IntakeError::io("syncing quarantine file", e))?;
        Ok(written)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop tracking the file; the caller becomes responsible for deleting it.
    pub fn keep(self) -> io::Result<PathBuf> {
        self.path.keep().map_err(|e| e.error)
    }
}

/// Whether `file_name` looks like a file this module created.
pub fn is_quarantine_file_name(file_name: &str) -> bool {
    file_name.starts_with(QUARANTINE_PREFIX) && file_name.ends_with(QUARANTINE_SUFFIX)
}
