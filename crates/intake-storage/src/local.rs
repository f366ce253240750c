use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use intake_core::ContentHash;
use intake_processing::ProcessedArtifact;
use tokio::fs;

use crate::traits::{artifact_key, ArtifactStore, StorageError, StorageResult, StoredArtifact};

/// Local filesystem artifact store
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    /// Create a new LocalArtifactStore
    ///
    /// # Arguments
    /// * `root` - Root directory for stored artifacts (e.g., "/var/lib/intake/artifacts")
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(LocalArtifactStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Keys are relative paths made of plain components; anything that could escape the
    /// storage root is refused.
    pub fn path_for(&self, storage_key: &str) -> StorageResult<PathBuf> {
        let key = Path::new(storage_key);
        let plain = !storage_key.is_empty()
            && key
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !plain || storage_key.contains("..") || storage_key.contains('\\') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(self.root.join(key))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Copy into place through a sibling temp name, for when rename cannot cross filesystems.
    async fn copy_into_place(&self, source: &Path, destination: &Path) -> StorageResult<()> {
        let mut partial = destination.as_os_str().to_owned();
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        if let Err(e) = fs::copy(source, &partial).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StorageError::CommitFailed(format!(
                "Failed to copy {} to {}: {}",
                source.display(),
                partial.display(),
                e
            )));
        }
        if let Err(e) = fs::rename(&partial, destination).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StorageError::CommitFailed(format!(
                "Failed to move {} into place: {}",
                partial.display(),
                e
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    #[tracing::instrument(skip(self, artifact), fields(upload_id = %artifact.upload_id))]
    async fn commit(&self, artifact: ProcessedArtifact) -> StorageResult<StoredArtifact> {
        let key = artifact_key(&artifact.content_hash, &artifact.extension);
        let path = self.path_for(&key)?;
        let start = Instant::now();
        let (mut summary, quarantine) = artifact.into_parts();
        summary.temp_path = path.clone();

        if fs::try_exists(&path).await? {
            // Dropping the quarantine handle removes the duplicate.
            drop(quarantine);
            tracing::info!(key = %key, "Identical artifact already stored, discarding duplicate");
            return Ok(StoredArtifact {
                key,
                path,
                summary,
                deduplicated: true,
            });
        }

        self.ensure_parent_dir(&path).await?;

        match fs::rename(quarantine.path(), &path).await {
            Ok(()) => {
                // The file moved; stop the handle from deleting a path that no longer exists.
                quarantine.keep()?;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Rename out of quarantine failed, copying instead");
                self.copy_into_place(quarantine.path(), &path).await?;
                drop(quarantine);
            }
        }

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = summary.size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Artifact committed to local storage"
        );

        Ok(StoredArtifact {
            key,
            path,
            summary,
            deduplicated: false,
        })
    }

    async fn exists(&self, hash: &ContentHash, extension: &str) -> StorageResult<bool> {
        let path = self.path_for(&artifact_key(hash, extension))?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()));
            }
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                )));
            }
        }

        // Drop the shard directory once it is empty; failure just means it is still in use.
        if let Some(parent) = path.parent() {
            if parent != self.root {
                let _ = fs::remove_dir(parent).await;
            }
        }

        tracing::info!(key = %key, "Artifact deleted from local storage");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn rejects_escaping_keys() {
        let dir = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(dir.path()).await.unwrap();

        for key in ["../etc/passwd", "/etc/passwd", "ab/../../x", "", "ab\\..\\x"] {
            assert!(
                matches!(store.path_for(key), Err(StorageError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
        }
        assert_eq!(
            store.path_for("ab/abcdef.pdf").unwrap(),
            dir.path().join("ab/abcdef.pdf")
        );
    }

    #[tokio::test]
    async fn creates_missing_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("nested/artifacts");
        let store = LocalArtifactStore::new(&root).await.unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root);
    }

    #[tokio::test]
    async fn failed_move_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(dir.path()).await.unwrap();
        let source = dir.path().join("source.txt");
        std::fs::write(&source, b"resume").unwrap();
        // A non-empty directory at the destination makes the final rename fail.
        let destination = dir.path().join("ab/taken.txt");
        std::fs::create_dir_all(destination.join("occupied")).unwrap();

        let err = store
            .copy_into_place(&source, &destination)
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::CommitFailed(_)));
        assert!(!dir.path().join("ab/taken.txt.partial").exists());
        assert!(source.exists());
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(dir.path()).await.unwrap();
        assert!(matches!(
            store.delete("ab/nothing.pdf").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
