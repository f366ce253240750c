//! Intake Storage Library
//!
//! Content-addressed persistence for accepted uploads. Artifacts are moved out of quarantine
//! into `<root>/<shard>/<sha256>.<extension>`, where the shard is the first two hex digits of
//! the digest, so identical uploads are stored once.

pub mod local;
pub mod traits;

pub use local::LocalArtifactStore;
pub use traits::{artifact_key, ArtifactStore, StorageError, StorageResult, StoredArtifact};
