//! Upload pipeline: sanitize → gate → inspect → quarantine → scan → hash.

pub mod hashing;
pub mod quarantine;
pub mod traits;
pub mod types;

mod pipeline;

pub use hashing::hash_file;
pub use pipeline::{UploadPipeline, UploadPipelineBuilder};
pub use quarantine::QuarantinedFile;
pub use traits::VirusScanner;
pub use types::{ProcessedArtifact, UploadCandidate, UploadSource};
