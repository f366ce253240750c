//! Intake Processing Library
//!
//! The ingestion pipeline proper: filename sanitization, content sniffing, the Type Gate, the
//! Content Inspector, and the upload orchestrator that quarantines, scans, and hashes a
//! candidate before handing it back as a [`ProcessedArtifact`].

pub mod inspector;
pub mod prefix;
pub mod sanitize;
pub mod sniff;
pub mod upload;
pub mod validator;

// Re-export commonly used types
pub use inspector::ContentInspector;
pub use prefix::ContentPrefix;
pub use sanitize::sanitize_filename;
pub use sniff::{ContentSniffer, DeclaredTypeSniffer, MagicSniffer};
pub use upload::{
    hash_file, ProcessedArtifact, QuarantinedFile, UploadCandidate, UploadPipeline,
    UploadPipelineBuilder, UploadSource, VirusScanner,
};
pub use validator::{GateOutcome, TypeGate};
