//! Intake Core Library
//!
//! This crate provides the configuration, error taxonomy, and shared models used by every
//! stage of the upload ingestion pipeline.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{IntakeConfig, ScanBackend, SniffingMode};
pub use error::{ErrorMetadata, FileValidationError, IntakeError, LogLevel, VirusScanError};
pub use models::{
    ArtifactSummary, ContentHash, ContentRules, InspectionVerdict, PatternCategory, PolicyError,
    ScanOutcome, SuspiciousPattern, TypePolicy,
};
