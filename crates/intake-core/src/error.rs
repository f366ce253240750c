//! Error types module
//!
//! The pipeline distinguishes two user-facing failure categories, [`FileValidationError`] and
//! [`VirusScanError`], from hard internal failures (I/O, hashing). All of them are unified under
//! [`IntakeError`], which callers map onto their own transport (HTTP status, CLI exit code).

use std::io;
use std::path::PathBuf;

use crate::models::PatternCategory;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for rejected uploads worth noticing
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be surfaced to the uploading user.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "FILE_VALIDATION_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether the user can fix this by uploading a different file
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// The candidate is structurally or semantically unacceptable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileValidationError {
    #[error("No file provided")]
    MissingFile,

    #[error("File size exceeds maximum allowed size of {max_mb}MB")]
    FileTooLarge { max_mb: u64 },

    #[error("Dangerous file type '.{0}' is not allowed")]
    DangerousExtension(String),

    #[error("File type '{extension}' is not allowed. Allowed types: {}", .allowed.join(", "))]
    DisallowedType {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("File MIME type '{detected}' does not match expected type for '{extension}'")]
    MimeMismatch { detected: String, extension: String },

    #[error("File is empty")]
    EmptyFile,

    #[error("File content validation failed: {0}")]
    SuspiciousContent(PatternCategory),

    #[error("File content validation failed: {reason}")]
    UnsafeStructure { file_type: String, reason: String },
}

/// The scanning engine found a threat or could not vouch for the file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VirusScanError {
    /// The engine's raw report is kept for logs only.
    #[error("Virus detected in uploaded file")]
    ThreatDetected { detail: String },

    #[error("Virus scan could not be completed")]
    EngineFailure(String),

    #[error("Virus scan timed out after {secs} seconds")]
    Timeout { secs: u64 },
}

impl VirusScanError {
    /// Engine-side detail (signature name, stderr), never shown to the uploader.
    pub fn detail(&self) -> Option<&str> {
        match self {
            VirusScanError::ThreatDetected { detail } => Some(detail),
            VirusScanError::EngineFailure(detail) => Some(detail),
            VirusScanError::Timeout { .. } => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("File validation failed: {0}")]
    Validation(#[from] FileValidationError),

    #[error("Virus scan failed: {0}")]
    VirusScan(#[from] VirusScanError),

    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Content hash unavailable for {}: {source}", .path.display())]
    HashUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl IntakeError {
    pub fn io(context: &'static str, source: io::Error) -> Self {
        IntakeError::Io { context, source }
    }

    /// True for failures the uploader caused (validation or scan rejections).
    pub fn is_rejection(&self) -> bool {
        matches!(self, IntakeError::Validation(_) | IntakeError::VirusScan(_))
    }
}

impl ErrorMetadata for IntakeError {
    fn error_code(&self) -> &'static str {
        match self {
            IntakeError::Validation(_) => "FILE_VALIDATION_FAILED",
            IntakeError::VirusScan(VirusScanError::ThreatDetected { .. }) => "VIRUS_DETECTED",
            IntakeError::VirusScan(_) => "VIRUS_SCAN_FAILED",
            IntakeError::Io { .. } => "IO_ERROR",
            IntakeError::HashUnavailable { .. } => "HASH_UNAVAILABLE",
        }
    }

    fn is_recoverable(&self) -> bool {
        self.is_rejection()
    }

    fn client_message(&self) -> String {
        match self {
            IntakeError::Validation(_) | IntakeError::VirusScan(_) => self.to_string(),
            IntakeError::Io { .. } | IntakeError::HashUnavailable { .. } => {
                "File processing failed".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            IntakeError::Validation(_) => LogLevel::Debug,
            IntakeError::VirusScan(_) => LogLevel::Warn,
            IntakeError::Io { .. } | IntakeError::HashUnavailable { .. } => LogLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_specific() {
        let err = IntakeError::from(FileValidationError::FileTooLarge { max_mb: 10 });
        assert_eq!(
            err.to_string(),
            "File validation failed: File size exceeds maximum allowed size of 10MB"
        );

        let err = FileValidationError::DisallowedType {
            extension: "gif".to_string(),
            allowed: vec!["pdf".to_string(), "txt".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "File type 'gif' is not allowed. Allowed types: pdf, txt"
        );

        let err = FileValidationError::DangerousExtension("exe".to_string());
        assert_eq!(err.to_string(), "Dangerous file type '.exe' is not allowed");
    }

    #[test]
    fn threat_detail_is_not_echoed() {
        let err = IntakeError::from(VirusScanError::ThreatDetected {
            detail: "Eicar-Test-Signature".to_string(),
        });
        assert!(!err.client_message().contains("Eicar"));
        assert_eq!(err.error_code(), "VIRUS_DETECTED");
        match err {
            IntakeError::VirusScan(scan) => assert_eq!(scan.detail(), Some("Eicar-Test-Signature")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn io_failures_are_hidden_from_clients() {
        let err = IntakeError::io(
            "writing quarantine file",
            io::Error::new(io::ErrorKind::Other, "disk full"),
        );
        assert_eq!(err.client_message(), "File processing failed");
        assert!(!err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn rejections_are_recoverable() {
        let err = IntakeError::from(FileValidationError::EmptyFile);
        assert!(err.is_rejection());
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }
}
