//! Report printed by `intake_check`.

use intake_core::{ArtifactSummary, ErrorMetadata, IntakeError};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Accepted,
    Rejected,
    Failed,
}

impl CheckStatus {
    /// Process exit code: 0 accepted, 1 rejected, 2 internal failure.
    pub fn exit_code(self) -> u8 {
        match self {
            CheckStatus::Accepted => 0,
            CheckStatus::Rejected => 1,
            CheckStatus::Failed => 2,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deduplicated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckReport {
    pub fn accepted(artifact: ArtifactSummary) -> Self {
        Self {
            status: CheckStatus::Accepted,
            artifact: Some(artifact),
            storage_key: None,
            deduplicated: None,
            error_code: None,
            message: None,
        }
    }

    pub fn with_storage(mut self, key: String, deduplicated: bool) -> Self {
        self.storage_key = Some(key);
        self.deduplicated = Some(deduplicated);
        self
    }

    /// Only the client-facing message is reported; engine details stay in the logs.
    pub fn from_error(error: &IntakeError) -> Self {
        let status = if error.is_rejection() {
            CheckStatus::Rejected
        } else {
            CheckStatus::Failed
        };
        Self {
            status,
            artifact: None,
            storage_key: None,
            deduplicated: None,
            error_code: Some(error.error_code()),
            message: Some(error.client_message()),
        }
    }

    pub fn to_table(&self) -> String {
        let mut lines = vec![String::from("\n=== Upload Check ===\n")];
        lines.push(format!("Status:       {:?}", self.status));

        if let Some(artifact) = &self.artifact {
            lines.push(format!("Upload ID:    {}", artifact.upload_id));
            lines.push(format!("Filename:     {}", artifact.sanitized_filename));
            if artifact.original_filename != artifact.sanitized_filename {
                lines.push(format!("Original:     {}", artifact.original_filename));
            }
            lines.push(format!("Type:         {}", artifact.extension));
            lines.push(format!(
                "Size:         {:.2} KB ({} bytes)",
                artifact.size_bytes as f64 / 1024.0,
                artifact.size_bytes
            ));
            lines.push(format!("SHA-256:      {}", artifact.content_hash));
            lines.push(format!("Scan:         {}", artifact.scan_outcome.as_str()));
        }
        if let Some(key) = &self.storage_key {
            let note = if self.deduplicated == Some(true) {
                " (already stored)"
            } else {
                ""
            };
            lines.push(format!("Stored as:    {key}{note}"));
        }
        if let Some(code) = self.error_code {
            lines.push(format!("Error code:   {code}"));
        }
        if let Some(message) = &self.message {
            lines.push(format!("Reason:       {message}"));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::{FileValidationError, VirusScanError};

    #[test]
    fn rejection_report() {
        let error = IntakeError::from(FileValidationError::DangerousExtension("exe".into()));
        let report = CheckReport::from_error(&error);
        assert_eq!(report.status, CheckStatus::Rejected);
        assert_eq!(report.status.exit_code(), 1);
        assert_eq!(report.error_code, Some("FILE_VALIDATION_FAILED"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "rejected");
        assert!(json.get("artifact").is_none());
    }

    #[test]
    fn virus_detail_is_not_reported() {
        let error = IntakeError::from(VirusScanError::ThreatDetected {
            detail: "Win.Test.EICAR_HDB-1".into(),
        });
        let report = CheckReport::from_error(&error);
        assert!(!report.to_table().contains("EICAR"));
        assert_eq!(report.error_code, Some("VIRUS_DETECTED"));
    }

    #[test]
    fn io_failure_is_not_a_rejection() {
        let error = IntakeError::io(
            "writing quarantine file",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        let report = CheckReport::from_error(&error);
        assert_eq!(report.status, CheckStatus::Failed);
        assert_eq!(report.status.exit_code(), 2);
    }
}
