//! Traits for the upload pipeline.

use std::path::Path;

use async_trait::async_trait;
use intake_core::{ScanOutcome, VirusScanError};

/// External malware scanner (e.g. ClamAV). Implemented in intake-services.
///
/// `Ok(ScanOutcome::ScannerUnavailable)` means the engine could not be reached at all and the
/// pipeline proceeds fail-open. An `Err` means the engine ran but could not vouch for the file.
#[async_trait]
pub trait VirusScanner: Send + Sync {
    async fn scan(&self, path: &Path) -> Result<ScanOutcome, VirusScanError>;

    fn engine_name(&self) -> &str;
}
