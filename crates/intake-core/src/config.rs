//! Configuration module
//!
//! Deployment settings for the ingestion pipeline: which file types are accepted, how large
//! they may be, how (and whether) uploads are virus scanned, and where quarantined and
//! committed files live.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{DANGEROUS_EXTENSIONS, DEFAULT_SCAN_TIMEOUT_SECS};
use crate::models::{PolicyError, TypePolicy};

const MAX_FILE_SIZE_MB: u64 = 10;
const CLAMAV_PORT: u16 = 3310;
const QUARANTINE_MAX_AGE_SECS: u64 = 3600;
const DEFAULT_ALLOWED_EXTENSIONS: &str = "pdf,doc,docx,txt,rtf,odt";

/// Which scanning engine backs the `VirusScanner` port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanBackend {
    /// `clamscan` executable, invoked per file
    ClamScan,
    /// `clamd` daemon over TCP
    Clamd,
}

impl FromStr for ScanBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clamscan" => Ok(ScanBackend::ClamScan),
            "clamd" => Ok(ScanBackend::Clamd),
            other => Err(anyhow::anyhow!(
                "INTAKE_SCAN_BACKEND must be 'clamscan' or 'clamd', got '{}'",
                other
            )),
        }
    }
}

/// How the Type Gate determines an upload's real MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SniffingMode {
    /// Inspect magic numbers in the content prefix
    Magic,
    /// Reduced assurance: trust the declared extension's canonical MIME type
    Declared,
}

impl FromStr for SniffingMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "magic" => Ok(SniffingMode::Magic),
            "declared" => Ok(SniffingMode::Declared),
            other => Err(anyhow::anyhow!(
                "INTAKE_CONTENT_SNIFFING must be 'magic' or 'declared', got '{}'",
                other
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct IntakeConfig {
    pub environment: String,
    pub allowed_extensions: Vec<String>,
    pub max_file_size_bytes: u64,
    // Virus scanning
    pub virus_scan_enabled: bool,
    pub scan_backend: ScanBackend,
    pub clamscan_path: String,
    pub scan_timeout_secs: u64,
    pub clamav_host: String,
    pub clamav_port: u16,
    // Content sniffing
    pub sniffing_mode: SniffingMode,
    // Filesystem layout
    pub quarantine_dir: PathBuf,
    pub storage_path: PathBuf,
    /// Age after which leftover quarantine files are swept. 0 = never.
    pub quarantine_max_age_secs: u64,
}

impl IntakeConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup (the process environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let allowed_extensions = lookup("INTAKE_ALLOWED_EXTENSIONS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_EXTENSIONS.to_string())
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let max_file_size_mb = lookup("INTAKE_MAX_FILE_SIZE_MB")
            .unwrap_or_else(|| MAX_FILE_SIZE_MB.to_string())
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("INTAKE_MAX_FILE_SIZE_MB must be a valid number"))?;
        let mut max_file_size_bytes = max_file_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("INTAKE_MAX_FILE_SIZE_MB is too large"))?;

        // Lets test suites exercise the size limit without building multi-megabyte bodies.
        if let Some(override_bytes) = lookup("INTAKE_TEST_MAX_FILE_SIZE_BYTES") {
            if is_testing_environment(&environment) {
                max_file_size_bytes = override_bytes.parse().map_err(|_| {
                    anyhow::anyhow!("INTAKE_TEST_MAX_FILE_SIZE_BYTES must be a valid number")
                })?;
            } else {
                tracing::warn!(
                    environment = %environment,
                    "INTAKE_TEST_MAX_FILE_SIZE_BYTES ignored outside the test environment"
                );
            }
        }

        let scan_backend = lookup("INTAKE_SCAN_BACKEND")
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or(ScanBackend::ClamScan);

        let sniffing_mode = lookup("INTAKE_CONTENT_SNIFFING")
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or(SniffingMode::Magic);

        Ok(IntakeConfig {
            environment,
            allowed_extensions,
            max_file_size_bytes,
            virus_scan_enabled: lookup("INTAKE_VIRUS_SCAN_ENABLED")
                .unwrap_or_else(|| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            scan_backend,
            clamscan_path: lookup("CLAMSCAN_PATH").unwrap_or_else(|| "clamscan".to_string()),
            scan_timeout_secs: lookup("INTAKE_SCAN_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SCAN_TIMEOUT_SECS),
            clamav_host: lookup("CLAMAV_HOST").unwrap_or_else(|| "localhost".to_string()),
            clamav_port: lookup("CLAMAV_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CLAMAV_PORT),
            sniffing_mode,
            quarantine_dir: lookup("INTAKE_QUARANTINE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            storage_path: lookup("INTAKE_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data/artifacts")),
            quarantine_max_age_secs: lookup("INTAKE_QUARANTINE_MAX_AGE_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(QUARANTINE_MAX_AGE_SECS),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!(
                "INTAKE_ALLOWED_EXTENSIONS must list at least one extension"
            ));
        }

        if let Some(ext) = self
            .allowed_extensions
            .iter()
            .find(|ext| DANGEROUS_EXTENSIONS.contains(&ext.as_str()))
        {
            return Err(anyhow::anyhow!(
                "INTAKE_ALLOWED_EXTENSIONS contains dangerous extension '{}'",
                ext
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("Maximum upload size must be greater than zero"));
        }

        if self.virus_scan_enabled && self.scan_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "INTAKE_SCAN_TIMEOUT_SECS must be greater than zero when scanning is enabled"
            ));
        }

        if self.sniffing_mode == SniffingMode::Declared {
            tracing::warn!(
                "Content sniffing disabled (INTAKE_CONTENT_SNIFFING=declared): MIME types are assumed from file extensions"
            );
        }

        Ok(())
    }

    pub fn is_testing(&self) -> bool {
        is_testing_environment(&self.environment)
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    pub fn quarantine_max_age(&self) -> Option<Duration> {
        (self.quarantine_max_age_secs > 0)
            .then(|| Duration::from_secs(self.quarantine_max_age_secs))
    }

    pub fn type_policy(&self) -> Result<TypePolicy, PolicyError> {
        TypePolicy::for_extensions(&self.allowed_extensions, self.max_file_size_bytes)
    }
}

fn is_testing_environment(environment: &str) -> bool {
    matches!(environment.to_lowercase().as_str(), "test" | "testing")
}
