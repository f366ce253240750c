use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use intake_core::constants::DEFAULT_SCAN_TIMEOUT_SECS;
use intake_core::{ScanOutcome, VirusScanError};
use intake_processing::VirusScanner;
use tokio::process::Command;

/// Scans quarantined files by running the `clamscan` executable.
///
/// Exit status 0 means clean, 1 means a signature matched, anything else is an engine failure.
/// A missing executable is reported as [`ScanOutcome::ScannerUnavailable`].
#[derive(Debug, Clone)]
pub struct ClamScanCommand {
    executable: PathBuf,
    timeout: Duration,
}

impl ClamScanCommand {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self::with_timeout(executable, Duration::from_secs(DEFAULT_SCAN_TIMEOUT_SECS))
    }

    /// Create with a custom scan timeout (for large files or slow signature databases).
    pub fn with_timeout(executable: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            timeout,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

#[async_trait]
impl VirusScanner for ClamScanCommand {
    #[tracing::instrument(skip(self), fields(engine = "clamscan"))]
    async fn scan(&self, path: &Path) -> Result<ScanOutcome, VirusScanError> {
        let start = Instant::now();

        let child = Command::new(&self.executable)
            .arg("--no-summary")
            .arg("--infected")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();
        let child = match child {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(
                    executable = %self.executable.display(),
                    "clamscan executable not found, file not scanned"
                );
                return Ok(ScanOutcome::ScannerUnavailable);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to start clamscan");
                return Err(VirusScanError::EngineFailure(format!(
                    "failed to start clamscan: {e}"
                )));
            }
        };

        // Dropping the child on timeout kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Failed to collect clamscan output");
                return Err(VirusScanError::EngineFailure(format!(
                    "failed to collect clamscan output: {e}"
                )));
            }
            Err(_) => {
                tracing::error!(
                    timeout_secs = self.timeout.as_secs(),
                    "clamscan timed out"
                );
                return Err(VirusScanError::Timeout {
                    secs: self.timeout.as_secs(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        match output.status.code() {
            Some(0) => {
                tracing::info!(
                    duration_ms = start.elapsed().as_millis(),
                    "File scan completed: clean"
                );
                Ok(ScanOutcome::Clean)
            }
            Some(1) => {
                let signature = parse_signature(&stdout);
                tracing::warn!(
                    duration_ms = start.elapsed().as_millis(),
                    virus = %signature,
                    "File scan detected virus"
                );
                Ok(ScanOutcome::Infected(signature))
            }
            code => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let detail = match stderr.trim() {
                    "" => format!("clamscan exited with status {code:?}"),
                    message => message.to_string(),
                };
                tracing::error!(exit_code = ?code, error = %detail, "clamscan failed");
                Err(VirusScanError::EngineFailure(detail))
            }
        }
    }

    fn engine_name(&self) -> &str {
        "clamscan"
    }
}

/// Pull the signature name out of a `<path>: <signature> FOUND` report line.
fn parse_signature(report: &str) -> String {
    report
        .lines()
        .filter_map(|line| line.trim().strip_suffix("FOUND"))
        .filter_map(|line| line.rsplit_once(": ").map(|(_, sig)| sig.trim()))
        .find(|sig| !sig.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| match report.trim() {
            "" => "unknown".to_string(),
            raw => raw.to_string(),
        })
}

#[cfg(feature = "clamd")]
pub use daemon::ClamdScanner;

#[cfg(feature = "clamd")]
mod daemon {
    use super::*;
    use clamav_client::{clean, Tcp};

    /// Streams quarantined files to a running clamd daemon over TCP.
    #[derive(Debug, Clone)]
    pub struct ClamdScanner {
        host: String,
        port: u16,
        /// Timeout for each scan operation
        timeout: Duration,
    }

    impl ClamdScanner {
        /// Create a new ClamdScanner.
        ///
        /// # Arguments
        /// * `host` - ClamAV daemon hostname
        /// * `port` - ClamAV daemon port (typically 3310)
        pub fn new(host: String, port: u16) -> Self {
            Self::with_timeout(host, port, Duration::from_secs(DEFAULT_SCAN_TIMEOUT_SECS))
        }

        pub fn with_timeout(host: String, port: u16, timeout: Duration) -> Self {
            Self {
                host,
                port,
                timeout,
            }
        }
    }

    enum DaemonReply {
        Outcome(ScanOutcome),
        Failure(String),
    }

    #[async_trait]
    impl VirusScanner for ClamdScanner {
        /// Uses the sync client inside spawn_blocking so the returned future stays `Send`.
        #[tracing::instrument(skip(self), fields(engine = "clamd"))]
        async fn scan(&self, path: &Path) -> Result<ScanOutcome, VirusScanError> {
            let start = Instant::now();
            tracing::debug!(host = %self.host, port = %self.port, "Starting ClamAV scan");
            let address = format!("{}:{}", self.host, self.port);
            let path = path.to_path_buf();

            let result = tokio::time::timeout(
                self.timeout,
                tokio::task::spawn_blocking(move || {
                    let connection = Tcp {
                        host_address: address.as_str(),
                    };
                    match clamav_client::scan_file(&path, connection, None) {
                        Ok(response) => match clean(&response) {
                            Ok(true) => DaemonReply::Outcome(ScanOutcome::Clean),
                            Ok(false) => {
                                let report = str::from_utf8(&response).unwrap_or("unknown");
                                let report = report.trim_end_matches('\0');
                                DaemonReply::Outcome(ScanOutcome::Infected(parse_signature(
                                    report,
                                )))
                            }
                            Err(e) => DaemonReply::Failure(format!(
                                "Failed to parse ClamAV response: {e}"
                            )),
                        },
                        Err(e) if is_unreachable(&e) => {
                            tracing::warn!(error = %e, "ClamAV daemon unreachable");
                            DaemonReply::Outcome(ScanOutcome::ScannerUnavailable)
                        }
                        Err(e) => DaemonReply::Failure(format!("ClamAV scan error: {e}")),
                    }
                }),
            )
            .await;

            match result {
                Ok(Ok(DaemonReply::Outcome(outcome))) => {
                    tracing::info!(
                        duration_ms = start.elapsed().as_millis(),
                        outcome = outcome.as_str(),
                        "File scan completed"
                    );
                    Ok(outcome)
                }
                Ok(Ok(DaemonReply::Failure(message))) => {
                    tracing::error!(error = %message, "ClamAV scan failed");
                    Err(VirusScanError::EngineFailure(message))
                }
                Ok(Err(e)) => {
                    let message = format!("ClamAV scan task join error: {e}");
                    tracing::error!(error = %message, "ClamAV scan panicked");
                    Err(VirusScanError::EngineFailure(message))
                }
                Err(_) => {
                    tracing::error!(timeout_secs = self.timeout.as_secs(), "ClamAV scan timeout");
                    Err(VirusScanError::Timeout {
                        secs: self.timeout.as_secs(),
                    })
                }
            }
        }

        fn engine_name(&self) -> &str {
            "clamd"
        }
    }

    fn is_unreachable(error: &io::Error) -> bool {
        matches!(
            error.kind(),
            io::ErrorKind::ConnectionRefused
                | io::ErrorKind::AddrNotAvailable
                | io::ErrorKind::NotConnected
        )
    }
}
