use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use intake_processing::upload::quarantine::is_quarantine_file_name;
use tokio::time::interval;

/// Removes quarantine files left behind by processes that died mid-upload.
///
/// Quarantine files normally delete themselves on drop, which does not happen when the
/// process aborts. Only names the pipeline generates are touched.
#[derive(Debug, Clone)]
pub struct QuarantineSweeper {
    quarantine_dir: PathBuf,
    max_age: Duration,
    period: Duration,
}

impl QuarantineSweeper {
    pub fn new(quarantine_dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            quarantine_dir: quarantine_dir.into(),
            max_age,
            // Sweep a few times per retention window, at most once a minute.
            period: (max_age / 4).max(Duration::from_secs(60)),
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn quarantine_dir(&self) -> &Path {
        &self.quarantine_dir
    }

    /// Start the background sweep task.
    /// Returns a JoinHandle for graceful shutdown
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            // A zero period would make interval() panic.
            let mut sweep_interval = interval(self.period.max(Duration::from_secs(1)));

            loop {
                sweep_interval.tick().await;

                match self.sweep_once().await {
                    Ok(0) => tracing::debug!("Quarantine sweep found nothing to remove"),
                    Ok(removed) => tracing::info!(removed, "Quarantine sweep completed"),
                    Err(e) => tracing::error!(error = %e, "Quarantine sweep failed"),
                }
            }
        })
    }

    /// Delete quarantine files older than the configured age. Returns how many were removed.
    #[tracing::instrument(skip(self), fields(quarantine_dir = %self.quarantine_dir.display()))]
    pub async fn sweep_once(&self) -> Result<usize, anyhow::Error> {
        let mut entries = tokio::fs::read_dir(&self.quarantine_dir).await?;
        let now = SystemTime::now();
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !is_quarantine_file_name(name) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!(error = %e, file = name, "Quarantine file vanished during sweep");
                    continue;
                }
            };
            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age < self.max_age {
                continue;
            }

            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => {
                    tracing::info!(file = name, age_secs = age.as_secs(), "Removed orphaned quarantine file");
                    removed += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::error!(error = %e, file = name, "Failed to remove orphaned quarantine file");
                }
            }
        }

        Ok(removed)
    }
}
