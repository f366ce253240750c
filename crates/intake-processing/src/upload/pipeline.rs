//! Upload pipeline: sanitize → gate → inspect → quarantine → scan → hash.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use intake_core::{
    ContentRules, ErrorMetadata, IntakeConfig, IntakeError, LogLevel, ScanOutcome, SniffingMode,
    TypePolicy, VirusScanError,
};
use uuid::Uuid;

use super::hashing::hash_file;
use super::quarantine::QuarantinedFile;
use super::traits::VirusScanner;
use super::types::{ProcessedArtifact, UploadCandidate, UploadSource};
use crate::inspector::ContentInspector;
use crate::sanitize::sanitize_filename;
use crate::sniff::{ContentSniffer, DeclaredTypeSniffer, MagicSniffer};
use crate::validator::TypeGate;

/// Runs candidates through every check and leaves accepted ones in quarantine.
///
/// Cheap to clone; clones share the policy, rules, and scanner. Concurrent calls to
/// [`UploadPipeline::process`] are independent.
#[derive(Clone)]
pub struct UploadPipeline {
    policy: Arc<TypePolicy>,
    gate: TypeGate,
    inspector: ContentInspector,
    scanner: Option<Arc<dyn VirusScanner>>,
    quarantine_dir: PathBuf,
}

impl UploadPipeline {
    pub fn builder() -> UploadPipelineBuilder {
        UploadPipelineBuilder::default()
    }

    pub fn policy(&self) -> &TypePolicy {
        &self.policy
    }

    pub fn quarantine_dir(&self) -> &Path {
        &self.quarantine_dir
    }

    /// Process a candidate under the pipeline's own policy.
    pub async fn process<R: UploadSource>(
        &self,
        candidate: UploadCandidate<R>,
    ) -> Result<ProcessedArtifact, IntakeError> {
        let policy = Arc::clone(&self.policy);
        self.process_with_policy(candidate, &policy).await
    }

    /// Process a candidate under a caller-supplied policy (e.g. a per-endpoint allow-list).
    pub async fn process_with_policy<R: UploadSource>(
        &self,
        candidate: UploadCandidate<R>,
        policy: &TypePolicy,
    ) -> Result<ProcessedArtifact, IntakeError> {
        let upload_id = Uuid::new_v4();
        let result = self.run(upload_id, candidate, policy).await;

        if let Err(error) = &result {
            log_failure(upload_id, error);
        }
        result
    }

    #[tracing::instrument(
        name = "upload.process",
        skip(self, candidate, policy),
        fields(upload_id = %upload_id, extension = tracing::field::Empty)
    )]
    async fn run<R: UploadSource>(
        &self,
        upload_id: Uuid,
        mut candidate: UploadCandidate<R>,
        policy: &TypePolicy,
    ) -> Result<ProcessedArtifact, IntakeError> {
        let sanitized_filename = sanitize_filename(&candidate.filename);
        if sanitized_filename != candidate.filename {
            tracing::debug!(
                sanitized_filename = %sanitized_filename,
                "Filename changed by sanitization"
            );
        }

        let gate = self
            .gate
            .check(&mut candidate, &sanitized_filename, policy)
            .await?;
        tracing::Span::current().record("extension", gate.extension.as_str());

        self.inspector
            .inspect(&gate.prefix, &gate.extension)
            .into_result()?;

        let (quarantine, mut file) = QuarantinedFile::create(&self.quarantine_dir, upload_id)
            .await
            .map_err(|e| IntakeError::io("creating quarantine file", e))?;
        let written =
            QuarantinedFile::fill(&mut file, &mut candidate.source, policy.max_file_size_bytes())
                .await?;
        drop(file);

        let scan_outcome = self.scan(quarantine.path()).await?;

        let (content_hash, hashed_bytes) =
            hash_file(quarantine.path())
                .await
                .map_err(|source| IntakeError::HashUnavailable {
                    path: quarantine.path().to_path_buf(),
                    source,
                })?;
        if hashed_bytes != written {
            tracing::warn!(
                written_bytes = written,
                hashed_bytes,
                "Quarantine file changed size between write and hash"
            );
        }

        tracing::info!(
            size_bytes = written,
            content_hash = %content_hash,
            scan_outcome = scan_outcome.as_str(),
            "Upload accepted into quarantine"
        );

        Ok(ProcessedArtifact::new(
            upload_id,
            sanitized_filename,
            candidate.filename,
            gate.extension,
            written,
            content_hash,
            scan_outcome,
            quarantine,
        ))
    }

    async fn scan(&self, path: &Path) -> Result<ScanOutcome, IntakeError> {
        let Some(scanner) = &self.scanner else {
            tracing::debug!("Virus scanning disabled, skipping scan");
            return Ok(ScanOutcome::ScannerUnavailable);
        };

        match scanner.scan(path).await? {
            ScanOutcome::Infected(signature) => {
                tracing::warn!(
                    engine = scanner.engine_name(),
                    signature = %signature,
                    "Virus detected in uploaded file"
                );
                Err(VirusScanError::ThreatDetected { detail: signature }.into())
            }
            ScanOutcome::ScannerUnavailable => {
                tracing::warn!(
                    engine = scanner.engine_name(),
                    "Virus scanner unavailable, accepting upload without a scan"
                );
                Ok(ScanOutcome::ScannerUnavailable)
            }
            ScanOutcome::Clean => Ok(ScanOutcome::Clean),
        }
    }
}

fn log_failure(upload_id: Uuid, error: &IntakeError) {
    let error_code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(upload_id = %upload_id, error = %error, error_code, "Upload rejected");
        }
        LogLevel::Warn => {
            tracing::warn!(upload_id = %upload_id, error = %error, error_code, "Upload rejected");
        }
        LogLevel::Error => {
            tracing::error!(upload_id = %upload_id, error = %error, error_code, "Upload failed");
        }
    }
}

pub struct UploadPipelineBuilder {
    policy: TypePolicy,
    rules: ContentRules,
    sniffer: Arc<dyn ContentSniffer>,
    scanner: Option<Arc<dyn VirusScanner>>,
    quarantine_dir: PathBuf,
}

impl Default for UploadPipelineBuilder {
    fn default() -> Self {
        Self {
            policy: TypePolicy::default(),
            rules: ContentRules::default(),
            sniffer: Arc::new(MagicSniffer),
            scanner: None,
            quarantine_dir: std::env::temp_dir(),
        }
    }
}

impl UploadPipelineBuilder {
    /// Policy, sniffer, and quarantine directory taken from configuration. The scanner is
    /// wired separately since it lives in intake-services.
    pub fn from_config(config: &IntakeConfig) -> Result<Self> {
        let policy = config
            .type_policy()
            .context("Invalid upload type policy")?;
        let sniffer: Arc<dyn ContentSniffer> = match config.sniffing_mode {
            SniffingMode::Magic => Arc::new(MagicSniffer),
            SniffingMode::Declared => Arc::new(DeclaredTypeSniffer),
        };

        Ok(Self {
            policy,
            sniffer,
            quarantine_dir: config.quarantine_dir.clone(),
            ..Self::default()
        })
    }

    pub fn policy(mut self, policy: TypePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn rules(mut self, rules: ContentRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn sniffer(mut self, sniffer: Arc<dyn ContentSniffer>) -> Self {
        self.sniffer = sniffer;
        self
    }

    pub fn scanner(mut self, scanner: Option<Arc<dyn VirusScanner>>) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn quarantine_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.quarantine_dir = dir.into();
        self
    }

    pub fn build(self) -> Result<UploadPipeline> {
        std::fs::create_dir_all(&self.quarantine_dir).with_context(|| {
            format!(
                "Failed to create quarantine directory {}",
                self.quarantine_dir.display()
            )
        })?;

        let inspector =
            ContentInspector::new(self.rules).context("Invalid link shortener domain list")?;

        if self.sniffer.is_reduced_assurance() {
            tracing::warn!(
                sniffer = self.sniffer.name(),
                "Content sniffing disabled, MIME types are inferred from extensions only"
            );
        }
        match &self.scanner {
            Some(scanner) => {
                tracing::info!(engine = scanner.engine_name(), "Virus scanning enabled")
            }
            None => tracing::info!("Virus scanning disabled"),
        }

        Ok(UploadPipeline {
            policy: Arc::new(self.policy),
            gate: TypeGate::new(self.sniffer),
            inspector,
            scanner: self.scanner,
            quarantine_dir: self.quarantine_dir,
        })
    }
}
