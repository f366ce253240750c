use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use intake_cli::report::CheckReport;
use intake_core::IntakeConfig;
use intake_processing::{UploadCandidate, UploadPipelineBuilder};
use intake_services::{scanner_from_config, QuarantineSweeper};
use intake_storage::{ArtifactStore, LocalArtifactStore};

#[derive(Parser, Debug)]
#[command(name = "intake_check")]
#[command(about = "Run a file through the upload intake pipeline")]
struct Args {
    /// File to check
    file: PathBuf,

    /// Filename to present to the pipeline (default: the file's own name)
    #[arg(long)]
    name: Option<String>,

    /// Declared MIME type, as a browser would send it
    #[arg(long)]
    content_type: Option<String>,

    /// Move accepted files into the content-addressed store (INTAKE_STORAGE_PATH)
    #[arg(long)]
    commit: bool,

    /// Remove orphaned quarantine files before checking
    #[arg(long)]
    sweep_quarantine: bool,

    /// Output format: json or table (default: table)
    #[arg(long, default_value = "table")]
    format: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    intake_cli::telemetry::init_tracing();

    let args = Args::parse();

    let config = IntakeConfig::from_env()?;
    config.validate()?;

    if args.sweep_quarantine {
        match config.quarantine_max_age() {
            Some(max_age) => {
                let removed = QuarantineSweeper::new(&config.quarantine_dir, max_age)
                    .sweep_once()
                    .await?;
                tracing::info!(removed, "Quarantine sweep finished");
            }
            None => tracing::warn!("INTAKE_QUARANTINE_MAX_AGE_SECS is 0, skipping sweep"),
        }
    }

    let pipeline = UploadPipelineBuilder::from_config(&config)?
        .scanner(scanner_from_config(&config)?)
        .build()?;

    let file = tokio::fs::File::open(&args.file)
        .await
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let declared_length = file.metadata().await?.len();
    let filename = match args.name {
        Some(name) => name,
        None => args
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    let mut candidate =
        UploadCandidate::new(file, filename).with_declared_length(declared_length);
    if let Some(content_type) = args.content_type {
        candidate = candidate.with_content_type(content_type);
    }

    let report = match pipeline.process(candidate).await {
        Ok(artifact) if args.commit => {
            let store = LocalArtifactStore::new(&config.storage_path).await?;
            let stored = store.commit(artifact).await?;
            CheckReport::accepted(stored.summary).with_storage(stored.key, stored.deduplicated)
        }
        Ok(artifact) => CheckReport::accepted(artifact.summary()),
        Err(e) => CheckReport::from_error(&e),
    };

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!("{}", report.to_table());
        }
    }

    Ok(ExitCode::from(report.status.exit_code()))
}
