//! Shared fixtures and fake scanners for pipeline tests.

#![allow(dead_code)]

use std::io::{self, Cursor, SeekFrom};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use intake_core::{ScanOutcome, VirusScanError};
use intake_processing::{UploadPipeline, VirusScanner};
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

/// Minimal benign PDF.
pub fn create_test_pdf() -> Vec<u8> {
    b"%PDF-1.4
1 0 obj
<< /Type /Catalog /Pages 2 0 R >>
endobj
2 0 obj
<< /Type /Pages /Kids [3 0 R] /Count 1 >>
endobj
3 0 obj
<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>
endobj
trailer
<< /Size 4 /Root 1 0 R >>
%%EOF
"
    .to_vec()
}

/// The benign PDF with a `/JavaScript` marker added to its catalog and nothing else changed.
pub fn create_scripted_pdf() -> Vec<u8> {
    let pdf = create_test_pdf();
    let anchor = b"/Pages 2 0 R";
    let at = pdf
        .windows(anchor.len())
        .position(|window| window == anchor)
        .expect("catalog entry present in test PDF");

    let mut scripted = pdf[..at].to_vec();
    scripted.extend_from_slice(b"/JavaScript ");
    scripted.extend_from_slice(&pdf[at..]);
    scripted
}

pub fn create_test_resume_text() -> Vec<u8> {
    b"Jane Doe\nSenior Rust Engineer\n\nExperience\n- Built storage engines\n- Wrote parsers\n"
        .to_vec()
}

/// Scanner that returns a fixed result and remembers which files it saw.
pub struct FakeScanner {
    result: Result<ScanOutcome, VirusScanError>,
    seen: Mutex<Vec<(PathBuf, bool)>>,
}

impl FakeScanner {
    pub fn new(result: Result<ScanOutcome, VirusScanError>) -> Arc<Self> {
        Arc::new(Self {
            result,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn clean() -> Arc<Self> {
        Self::new(Ok(ScanOutcome::Clean))
    }

    /// Paths handed to the scanner, with whether each existed at scan time.
    pub fn seen(&self) -> Vec<(PathBuf, bool)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl VirusScanner for FakeScanner {
    async fn scan(&self, path: &Path) -> Result<ScanOutcome, VirusScanError> {
        self.seen
            .lock()
            .unwrap()
            .push((path.to_path_buf(), path.exists()));
        self.result.clone()
    }

    fn engine_name(&self) -> &str {
        "fake"
    }
}

/// Scanner that deletes the file it is given and then reports it clean.
pub struct VanishingScanner;

#[async_trait]
impl VirusScanner for VanishingScanner {
    async fn scan(&self, path: &Path) -> Result<ScanOutcome, VirusScanError> {
        std::fs::remove_file(path).unwrap();
        Ok(ScanOutcome::Clean)
    }

    fn engine_name(&self) -> &str {
        "vanishing"
    }
}

/// In-memory upload whose reads fail once the position reaches `fail_at`.
///
/// The Type Gate only reads the first KiB, so with `fail_at` past that the failure surfaces
/// while the body is being copied into quarantine.
pub struct FailingSource {
    inner: Cursor<Vec<u8>>,
    fail_at: u64,
}

impl FailingSource {
    pub fn new(data: Vec<u8>, fail_at: u64) -> Self {
        Self {
            inner: Cursor::new(data),
            fail_at,
        }
    }
}

impl AsyncRead for FailingSource {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.inner.position() >= self.fail_at {
            return Poll::Ready(Err(io::Error::other("boom")));
        }
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncSeek for FailingSource {
    fn start_seek(mut self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        Pin::new(&mut self.inner).start_seek(position)
    }

    fn poll_complete(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.inner).poll_complete(cx)
    }
}

pub fn pipeline_in(dir: &TempDir, scanner: Option<Arc<dyn VirusScanner>>) -> UploadPipeline {
    UploadPipeline::builder()
        .quarantine_dir(dir.path())
        .scanner(scanner)
        .build()
        .unwrap()
}

/// Number of entries left in the quarantine directory.
pub fn quarantine_count(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path()).unwrap().count()
}
