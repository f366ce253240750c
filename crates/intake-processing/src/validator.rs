//! Type Gate: size, extension, and MIME consistency checks
//!
//! Everything here runs before a single byte is written to disk. The stream is measured by
//! seeking, the first KiB is read for sniffing, and the stream position is restored afterwards.

use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;

use intake_core::constants::INSPECTION_PREFIX_LEN;
use intake_core::{FileValidationError, IntakeError, TypePolicy};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

use crate::prefix::ContentPrefix;
use crate::sniff::ContentSniffer;
use crate::upload::{UploadCandidate, UploadSource};

/// What the Type Gate learned about an accepted candidate.
#[derive(Debug, Clone)]
pub struct GateOutcome {
    /// Lowercase extension without the leading dot
    pub extension: String,
    /// Size measured from the stream itself
    pub size_bytes: u64,
    pub prefix: ContentPrefix,
    pub detected_mime: Option<String>,
}

#[derive(Clone)]
pub struct TypeGate {
    sniffer: Arc<dyn ContentSniffer>,
}

impl TypeGate {
    pub fn new(sniffer: Arc<dyn ContentSniffer>) -> Self {
        Self { sniffer }
    }

    /// Run every Type Gate check against `candidate`, in order: size, dangerous extension,
    /// allow-list, sniffed MIME type.
    pub async fn check<R: UploadSource>(
        &self,
        candidate: &mut UploadCandidate<R>,
        sanitized_filename: &str,
        policy: &TypePolicy,
    ) -> Result<GateOutcome, IntakeError> {
        if candidate.filename.trim().is_empty() {
            return Err(FileValidationError::MissingFile.into());
        }

        let size_bytes = measure_size(&mut candidate.source)
            .await
            .map_err(|e| IntakeError::io("measuring upload size", e))?;
        if let Some(declared) = candidate.declared_length {
            if declared != size_bytes {
                tracing::warn!(
                    declared_length = declared,
                    measured_length = size_bytes,
                    "Declared upload length disagrees with stream length, using measured size"
                );
            }
        }
        validate_file_size(size_bytes, policy)?;

        let extension = validate_extension(sanitized_filename, policy)?;

        let prefix = read_prefix(&mut candidate.source, size_bytes)
            .await
            .map_err(|e| IntakeError::io("reading upload prefix", e))?;

        let detected_mime = self.sniffer.sniff(&prefix, &extension, policy);
        validate_detected_mime(detected_mime.as_deref(), &extension, policy)?;

        if let Some(declared) = candidate.content_type.as_deref() {
            check_declared_content_type(declared, &extension, policy);
        }

        tracing::debug!(
            extension = %extension,
            size_bytes,
            detected_mime = ?detected_mime,
            sniffer = self.sniffer.name(),
            "Type gate passed"
        );

        Ok(GateOutcome {
            extension,
            size_bytes,
            prefix,
            detected_mime,
        })
    }
}

/// Validate file size against the policy ceiling
pub fn validate_file_size(size_bytes: u64, policy: &TypePolicy) -> Result<(), FileValidationError> {
    if size_bytes > policy.max_file_size_bytes() {
        return Err(FileValidationError::FileTooLarge {
            max_mb: policy.max_file_size_mb(),
        });
    }
    Ok(())
}

/// Resolve the lowercase extension and check it against the dangerous set, then the allow-list.
///
/// The returned value is the exact key the Content Inspector and the storage layer use, so an
/// extension carrying whitespace or control characters is refused outright.
pub fn validate_extension(
    sanitized_filename: &str,
    policy: &TypePolicy,
) -> Result<String, FileValidationError> {
    let extension = Path::new(sanitized_filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if extension
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(FileValidationError::DisallowedType {
            extension,
            allowed: policy.allowed_extensions(),
        });
    }

    if !extension.is_empty() && policy.is_dangerous(&extension) {
        return Err(FileValidationError::DangerousExtension(extension));
    }

    if !policy.is_allowed(&extension) {
        return Err(FileValidationError::DisallowedType {
            extension,
            allowed: policy.allowed_extensions(),
        });
    }

    Ok(extension)
}

/// Compare the sniffed MIME type with what the policy expects for this extension.
pub fn validate_detected_mime(
    detected: Option<&str>,
    extension: &str,
    policy: &TypePolicy,
) -> Result<(), FileValidationError> {
    let expected = policy.expected_mime_types(extension);
    let Some(detected) = detected else {
        return Ok(());
    };
    if expected.is_empty() {
        tracing::debug!(
            extension = %extension,
            detected_mime = %detected,
            "No MIME expectation for extension, skipping cross-validation"
        );
        return Ok(());
    }

    if !expected.iter().any(|mime| mime == detected) {
        return Err(FileValidationError::MimeMismatch {
            detected: detected.to_string(),
            extension: extension.to_string(),
        });
    }

    Ok(())
}

/// The declared content type is advisory: disagreement is logged, never decisive.
fn check_declared_content_type(declared: &str, extension: &str, policy: &TypePolicy) {
    let normalized = normalize_mime_type(declared).to_lowercase();
    let expected = policy.expected_mime_types(extension);
    if !expected.is_empty() && !expected.iter().any(|mime| *mime == normalized) {
        tracing::debug!(
            declared_content_type = %declared,
            extension = %extension,
            "Declared content type does not match extension"
        );
    }
}

/// Normalize MIME type by stripping parameters (e.g. "text/plain; charset=utf-8" -> "text/plain").
fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}

/// Seek to the end to learn the length, then restore the original position.
async fn measure_size<R>(source: &mut R) -> std::io::Result<u64>
where
    R: AsyncSeek + Unpin,
{
    let position = source.stream_position().await?;
    let end = source.seek(SeekFrom::End(0)).await?;
    source.seek(SeekFrom::Start(position)).await?;
    Ok(end)
}

async fn read_prefix<R>(source: &mut R, size_bytes: u64) -> std::io::Result<ContentPrefix>
where
    R: AsyncRead + AsyncSeek + Unpin,
{
    let position = source.stream_position().await?;
    source.seek(SeekFrom::Start(0)).await?;

    let mut bytes = Vec::with_capacity(INSPECTION_PREFIX_LEN);
    (&mut *source)
        .take(INSPECTION_PREFIX_LEN as u64)
        .read_to_end(&mut bytes)
        .await?;

    source.seek(SeekFrom::Start(position)).await?;
    Ok(ContentPrefix::new(
        bytes,
        size_bytes > INSPECTION_PREFIX_LEN as u64,
    ))
}
