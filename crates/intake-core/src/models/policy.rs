use std::collections::{BTreeMap, BTreeSet};

use crate::constants::{DANGEROUS_EXTENSIONS, DEFAULT_ALLOWED_TYPES, DEFAULT_MAX_FILE_SIZE_BYTES};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("Extension '{0}' is both allowed and dangerous")]
    DangerousAllowed(String),

    #[error("At least one file type must be allowed")]
    EmptyAllowList,

    #[error("Maximum file size must be greater than zero")]
    ZeroSizeLimit,
}

/// Which logical file types an upload may have, and how large it may be.
///
/// Extensions are stored lowercase without the leading dot. A dangerous extension can never be
/// allowed: [`TypePolicy::new`] refuses such a table, and the Type Gate checks the dangerous set
/// before the allow-list anyway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePolicy {
    allowed_types: BTreeMap<String, Vec<String>>,
    dangerous_extensions: BTreeSet<String>,
    max_file_size_bytes: u64,
}

impl TypePolicy {
    pub fn new<A, D>(
        allowed_types: A,
        dangerous_extensions: D,
        max_file_size_bytes: u64,
    ) -> Result<Self, PolicyError>
    where
        A: IntoIterator<Item = (String, Vec<String>)>,
        D: IntoIterator<Item = String>,
    {
        let allowed_types: BTreeMap<String, Vec<String>> = allowed_types
            .into_iter()
            .map(|(ext, mimes)| {
                let mimes = mimes.into_iter().map(|m| m.trim().to_lowercase()).collect();
                (normalize_extension(ext.trim()), mimes)
            })
            .filter(|(ext, _)| !ext.is_empty())
            .collect();
        let dangerous_extensions: BTreeSet<String> = dangerous_extensions
            .into_iter()
            .map(|ext| normalize_extension(ext.trim()))
            .collect();

        if allowed_types.is_empty() {
            return Err(PolicyError::EmptyAllowList);
        }
        if max_file_size_bytes == 0 {
            return Err(PolicyError::ZeroSizeLimit);
        }
        if let Some(ext) = allowed_types
            .keys()
            .find(|ext| dangerous_extensions.contains(*ext))
        {
            return Err(PolicyError::DangerousAllowed(ext.clone()));
        }

        Ok(Self {
            allowed_types,
            dangerous_extensions,
            max_file_size_bytes,
        })
    }

    /// Build a policy allowing only `extensions`, taking expected MIME types from the default
    /// table. Extensions missing from that table are allowed without a MIME expectation.
    pub fn for_extensions<I, S>(extensions: I, max_file_size_bytes: u64) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = extensions.into_iter().map(|ext| {
            let ext = normalize_extension(ext.as_ref().trim());
            let mimes = DEFAULT_ALLOWED_TYPES
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, mimes)| mimes.iter().map(|m| m.to_string()).collect())
                .unwrap_or_default();
            (ext, mimes)
        });
        Self::new(
            allowed,
            DANGEROUS_EXTENSIONS.iter().map(|e| e.to_string()),
            max_file_size_bytes,
        )
    }

    pub fn with_max_file_size(mut self, max_file_size_bytes: u64) -> Result<Self, PolicyError> {
        if max_file_size_bytes == 0 {
            return Err(PolicyError::ZeroSizeLimit);
        }
        self.max_file_size_bytes = max_file_size_bytes;
        Ok(self)
    }

    pub fn is_dangerous(&self, extension: &str) -> bool {
        self.dangerous_extensions
            .contains(&normalize_extension(extension))
    }

    pub fn is_allowed(&self, extension: &str) -> bool {
        self.allowed_types
            .contains_key(&normalize_extension(extension))
    }

    /// MIME types a file with this extension may sniff as. Empty when unconstrained.
    pub fn expected_mime_types(&self, extension: &str) -> &[String] {
        self.allowed_types
            .get(&normalize_extension(extension))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn canonical_mime_type(&self, extension: &str) -> Option<&str> {
        self.expected_mime_types(extension)
            .first()
            .map(String::as_str)
    }

    pub fn allowed_extensions(&self) -> Vec<String> {
        self.allowed_types.keys().cloned().collect()
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_bytes
    }

    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size_bytes / (1024 * 1024)
    }
}

impl Default for TypePolicy {
    fn default() -> Self {
        Self {
            allowed_types: DEFAULT_ALLOWED_TYPES
                .iter()
                .map(|(ext, mimes)| {
                    (
                        ext.to_string(),
                        mimes.iter().map(|m| m.to_string()).collect(),
                    )
                })
                .collect(),
            dangerous_extensions: DANGEROUS_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
        }
    }
}

/// Lookup key for an extension. Surrounding whitespace is part of the key, so `"pdf "` is not
/// `"pdf"`; only table construction trims.
fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_lowercase()
}
