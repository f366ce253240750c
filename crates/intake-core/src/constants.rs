//! Default policy tables and limits.

/// Default upload ceiling (10 MB).
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Number of leading bytes read for sniffing and content inspection.
pub const INSPECTION_PREFIX_LEN: usize = 1024;

/// Chunk size used when streaming a quarantined file through the hasher.
pub const HASH_CHUNK_SIZE: usize = 8 * 1024;

/// Longest sanitized filename, in bytes.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Placeholder used when sanitization leaves nothing behind.
pub const UNNAMED_FILE: &str = "unnamed_file";

/// Default external scan timeout in seconds.
pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 30;

/// Temp-file naming inside the quarantine directory.
pub const QUARANTINE_PREFIX: &str = "intake-";
pub const QUARANTINE_SUFFIX: &str = ".upload";

/// Allowed logical types and the MIME types each one may sniff as.
/// The first entry of each list is the canonical MIME type.
pub const DEFAULT_ALLOWED_TYPES: &[(&str, &[&str])] = &[
    ("pdf", &["application/pdf"]),
    ("doc", &["application/msword"]),
    (
        "docx",
        &["application/vnd.openxmlformats-officedocument.wordprocessingml.document"],
    ),
    ("txt", &["text/plain"]),
    ("rtf", &["application/rtf"]),
    ("odt", &["application/vnd.oasis.opendocument.text"]),
];

/// Extensions rejected no matter what the allow-list says.
pub const DANGEROUS_EXTENSIONS: &[&str] = &[
    "exe", "bat", "cmd", "com", "pif", "scr", "vbs", "js", "jar", "php", "asp", "aspx", "jsp",
    "py", "rb", "pl", "sh", "ps1", "dll", "sys", "drv", "ocx", "cpl", "msi", "msp", "mst",
];

/// Script and markup injection markers (matched case-insensitively).
pub const SCRIPT_INJECTION_PATTERNS: &[&str] = &[
    "<script",
    "javascript:",
    "vbscript:",
    "data:text/html",
    "<iframe",
    "<object",
    "<embed",
    "<applet",
];

/// Code-execution primitives (matched case-insensitively).
pub const CODE_EXECUTION_PATTERNS: &[&str] =
    &["eval(", "exec(", "system(", "shell_exec(", "passthru("];

/// File-access primitives (matched case-insensitively).
pub const FILE_ACCESS_PATTERNS: &[&str] = &[
    "file_get_contents(",
    "fopen(",
    "fwrite(",
    "fputs(",
    "include(",
    "require(",
    "include_once(",
    "require_once(",
];

/// PDF active-content markers. PDF names are case-sensitive.
pub const PDF_SCRIPT_MARKERS: &[&str] = &["/JavaScript", "/JS"];
pub const PDF_EMBEDDED_FILE_MARKERS: &[&str] = &["/EmbeddedFile"];

/// Office macro markers.
pub const OFFICE_MACRO_MARKERS: &[&str] = &["VBA", "Macro"];

/// URL shorteners rejected inside plain-text uploads.
pub const LINK_SHORTENER_DOMAINS: &[&str] = &["bit.ly", "tinyurl.com", "goo.gl", "t.co"];

/// Magic header every PDF must start with.
pub const PDF_MAGIC: &[u8] = b"%PDF-";
