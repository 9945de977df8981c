/*!
 * Error types for distrokit
 */

use std::fmt;
use std::io;
use std::path::PathBuf;

use distrokit_core_manifest::Error as ManifestError;

pub type Result<T> = std::result::Result<T, DistroError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;
pub const EXIT_INTEGRITY: i32 = 3;

#[derive(Debug)]
pub enum DistroError {
    /// Manifest file does not exist
    ManifestNotFound(PathBuf),

    /// Content directory to scan does not exist
    ContentDirNotFound(PathBuf),

    /// Content directories exist but hold no matching files
    NoContentFound(Vec<PathBuf>),

    /// A module the operation depends on is absent
    ModuleNotFound(String),

    /// Manifest is malformed or structurally invalid
    Parse { path: PathBuf, message: String },

    /// Operation precondition failed
    Validation(String),

    /// Configuration error
    Config(String),

    /// I/O error
    Io(io::Error),

    /// Lint found manifest problems
    LintFailed { issues: usize },

    /// Local artifacts disagree with their recorded size or checksum
    IntegrityFailed { failures: usize },

    /// Generic error with message
    Other(String),
}

impl DistroError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            DistroError::IntegrityFailed { .. } => EXIT_INTEGRITY,
            DistroError::LintFailed { .. } => EXIT_PARTIAL,
            _ => EXIT_FATAL,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            DistroError::ManifestNotFound(_)
            | DistroError::ContentDirNotFound(_)
            | DistroError::NoContentFound(_)
            | DistroError::ModuleNotFound(_) => ErrorCategory::NotFound,
            DistroError::Parse { .. } => ErrorCategory::Parse,
            DistroError::Validation(_) | DistroError::LintFailed { .. } => {
                ErrorCategory::Validation
            }
            DistroError::Config(_) => ErrorCategory::Configuration,
            DistroError::Io(_) => ErrorCategory::IoError,
            DistroError::IntegrityFailed { .. } => ErrorCategory::Integrity,
            DistroError::Other(_) => ErrorCategory::Unknown,
        }
    }

    /// Suggested fix, shown under the error message
    pub fn remedy(&self) -> Option<&'static str> {
        match self {
            DistroError::ManifestNotFound(_) => {
                Some("Check --base / base_manifest, or run `distrokit init-config` to write a config")
            }
            DistroError::ContentDirNotFound(_) => {
                Some("Create the directory or point content_sources[].dir at an existing one")
            }
            DistroError::NoContentFound(_) => {
                Some("Add files to the content directory or widen content_sources[].extensions")
            }
            DistroError::ModuleNotFound(_) => {
                Some("Run `distrokit inject-loader` first so the target server has a loader module")
            }
            DistroError::Parse { .. } => {
                Some("Fix the manifest JSON, or restore it from the fallback copy")
            }
            DistroError::Config(_) => Some("Check the TOML file passed with --config"),
            DistroError::LintFailed { .. } => {
                Some("Run `distrokit dedupe` to collapse duplicates and restore module order")
            }
            DistroError::IntegrityFailed { .. } => {
                Some("Run `distrokit generate` to recompute sizes and checksums")
            }
            _ => None,
        }
    }

    /// True if the failure describes something missing
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing file, directory or module
    NotFound,
    /// Malformed manifest
    Parse,
    /// Precondition or lint failures
    Validation,
    /// Configuration errors
    Configuration,
    /// I/O operation errors
    IoError,
    /// Size or checksum mismatches
    Integrity,
    /// Uncategorized errors
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::NotFound => write!(f, "not-found"),
            ErrorCategory::Parse => write!(f, "parse"),
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::IoError => write!(f, "io"),
            ErrorCategory::Integrity => write!(f, "integrity"),
            ErrorCategory::Unknown => write!(f, "unknown"),
        }
    }
}

impl fmt::Display for DistroError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistroError::ManifestNotFound(path) => {
                write!(f, "Manifest not found: {}", path.display())
            }
            DistroError::ContentDirNotFound(path) => {
                write!(f, "Content directory not found: {}", path.display())
            }
            DistroError::NoContentFound(dirs) => {
                let dirs: Vec<String> = dirs.iter().map(|d| d.display().to_string()).collect();
                write!(f, "No content files found in {}", dirs.join(", "))
            }
            DistroError::ModuleNotFound(what) => write!(f, "Module not found: {}", what),
            DistroError::Parse { path, message } => {
                write!(f, "Invalid manifest {}: {}", path.display(), message)
            }
            DistroError::Validation(msg) => write!(f, "Validation failed: {}", msg),
            DistroError::Config(msg) => write!(f, "Configuration error: {}", msg),
            DistroError::Io(err) => write!(f, "I/O error: {}", err),
            DistroError::LintFailed { issues } => {
                write!(f, "Manifest check found {} problem(s)", issues)
            }
            DistroError::IntegrityFailed { failures } => {
                write!(f, "{} artifact(s) failed integrity verification", failures)
            }
            DistroError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for DistroError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DistroError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for DistroError {
    fn from(err: io::Error) -> Self {
        DistroError::Io(err)
    }
}

impl From<serde_json::Error> for DistroError {
    fn from(err: serde_json::Error) -> Self {
        DistroError::Other(format!("JSON error: {}", err))
    }
}

impl From<toml::de::Error> for DistroError {
    fn from(err: toml::de::Error) -> Self {
        DistroError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DistroError {
    fn from(err: toml::ser::Error) -> Self {
        DistroError::Config(err.to_string())
    }
}

impl From<ManifestError> for DistroError {
    fn from(err: ManifestError) -> Self {
        match err {
            ManifestError::Io(e) => DistroError::Io(e),
            ManifestError::Json(e) => DistroError::Other(format!("JSON error: {}", e)),
            ManifestError::Parse { path, message } => DistroError::Parse { path, message },
            ManifestError::Validation { message } => DistroError::Validation(message),
            ManifestError::ManifestNotFound { path } => DistroError::ManifestNotFound(path),
            ManifestError::ModuleNotFound { what } => DistroError::ModuleNotFound(what),
            other @ (ManifestError::InvalidModuleId(_) | ManifestError::UnknownModuleType(_)) => {
                DistroError::Validation(other.to_string())
            }
            ManifestError::Other(msg) => DistroError::Other(msg),
        }
    }
}
