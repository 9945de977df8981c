//! Error types for manifest operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for manifest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during manifest operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Manifest content is not a structurally valid distribution
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Manifest or operation input failed a structural precondition
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Manifest file not found
    #[error("Manifest not found: {path}")]
    ManifestNotFound { path: PathBuf },

    /// A module required by the operation is absent
    #[error("Module not found: {what}")]
    ModuleNotFound { what: String },

    /// Module id is empty or contains forbidden characters
    #[error("Invalid module id: {0:?}")]
    InvalidModuleId(String),

    /// Unknown module type string
    #[error("Unknown module type: {0}")]
    UnknownModuleType(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a validation error with a message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    /// Create a parse error for the manifest at `path`
    pub fn parse<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Error::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a manifest not found error
    pub fn manifest_not_found<P: Into<PathBuf>>(path: P) -> Self {
        Error::ManifestNotFound { path: path.into() }
    }

    /// Create a module not found error
    pub fn module_not_found<S: Into<String>>(what: S) -> Self {
        Error::ModuleNotFound { what: what.into() }
    }

    /// True for errors that describe a missing file or module
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ManifestNotFound { .. } | Error::ModuleNotFound { .. }
        )
    }
}
