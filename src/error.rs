//! Error types for the dApp Hub filesystem.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by filesystem operations.
///
/// Every variant is terminal for the single operation that raised it; nothing
/// here is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("No such file or directory: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid file handle: {0}")]
    InvalidHandle(u64),

    #[error("Malformed catalog entry '{name}': {reason}")]
    MalformedEntity { name: String, reason: String },

    #[error("File handle space exhausted")]
    ResourceExhausted,
}

impl FsError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory(path.into())
    }

    pub fn permission_denied(path: impl Into<String>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedEntity {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Errno reported to the kernel for this error.
    ///
    /// `MalformedEntity` has no finer-grained code in the FUSE contract and is
    /// surfaced as a generic I/O error.
    pub fn errno(&self) -> i32 {
        match self {
            FsError::NotFound(_) => libc::ENOENT,
            FsError::NotADirectory(_) => libc::ENOTDIR,
            FsError::IsADirectory(_) => libc::EISDIR,
            FsError::PermissionDenied(_) => libc::EACCES,
            FsError::InvalidHandle(_) => libc::EBADF,
            FsError::MalformedEntity { .. } => libc::EIO,
            FsError::ResourceExhausted => libc::EMFILE,
        }
    }
}

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid catalog record #{index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

/// Top-level errors surfaced by the binary
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Mount failed at {path:?}: {source}")]
    Mount {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Filesystem error: {0}")]
    Fs(#[from] FsError),

    #[error("Catalog check failed:\n{0}")]
    CheckFailed(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
