//! Error types
//!
//! Every fallible operation in the crate returns [`SnapshotError`]. Variants are grouped
//! into categories so callers can tell I/O failures (bad input, codec or filesystem
//! trouble) apart from structural misuse of the content tree.

use crate::tree::VirtualPath;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Broad classification of a [`SnapshotError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Filesystem, codec, or descriptor parse failure
    Io,
    /// Tree invariant violation caused by the caller
    Structural,
    /// Write aborted by the progress callback
    Aborted,
    /// Invalid configuration or logging setup
    Config,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive error in {path}: {source}")]
    Archive {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Malformed descriptor {path}: {message}")]
    Descriptor { path: String, message: String },

    #[error("Invalid target {0}: {1}")]
    InvalidTarget(PathBuf, String),

    #[error("Not found: {0}")]
    NotFound(VirtualPath),

    #[error("Not empty: {0}")]
    NotEmpty(VirtualPath),

    #[error("Not a folder: {0}")]
    NotAFolder(VirtualPath),

    #[error("Not a file: {0}")]
    NotAFile(VirtualPath),

    #[error("Missing parent of {0}")]
    MissingParent(VirtualPath),

    #[error("Root cannot be removed or replaced")]
    RootImmutable,

    #[error("Nesting depth limit {limit} exceeded at {path}")]
    DepthExceeded { path: String, limit: usize },

    #[error("Write aborted: {0}")]
    Aborted(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

impl SnapshotError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn archive(path: impl ToString, source: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.to_string(),
            source,
        }
    }

    pub fn descriptor(path: impl ToString, message: impl ToString) -> Self {
        Self::Descriptor {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Io { .. }
            | Self::Archive { .. }
            | Self::Descriptor { .. }
            | Self::InvalidTarget(..) => ErrorCategory::Io,
            Self::NotFound(_)
            | Self::NotEmpty(_)
            | Self::NotAFolder(_)
            | Self::NotAFile(_)
            | Self::MissingParent(_)
            | Self::RootImmutable
            | Self::DepthExceeded { .. } => ErrorCategory::Structural,
            Self::Aborted(_) => ErrorCategory::Aborted,
            Self::ConfigError(_) | Self::Config(_) => ErrorCategory::Config,
        }
    }

    pub fn is_io(&self) -> bool {
        self.category() == ErrorCategory::Io
    }
}
