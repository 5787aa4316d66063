//! Structured error types for configuration loading.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to coerce a raw environment string into a typed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CastError {
    #[error("expected a number, got {value}")]
    BadNumber { value: String },

    #[error("expected a boolean, got {value}")]
    BadBoolean { value: String },
}

impl CastError {
    /// The raw value that failed to cast.
    pub fn value(&self) -> &str {
        match self {
            CastError::BadNumber { value } | CastError::BadBoolean { value } => value,
        }
    }
}

/// A write that a path cannot address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The empty path addresses the root, which must stay a mapping.
    #[error("the root must stay a mapping")]
    Root,

    /// Padding a sequence up to `index` would add too many null elements.
    #[error("index {index} is too far past the end of a sequence of length {len}")]
    IndexTooFar { index: usize, len: usize },
}

/// Errors surfaced by [`ConfigStore::load`](crate::config::ConfigStore::load).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The base file or an explicitly named override file does not exist.
    #[error("couldn't find or read file {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed YAML. The parser error carries line and column.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("top level of {} must be a mapping", path.display())]
    NotAMapping { path: PathBuf },

    #[error("invalid env_mapping entry for {var}: {reason}")]
    InvalidMapping { var: String, reason: String },

    #[error("environment variable {var}: {source}")]
    Cast {
        var: String,
        #[source]
        source: CastError,
    },

    #[error("cannot write `{path}`: {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: PathError,
    },

    /// A value could not be converted into the requested Rust type.
    #[error("invalid value at {key}: {source}")]
    Deserialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::MissingFile {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// File the error relates to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::MissingFile { path }
            | ConfigError::Io { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::NotAMapping { path } => Some(path),
            ConfigError::InvalidMapping { .. }
            | ConfigError::Cast { .. }
            | ConfigError::InvalidPath { .. }
            | ConfigError::Deserialize { .. } => None,
        }
    }

    /// One-based (line, column) of a parse error.
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            ConfigError::Parse { source, .. } => {
                source.location().map(|loc| (loc.line(), loc.column()))
            }
            _ => None,
        }
    }

    /// Whether this is a missing-file error.
    pub fn is_missing_file(&self) -> bool {
        matches!(self, ConfigError::MissingFile { .. })
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
