//! IAI-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, IaiError>;

/// Top-level error type for Imaging Archive Inventory.
#[derive(Debug, Error)]
pub enum IaiError {
    #[error("[IAI-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[IAI-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[IAI-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[IAI-2001] scan root not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("[IAI-2002] scan root is not a directory: {path}")]
    RootNotDirectory { path: PathBuf },

    #[error("[IAI-2003] scan root could not be listed: {path}: {details}")]
    RootUnreadable { path: PathBuf, details: String },

    #[error("[IAI-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[IAI-2102] CSV failure in {context}: {details}")]
    Csv {
        context: &'static str,
        details: String,
    },

    #[error("[IAI-3001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IaiError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "IAI-1001",
            Self::MissingConfig { .. } => "IAI-1002",
            Self::ConfigParse { .. } => "IAI-1003",
            Self::RootNotFound { .. } => "IAI-2001",
            Self::RootNotDirectory { .. } => "IAI-2002",
            Self::RootUnreadable { .. } => "IAI-2003",
            Self::Serialization { .. } => "IAI-2101",
            Self::Csv { .. } => "IAI-2102",
            Self::Io { .. } => "IAI-3001",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::RootUnreadable { .. } | Self::Csv { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for IaiError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for IaiError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<csv::Error> for IaiError {
    fn from(value: csv::Error) -> Self {
        Self::Csv {
            context: "csv",
            details: value.to_string(),
        }
    }
}
