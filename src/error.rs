//! Error taxonomy for the ranking core.
//!
//! | Variant                 | Recovery                                        |
//! |-------------------------|-------------------------------------------------|
//! | `MissingData`           | Local: the lookup is skipped                    |
//! | `InsufficientVotes`     | Local: sentinel for items, skip for a scope     |
//! | `ConfigurationConflict` | Fatal: abort before any ranking work            |
//! | `Io` / `Malformed`      | Fatal: surfaced to the CLI with the path        |
//!
//! Inconsistent regional estimates are not errors at all: they are recorded on
//! the item signal (`SignalFlag::InconsistentEstimate`) and logged.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for ranking operations.
pub type Result<T> = std::result::Result<T, GemError>;

#[derive(Debug, Error)]
pub enum GemError {
    /// An id was looked up but is not part of the catalog.
    #[error("item {0} not found in catalog")]
    MissingData(String),

    /// No votes at all for a whole scope (e.g. one language).
    #[error("no votes available for {0}")]
    InsufficientVotes(String),

    /// Mutually exclusive or out-of-range settings.
    #[error("configuration conflict: {0}")]
    ConfigurationConflict(String),

    /// A language tag that neither the lookup table nor detection voting resolves.
    #[error("unknown language tag: {0}")]
    UnknownLanguage(String),

    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {what} in {path}: {message}")]
    Malformed {
        path: PathBuf,
        what: &'static str,
        message: String,
    },

    #[error("detection cache error: {0}")]
    Cache(String),
}

impl GemError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::ConfigurationConflict(message.into())
    }

    /// Errors a caller may recover from by skipping the affected item or scope.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MissingData(_) | Self::InsufficientVotes(_))
    }
}
