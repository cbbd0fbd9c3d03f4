#![forbid(unsafe_code)]

//! Error types for the history engine.

use thiserror::Error;

/// Recoverable errors returned by tracked mutations and manual transaction
/// bracketing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// An array mutation addressed an index past the end.
    #[error("index {index} out of bounds (length {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// `end_transaction`/`rollback_transaction` with no open transaction.
    #[error("no open transaction to end")]
    NoOpenTransaction,
}

/// Engine bug detectors. These are never retried; callers that hit one
/// abort loudly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("almanac holds {actual} entries but is configured for {configured}")]
    AlmanacSize { configured: usize, actual: usize },
}

/// Errors that can occur when loading a [`HistoryConfig`](crate::HistoryConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "toml-config")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid history config: {}", .0.join("; "))]
    Invalid(Vec<String>),
}
