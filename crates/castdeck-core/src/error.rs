//! CastDeck error types.

use thiserror::Error;

/// Errors surfaced by CastDeck crates.
///
/// Routine conditions (illegal status transitions, undo at the first
/// snapshot, deleting an unknown stream) are not errors and never show up here.
#[derive(Debug, Error)]
pub enum CastDeckError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid stream: {0}")]
    InvalidStream(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CastDeckError>;
