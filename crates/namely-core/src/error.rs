use std::path::PathBuf;
use thiserror::Error;

/// Core error type for namely operations.
///
/// Every variant is a per-file failure: batch processing catches these at the
/// file boundary, increments a counter, and moves on.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Oracle request failed: {0}")]
    OracleTransport(#[from] reqwest::Error),

    #[error("Oracle returned status {status}")]
    OracleStatus { status: u16 },

    #[error("Malformed oracle response: {0}")]
    OracleResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
