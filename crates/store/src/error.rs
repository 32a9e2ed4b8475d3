use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the store and its backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be read or written.
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted document as a whole is not valid JSON.
    #[error("persisted document at {path} is malformed: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A single key holds a value of the wrong shape.
    #[error("value under key '{key}' could not be decoded: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("value for key '{key}' could not be encoded: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Backend refused the write for a reason of its own.
    #[error("backend '{backend}' rejected the write: {reason}")]
    Rejected {
        backend: &'static str,
        reason: String,
    },
}
