//! Error types for the notification codec.

use thiserror::Error;

/// Errors that can occur while encoding or decoding notifications.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Malformed notification batch: {0}")]
    MalformedBatch(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
