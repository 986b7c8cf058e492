//! Error types for the history engine.

use thiserror::Error;
use tlf_notify::CodecError;

/// Errors returned by [`TlfHistory`](crate::TlfHistory) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("Failed to decode batch {batch} from writer {writer}: {source}")]
    Decode {
        writer: String,
        batch: usize,
        source: CodecError,
    },

    #[error("Logged-in user {actual} does not match unflushed user {expected}")]
    UnflushedUserMismatch { expected: String, actual: String },
}

pub type Result<T> = std::result::Result<T, HistoryError>;
