//! CAS error types.

use std::io;
use thiserror::Error;

use crate::ContentId;

/// Content store error type.
#[derive(Debug, Error)]
pub enum CasError {
    /// No object stored under this id.
    #[error("content not found: {0}")]
    NotFound(ContentId),

    /// The id is not one this store can address.
    #[error("invalid content id: {0}")]
    InvalidId(String),

    /// Stored bytes no longer hash to their id.
    #[error("corrupted object: expected {expected}, got {actual}")]
    Corrupted {
        expected: ContentId,
        actual: ContentId,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for content store operations.
pub type CasResult<T> = Result<T, CasError>;
