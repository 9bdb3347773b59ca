//! Error types for fgdk-common.

use thiserror::Error;

/// Common error type for FGDK decoding.
#[derive(Debug, Error)]
pub enum Error {
    /// The cursor ran past the end of the buffer.
    #[error("unexpected end of data at offset {offset}: needed {needed} bytes but only {available} available")]
    UnexpectedEndOfData {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Missing null terminator in string.
    #[error("string starting at offset {0} is missing its null terminator")]
    MissingNullTerminator(usize),
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
