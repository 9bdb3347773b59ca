//! Error types for preload and resource header parsing.

use thiserror::Error;

/// Errors that can occur when parsing the preload catalog or a resource header.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] fgdk_common::Error),

    /// A catalog node carried a tag this parser does not know.
    #[error("unsupported catalog node tag {tag} at offset {offset}")]
    NotSupported { tag: u8, offset: usize },

    /// Catalog groups nested deeper than the parser allows.
    #[error("catalog nesting exceeds {limit} levels at offset {offset}")]
    NestingTooDeep { limit: usize, offset: usize },

    /// A resource header count or size is negative or cannot fit the buffer.
    #[error("malformed resource header: {field} = {value} at offset {offset}")]
    MalformedHeader {
        field: &'static str,
        value: i64,
        offset: usize,
    },
}

/// Result type for preload operations.
pub type Result<T> = std::result::Result<T, Error>;
