//! Error types for texture decoding.

use thiserror::Error;

/// Errors that can occur when decoding textures.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] fgdk_common::Error),

    /// A count or dimension in the texture record is out of range.
    #[error("malformed texture: {field} = {value} at offset {offset}")]
    MalformedTexture {
        field: &'static str,
        value: i64,
        offset: usize,
    },

    /// Image encoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type for texture operations.
pub type Result<T> = std::result::Result<T, Error>;
