//! Error types for shape decoding and COLLADA output.

use thiserror::Error;

/// Errors that can occur when decoding or writing shapes.
#[derive(Debug, Error)]
pub enum Error {
    /// Writing the document failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] fgdk_common::Error),

    /// A count or length in the shape data is negative or cannot fit the buffer.
    #[error("malformed shape: {field} = {value} at offset {offset}")]
    MalformedShape {
        field: &'static str,
        value: i64,
        offset: usize,
    },

    /// Decoding failed inside a specific level of detail.
    #[error("LOD {lod}: {source}")]
    Lod {
        lod: usize,
        #[source]
        source: Box<Error>,
    },

    /// A vertex references a bone the skeleton never registered.
    #[error("bone {0} is not registered in the skeleton")]
    UnknownBone(u8),

    /// The rendered document is not valid UTF-8.
    #[error("XML error: {0}")]
    Xml(String),
}

/// Result type for shape operations.
pub type Result<T> = std::result::Result<T, Error>;
