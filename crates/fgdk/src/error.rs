//! Error types for the export driver.

use thiserror::Error;

/// Errors that can occur while exporting overlays.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] fgdk_common::Error),

    /// Preload or resource header error.
    #[error("{0}")]
    Preload(#[from] fgdk_preload::Error),

    /// Shape decoding or output error.
    #[error("{0}")]
    Shape(#[from] fgdk_shape::Error),

    /// Texture decoding or output error.
    #[error("{0}")]
    Texture(#[from] fgdk_texture::Error),

    /// `OVERLAY.ZIP` could not be read.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An asset type with elements has no exporter.
    #[error("exporter for type#{asset_type} ({}) unavailable", name.unwrap_or("unnamed"))]
    MissingAsset {
        asset_type: usize,
        name: Option<&'static str>,
    },

    /// A resource header lacks a sub-resource an exporter relies on.
    #[error("resource {resource} has no subresource {subresource}")]
    MissingSubresource { resource: usize, subresource: usize },

    /// Exporting one asset failed.
    #[error("{kind} {index}: {source}")]
    Asset {
        kind: &'static str,
        index: usize,
        #[source]
        source: Box<Error>,
    },

    /// No target marker file next to the preload catalog.
    #[error("could not detect target in {0}")]
    UnknownTarget(std::path::PathBuf),

    /// Target name not recognized.
    #[error("unknown target '{0}' (expected dogs or zoo)")]
    InvalidTarget(String),
}

impl Error {
    /// Wrap an error with the asset it occurred in.
    pub(crate) fn in_asset(kind: &'static str, index: usize) -> impl FnOnce(Error) -> Error {
        move |source| Error::Asset {
            kind,
            index,
            source: Box::new(source),
        }
    }
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, Error>;
