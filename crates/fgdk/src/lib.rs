//! FGDK game asset extraction library.
//!
//! This crate ties the FGDK decoders together: it reads a `PRELOAD.DAT`
//! catalog, finds every overlay segment (loose or in `OVERLAY.ZIP`) and runs
//! the exporter registered for each asset type the segment declares.
//!
//! # Crates
//!
//! - [`fgdk_common`] - Endian-aware binary reading
//! - [`fgdk_preload`] - Preload catalog and resource headers
//! - [`fgdk_shape`] - Skinned shapes and COLLADA output
//! - [`fgdk_texture`] - Palettized textures and PNG output
//!
//! # Example
//!
//! ```no_run
//! use fgdk::prelude::*;
//! use std::path::Path;
//!
//! let preload_path = Path::new("game/PRELOAD.DAT");
//! let target = Target::detect(preload_path.parent().unwrap()).unwrap_or(Target::Dogs);
//!
//! let exporter = PreloadExporter::new(
//!     target,
//!     OverlaySource::beside(preload_path)?,
//!     "game/OVERLAY_unpack",
//!     ExportOptions::default(),
//! );
//! let preload = exporter.read_preload(preload_path)?;
//! let stats = exporter.export_all(&preload, |done, total| println!("{done}/{total}"));
//! println!("{} files written", stats.files);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod export;
pub mod exporters;
mod source;
mod target;

pub use error::{Error, Result};
pub use export::{
    ExportOptions, ExportStats, PreloadExporter, SegmentOutcome, DEFAULT_OUTPUT_DIR,
};
pub use source::{OverlaySource, OVERLAY_DIR, OVERLAY_ZIP};
pub use target::Target;

// Re-export all sub-crates
pub use fgdk_common as common;
pub use fgdk_preload as preload;
pub use fgdk_shape as shape;
pub use fgdk_texture as texture;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::exporters::{AssetExporter, AssetRegistry, ExportContext};
    pub use crate::{
        ExportOptions, ExportStats, OverlaySource, PreloadExporter, SegmentOutcome, Target,
    };
    pub use fgdk_common::{BinaryReader, Endian};
    pub use fgdk_preload::{ArchiveNode, Overlay, OverlaySegment, PreloadFile, ResourceCatalog};
    pub use fgdk_shape::{Shape, ShapeHeader, ShapeOptions, SkinBuildContext};
    pub use fgdk_texture::TextureAsset;
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
