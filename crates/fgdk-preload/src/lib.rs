//! Preload catalog and resource header parser for FGDK games.
//!
//! FGDK titles ship a `PRELOAD.DAT` catalog describing every overlay, plus
//! one `.ovl` payload per overlay segment (loose in an `OVERLAY` directory or
//! packed in `OVERLAY.ZIP`). This crate decodes the catalog tree and the
//! resource headers that prefix asset data inside a segment.
//!
//! # Example
//!
//! ```no_run
//! use fgdk_common::Endian;
//! use fgdk_preload::PreloadFile;
//!
//! let data = std::fs::read("PRELOAD.DAT")?;
//! let preload = PreloadFile::parse(&data, 11, Endian::Little)?;
//!
//! for overlay in preload.overlays() {
//!     for segment in overlay.segments(11) {
//!         if segment.has_assets() {
//!             println!("{}", segment.file_name());
//!         }
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod preload;
mod resources;

pub use error::{Error, Result};
pub use preload::{
    ArchiveNode, AssetGroup, AuxRecord, GroupKind, Overlay, OverlaySegment, PreloadFile,
    SegmentKind, MAX_NESTING_DEPTH, SEGMENT_KIND_COUNT,
};
pub use resources::{Annotation, Dependency, Resource, ResourceCatalog, Subresource};
