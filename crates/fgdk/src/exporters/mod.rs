//! Per-asset-type exporters and the registry that dispatches to them.
//!
//! Every asset type in a segment consumes its own slice of the segment stream,
//! in asset type order. An exporter must therefore read exactly the bytes its
//! asset group occupies, or every later asset type in the segment misaligns.

use std::path::Path;

use fgdk_common::BinaryReader;
use fgdk_preload::AssetGroup;

use crate::export::ExportOptions;
use crate::target::Target;
use crate::{Error, Result};

#[cfg(feature = "collada-output")]
mod shape;
mod text;
mod texture;

#[cfg(feature = "collada-output")]
pub use shape::ShapeExporter;
pub use text::TextExporter;
pub use texture::TextureExporter;

/// Where and how one segment is being exported.
#[derive(Debug, Clone, Copy)]
pub struct ExportContext<'a> {
    /// Segment name, e.g. `12d0l3`.
    pub segment: &'a str,
    /// Output directory for this segment.
    pub output_dir: &'a Path,
    pub options: &'a ExportOptions,
}

/// Decodes one asset type from a segment stream and writes its files.
pub trait AssetExporter: Send + Sync {
    /// Consume the asset group's data from `reader`.
    ///
    /// Returns the number of files written.
    fn export(
        &self,
        group: &AssetGroup,
        reader: &mut BinaryReader<'_>,
        context: &ExportContext<'_>,
    ) -> Result<usize>;
}

struct RegistryEntry {
    name: Option<&'static str>,
    exporter: Option<Box<dyn AssetExporter>>,
}

/// Maps asset type codes to names and exporters.
pub struct AssetRegistry {
    entries: Vec<RegistryEntry>,
}

impl AssetRegistry {
    /// Registry with the built-in exporters for a target.
    pub fn for_target(target: Target) -> Self {
        let mut registry = Self {
            entries: (0..target.asset_type_count())
                .map(|code| RegistryEntry {
                    name: target.asset_type_name(code),
                    exporter: None,
                })
                .collect(),
        };

        for code in 0..registry.entries.len() {
            let exporter: Option<Box<dyn AssetExporter>> = match target.asset_type_name(code) {
                Some("Text") => Some(Box::new(TextExporter)),
                Some("Texture") => Some(Box::new(TextureExporter)),
                #[cfg(feature = "collada-output")]
                Some("Shape") => Some(Box::new(ShapeExporter)),
                _ => None,
            };
            registry.entries[code].exporter = exporter;
        }

        registry
    }

    /// Install or replace the exporter for an asset type.
    pub fn register(
        &mut self,
        asset_type: usize,
        name: &'static str,
        exporter: Box<dyn AssetExporter>,
    ) {
        if asset_type >= self.entries.len() {
            self.entries.resize_with(asset_type + 1, || RegistryEntry {
                name: None,
                exporter: None,
            });
        }
        self.entries[asset_type] = RegistryEntry {
            name: Some(name),
            exporter: Some(exporter),
        };
    }

    /// Name of an asset type, if known.
    pub fn name(&self, asset_type: usize) -> Option<&'static str> {
        self.entries.get(asset_type).and_then(|e| e.name)
    }

    /// The exporter for an asset type.
    pub fn exporter(&self, asset_type: usize) -> Result<&dyn AssetExporter> {
        self.entries
            .get(asset_type)
            .and_then(|e| e.exporter.as_deref())
            .ok_or(Error::MissingAsset {
                asset_type,
                name: self.name(asset_type),
            })
    }

    /// Whether an exporter is registered for an asset type.
    pub fn has_exporter(&self, asset_type: usize) -> bool {
        self.exporter(asset_type).is_ok()
    }
}

/// Create `dir` and write `contents` to `dir/file_name`.
pub(crate) fn write_output(dir: &Path, file_name: &str, contents: &[u8]) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(file_name), contents)?;
    Ok(())
}
