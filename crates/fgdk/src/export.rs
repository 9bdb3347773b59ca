//! Overlay export driver.
//!
//! Walks every overlay of a preload catalog, loads each of its segments and
//! hands the segment stream to the registered exporters in asset type order.
//! A failing segment is logged and skipped; the rest of the export carries on.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use fgdk_common::{BinaryReader, Endian};
use fgdk_preload::{Overlay, OverlaySegment, PreloadFile};
use fgdk_shape::ShapeOptions;
use parking_lot::Mutex;

use crate::exporters::{AssetRegistry, ExportContext};
use crate::source::OverlaySource;
use crate::target::Target;
use crate::{Error, Result};

/// Name of the default output directory, created next to the preload catalog.
pub const DEFAULT_OUTPUT_DIR: &str = "OVERLAY_unpack";

/// Knobs shared by every exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Byte order of catalog and segment data.
    pub endian: Endian,
    pub shape: ShapeOptions,
    /// Write opaque shape fields as XML comments.
    pub write_metadata: bool,
    /// Export overlays on the rayon thread pool (needs the `parallel` feature).
    pub parallel: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            endian: Endian::Little,
            shape: ShapeOptions::default(),
            write_metadata: true,
            parallel: false,
        }
    }
}

/// What happened to one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOutcome {
    /// Every asset group was empty; nothing was loaded.
    Empty,
    /// No file for the segment in either location.
    NotFound,
    /// All asset types exported.
    Exported { files: usize },
    /// An asset type had no exporter. Files written before it stay on disk.
    Aborted { files: usize, asset_type: usize },
}

/// Totals over an export run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub overlays: usize,
    pub exported: usize,
    pub empty: usize,
    pub not_found: usize,
    pub aborted: usize,
    pub failed: usize,
    pub files: usize,
}

#[derive(Default)]
struct StatCounters {
    exported: AtomicUsize,
    empty: AtomicUsize,
    not_found: AtomicUsize,
    aborted: AtomicUsize,
    failed: AtomicUsize,
    files: AtomicUsize,
}

impl StatCounters {
    fn record(&self, outcome: &Result<SegmentOutcome>) {
        match outcome {
            Ok(SegmentOutcome::Empty) => {
                self.empty.fetch_add(1, Ordering::Relaxed);
            }
            Ok(SegmentOutcome::NotFound) => {
                self.not_found.fetch_add(1, Ordering::Relaxed);
            }
            Ok(SegmentOutcome::Exported { files }) => {
                self.exported.fetch_add(1, Ordering::Relaxed);
                self.files.fetch_add(*files, Ordering::Relaxed);
            }
            Ok(SegmentOutcome::Aborted { files, .. }) => {
                self.aborted.fetch_add(1, Ordering::Relaxed);
                self.files.fetch_add(*files, Ordering::Relaxed);
            }
            Err(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn snapshot(&self, overlays: usize) -> ExportStats {
        ExportStats {
            overlays,
            exported: self.exported.load(Ordering::Relaxed),
            empty: self.empty.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            files: self.files.load(Ordering::Relaxed),
        }
    }
}

/// Exports the overlays of one preload catalog.
pub struct PreloadExporter {
    target: Target,
    registry: AssetRegistry,
    source: OverlaySource,
    output: PathBuf,
    options: ExportOptions,
}

impl PreloadExporter {
    pub fn new(
        target: Target,
        source: OverlaySource,
        output: impl Into<PathBuf>,
        options: ExportOptions,
    ) -> Self {
        Self {
            target,
            registry: AssetRegistry::for_target(target),
            source,
            output: output.into(),
            options,
        }
    }

    /// Replace the asset registry.
    pub fn with_registry(mut self, registry: AssetRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Parse the catalog at `path` for this exporter's target.
    pub fn read_preload(&self, path: &Path) -> Result<PreloadFile> {
        let data = std::fs::read(path)?;
        Ok(PreloadFile::parse(
            &data,
            self.target.asset_type_count(),
            self.options.endian,
        )?)
    }

    /// Export every overlay. `progress` is called with (done, total) after
    /// each overlay.
    pub fn export_all<F>(&self, preload: &PreloadFile, mut progress: F) -> ExportStats
    where
        F: FnMut(usize, usize) + Send,
    {
        let overlays = preload.overlays();
        let total = overlays.len();
        let counters = StatCounters::default();
        let done = AtomicUsize::new(0);
        let progress = Mutex::new(&mut progress);

        let run = |overlay: &&Overlay| {
            self.export_overlay_into(overlay, &counters);
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            (*progress.lock())(finished, total);
        };

        #[cfg(feature = "parallel")]
        if self.options.parallel {
            use rayon::prelude::*;
            overlays.par_iter().for_each(run);
            return counters.snapshot(total);
        }

        overlays.iter().for_each(run);
        counters.snapshot(total)
    }

    /// Export every segment of one overlay.
    pub fn export_overlay(&self, overlay: &Overlay) -> ExportStats {
        let counters = StatCounters::default();
        self.export_overlay_into(overlay, &counters);
        counters.snapshot(1)
    }

    fn export_overlay_into(&self, overlay: &Overlay, counters: &StatCounters) {
        for segment in overlay.segments(self.target.localization_count()) {
            let outcome = self.export_segment(&segment);
            if let Err(e) = &outcome {
                tracing::error!(segment = %segment.name, "export failed: {e}");
            }
            counters.record(&outcome);
        }
    }

    /// Export one segment.
    ///
    /// Decode errors end the segment and are returned; a missing exporter
    /// ends it with [`SegmentOutcome::Aborted`].
    pub fn export_segment(&self, segment: &OverlaySegment<'_>) -> Result<SegmentOutcome> {
        if !segment.has_assets() {
            return Ok(SegmentOutcome::Empty);
        }

        let file_name = segment.file_name();
        let Some(data) = self.source.load(&file_name)? else {
            tracing::debug!(segment = %segment.name, "segment file not found, skipping");
            return Ok(SegmentOutcome::NotFound);
        };

        let output_dir = self.output.join(&segment.name);
        let context = ExportContext {
            segment: &segment.name,
            output_dir: &output_dir,
            options: &self.options,
        };
        let mut reader = BinaryReader::with_endian(&data, self.options.endian);

        let mut files = 0;
        for (asset_type, group) in segment.groups.iter().enumerate() {
            if group.is_empty() {
                continue;
            }

            let exporter = match self.registry.exporter(asset_type) {
                Ok(exporter) => exporter,
                Err(e @ Error::MissingAsset { .. }) => {
                    tracing::warn!("{e}, aborting export for '{file_name}'");
                    return Ok(SegmentOutcome::Aborted { files, asset_type });
                }
                Err(e) => return Err(e),
            };

            tracing::info!(
                segment = %segment.name,
                asset_type,
                name = self.registry.name(asset_type).unwrap_or("unnamed"),
                count = group.element_count,
                "exporting assets"
            );
            files += exporter.export(group, &mut reader, &context)?;
        }

        if !reader.is_empty() {
            tracing::debug!(
                segment = %segment.name,
                trailing = reader.remaining(),
                "segment has unread bytes"
            );
        }

        Ok(SegmentOutcome::Exported { files })
    }
}
