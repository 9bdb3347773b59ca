//! Overlay segment byte sources.
//!
//! Segments are looked up in the loose `OVERLAY` directory first and then in
//! `OVERLAY.ZIP`. Both lookups ignore ASCII case. A segment missing from both
//! is not an error.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use zip::ZipArchive;

use crate::Result;

/// Loose overlay directory name.
pub const OVERLAY_DIR: &str = "OVERLAY";

/// Packed overlay archive name.
pub const OVERLAY_ZIP: &str = "OVERLAY.ZIP";

/// Where overlay segment files come from.
pub struct OverlaySource {
    dir: PathBuf,
    /// Lower-cased file name to path, for loose files.
    loose_index: FxHashMap<String, PathBuf>,
    archive: Option<Mutex<ZipArchive<File>>>,
    /// Lower-cased file name to full entry name.
    archive_index: FxHashMap<String, String>,
}

impl OverlaySource {
    /// Use `dir` for loose files and, if it exists, `zip_path` as fallback.
    pub fn open(dir: impl Into<PathBuf>, zip_path: Option<&Path>) -> Result<Self> {
        let dir = dir.into();
        let loose_index = index_dir(&dir)?;

        let mut archive_index = FxHashMap::default();
        let archive = match zip_path {
            Some(path) if path.is_file() => {
                let archive = ZipArchive::new(File::open(path)?)?;
                for name in archive.file_names() {
                    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
                    archive_index
                        .entry(base.to_ascii_lowercase())
                        .or_insert_with(|| name.to_string());
                }
                tracing::debug!(
                    path = %path.display(),
                    entries = archive.len(),
                    "opened overlay archive"
                );
                Some(Mutex::new(archive))
            }
            _ => None,
        };

        Ok(Self {
            dir,
            loose_index,
            archive,
            archive_index,
        })
    }

    /// The `OVERLAY` directory and `OVERLAY.ZIP` next to a preload catalog.
    pub fn beside(preload_path: &Path) -> Result<Self> {
        let parent = preload_path.parent().unwrap_or(Path::new("."));
        Self::open(parent.join(OVERLAY_DIR), Some(&parent.join(OVERLAY_ZIP)))
    }

    /// Whether a zip fallback is available.
    pub fn has_archive(&self) -> bool {
        self.archive.is_some()
    }

    /// Load a segment file, or `None` if neither location has it.
    pub fn load(&self, file_name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.dir.join(file_name);
        if path.is_file() {
            return Ok(Some(std::fs::read(&path)?));
        }
        if let Some(path) = self.loose_index.get(&file_name.to_ascii_lowercase()) {
            return Ok(Some(std::fs::read(path)?));
        }

        let Some(archive) = &self.archive else {
            return Ok(None);
        };
        let Some(entry_name) = self.archive_index.get(&file_name.to_ascii_lowercase()) else {
            return Ok(None);
        };

        let mut archive = archive.lock();
        let mut entry = archive.by_name(entry_name)?;
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        Ok(Some(data))
    }
}

/// Map lower-cased file names in `dir` to their paths. A missing directory
/// yields an empty index.
fn index_dir(dir: &Path) -> Result<FxHashMap<String, PathBuf>> {
    let mut index = FxHashMap::default();
    if !dir.is_dir() {
        return Ok(index);
    }

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            index
                .entry(name.to_ascii_lowercase())
                .or_insert_with(|| entry.path());
        }
    }

    tracing::debug!(path = %dir.display(), files = index.len(), "indexed overlay directory");
    Ok(index)
}
