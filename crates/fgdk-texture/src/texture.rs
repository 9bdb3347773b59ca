//! Palettized texture records.
//!
//! ```text
//! i32 color_count
//! u32 palette[color_count]        (ABGR, alpha on a 0..128 scale)
//! u32 palette_dark[color_count]
//! i32 width
//! i32 height
//! mip[1 or 4]:
//!     i32 size
//!     u8  indices[size]           (rows bottom-up)
//! ```

use std::path::Path;

use fgdk_common::{plausible_count, BinaryReader};
use image::{ImageFormat, Rgba, RgbaImage};

use crate::{Error, Result};

/// Flag bit marking a texture stored without a mip chain.
pub const SINGLE_MIP_FLAG: u8 = 0x40;

/// Mip levels stored when [`SINGLE_MIP_FLAG`] is clear.
pub const FULL_MIP_COUNT: usize = 4;

/// Which of the two palettes to resolve indices against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteKind {
    /// The regular palette, exported as `_a`.
    Normal,
    /// The darkened palette, exported as `_b`.
    Dark,
}

impl PaletteKind {
    pub const ALL: [PaletteKind; 2] = [PaletteKind::Normal, PaletteKind::Dark];

    /// File name suffix for this palette.
    pub fn suffix(self) -> &'static str {
        match self {
            PaletteKind::Normal => "a",
            PaletteKind::Dark => "b",
        }
    }
}

/// A decoded texture record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureAsset {
    pub flags: u8,
    pub palette: Vec<u32>,
    pub palette_dark: Vec<u32>,
    pub width: u32,
    pub height: u32,
    /// Index data per mip, largest first.
    pub mips: Vec<Vec<u8>>,
}

impl TextureAsset {
    /// Read a texture whose flag byte came from the resource header.
    pub fn read(flags: u8, reader: &mut BinaryReader<'_>) -> Result<Self> {
        let offset = reader.position();
        let raw = reader.read_i32()?;
        let color_count = plausible_count(i64::from(raw), 8, reader.remaining()).ok_or(
            Error::MalformedTexture {
                field: "color_count",
                value: i64::from(raw),
                offset,
            },
        )?;

        let palette = reader.read_u32_vec(color_count)?;
        let palette_dark = reader.read_u32_vec(color_count)?;

        let width = read_dimension(reader, "width")?;
        let height = read_dimension(reader, "height")?;

        let mip_count = if flags & SINGLE_MIP_FLAG != 0 {
            1
        } else {
            FULL_MIP_COUNT
        };

        let mut mips = Vec::with_capacity(mip_count);
        for _ in 0..mip_count {
            let offset = reader.position();
            let raw = reader.read_i32()?;
            let size = plausible_count(i64::from(raw), 1, reader.remaining()).ok_or(
                Error::MalformedTexture {
                    field: "mip_size",
                    value: i64::from(raw),
                    offset,
                },
            )?;
            mips.push(reader.read_bytes(size)?.to_vec());
        }

        let pixel_count = u64::from(width) * u64::from(height);
        if (mips[0].len() as u64) < pixel_count {
            return Err(Error::MalformedTexture {
                field: "mip_size",
                value: mips[0].len() as i64,
                offset,
            });
        }

        let texture = Self {
            flags,
            palette,
            palette_dark,
            width,
            height,
            mips,
        };

        let clamped = texture.clamped_palette_entries();
        let unmapped = texture.unmapped_pixels();
        if clamped > 0 || unmapped > 0 {
            tracing::debug!(
                width,
                height,
                clamped,
                unmapped,
                "texture palette needs fixing up"
            );
        }
        tracing::trace!(width, height, colors = color_count, mips = mip_count, "decoded texture");

        Ok(texture)
    }

    /// Palette entries (both palettes) whose alpha exceeds the 0..128 scale.
    pub fn clamped_palette_entries(&self) -> usize {
        self.palette
            .iter()
            .chain(&self.palette_dark)
            .filter(|&&abgr| abgr >> 24 > 128)
            .count()
    }

    /// Top-mip pixels whose index lies past the end of the palette.
    pub fn unmapped_pixels(&self) -> usize {
        let pixel_count = self.width as usize * self.height as usize;
        self.mips.first().map_or(0, |mip| {
            mip.iter()
                .take(pixel_count)
                .filter(|&&i| usize::from(i) >= self.palette.len())
                .count()
        })
    }

    /// Resolve the top mip against one palette.
    ///
    /// Rows are flipped so the image is top-down. Indices past the end of
    /// the palette become transparent black.
    pub fn to_rgba_image(&self, kind: PaletteKind) -> RgbaImage {
        let palette = match kind {
            PaletteKind::Normal => &self.palette,
            PaletteKind::Dark => &self.palette_dark,
        };
        let indices = self.mips.first().map(Vec::as_slice).unwrap_or_default();
        let width = self.width as usize;
        let height = self.height;

        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let row = (height - 1 - y) as usize;
            let color = indices
                .get(row * width + x as usize)
                .and_then(|&i| palette.get(usize::from(i)))
                .map_or([0, 0, 0, 0], |&abgr| abgr_to_rgba(abgr));
            Rgba(color)
        })
    }

    /// Write `<base>_a.png` and `<base>_b.png`.
    pub fn save_png_pair(&self, base: &Path) -> Result<()> {
        for kind in PaletteKind::ALL {
            let mut name = base.as_os_str().to_owned();
            name.push(format!("_{}.png", kind.suffix()));
            self.to_rgba_image(kind)
                .save_with_format(Path::new(&name), ImageFormat::Png)?;
        }
        Ok(())
    }

    /// Whether the texture has no pixels to write.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Convert an ABGR palette word to RGBA, rescaling alpha from 0..128.
pub fn abgr_to_rgba(abgr: u32) -> [u8; 4] {
    let [r, g, b, a] = abgr.to_le_bytes();
    let a = (u32::from(a) * 255 / 128).min(255) as u8;
    [r, g, b, a]
}

fn read_dimension(reader: &mut BinaryReader<'_>, field: &'static str) -> Result<u32> {
    let offset = reader.position();
    let raw = reader.read_i32()?;
    u32::try_from(raw).map_err(|_| Error::MalformedTexture {
        field,
        value: i64::from(raw),
        offset,
    })
}
