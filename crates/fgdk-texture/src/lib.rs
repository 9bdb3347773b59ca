//! Palettized texture decoder for FGDK games.
//!
//! Textures are 8-bit indexed images with two palettes (a regular one and a
//! darkened one). [`TextureAsset`] resolves either palette to an RGBA image
//! and writes both as PNG.
//!
//! # Example
//!
//! ```no_run
//! use fgdk_common::BinaryReader;
//! use fgdk_texture::{TextureAsset, SINGLE_MIP_FLAG};
//!
//! let data = std::fs::read("texture.bin")?;
//! let texture = TextureAsset::read(SINGLE_MIP_FLAG, &mut BinaryReader::new(&data))?;
//! texture.save_png_pair(std::path::Path::new("texture_0"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod sprites;
mod texture;

pub use error::{Error, Result};
pub use sprites::{Sprite, SpriteTable};
pub use texture::{
    abgr_to_rgba, PaletteKind, TextureAsset, FULL_MIP_COUNT, SINGLE_MIP_FLAG,
};
