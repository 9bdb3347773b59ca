//! Texture assets.

use fgdk_common::{plausible_count, BinaryReader};
use fgdk_preload::{AssetGroup, ResourceCatalog};
use fgdk_texture::{SpriteTable, TextureAsset};

use super::{AssetExporter, ExportContext};
use crate::{Error, Result};

/// Resource holding the per-texture flag blobs.
const FLAGS_RESOURCE: usize = 2;

/// Writes `texture_<i>_a.png` and `texture_<i>_b.png`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextureExporter;

impl AssetExporter for TextureExporter {
    fn export(
        &self,
        _group: &AssetGroup,
        reader: &mut BinaryReader<'_>,
        context: &ExportContext<'_>,
    ) -> Result<usize> {
        let offset = reader.position();
        let raw = reader.read_i32()?;
        // A texture record is at least 20 bytes even with an empty palette.
        let texture_count = plausible_count(i64::from(raw), 20, reader.remaining()).ok_or(
            fgdk_texture::Error::MalformedTexture {
                field: "texture_count",
                value: i64::from(raw),
                offset,
            },
        )?;

        let catalog = ResourceCatalog::read(reader)?;

        let mut written = 0;
        for index in 0..texture_count {
            let subresource = index * 2;
            let flags = catalog
                .subresource_bytes(FLAGS_RESOURCE, subresource)
                .and_then(|bytes| bytes.first().copied())
                .ok_or(Error::MissingSubresource {
                    resource: FLAGS_RESOURCE,
                    subresource,
                })
                .map_err(Error::in_asset("texture", index))?;

            let texture = TextureAsset::read(flags, reader)
                .map_err(|e| Error::in_asset("texture", index)(e.into()))?;

            if texture.is_empty() {
                tracing::warn!(
                    segment = context.segment,
                    index,
                    width = texture.width,
                    height = texture.height,
                    "skipping texture without pixels"
                );
                continue;
            }

            std::fs::create_dir_all(context.output_dir)?;
            texture
                .save_png_pair(&context.output_dir.join(format!("texture_{index}")))
                .map_err(|e| Error::in_asset("texture", index)(e.into()))?;
            written += 2;
        }

        let sprites = SpriteTable::read(reader)?;
        tracing::debug!(
            segment = context.segment,
            textures = texture_count,
            sprites = sprites.len(),
            "read texture group"
        );

        Ok(written)
    }
}
