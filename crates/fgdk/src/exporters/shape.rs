//! Shape assets.

use fgdk_common::BinaryReader;
use fgdk_preload::{AssetGroup, ResourceCatalog};
use fgdk_shape::{ColladaExporter, Shape, ShapeHeader};

use super::{write_output, AssetExporter, ExportContext};
use crate::{Error, Result};

/// Resource holding the shape header blobs.
const HEADER_RESOURCE: usize = 0;

/// Writes `shape_<i>_lod<n>.dae` for every LOD of every shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeExporter;

impl AssetExporter for ShapeExporter {
    fn export(
        &self,
        group: &AssetGroup,
        reader: &mut BinaryReader<'_>,
        context: &ExportContext<'_>,
    ) -> Result<usize> {
        let catalog = ResourceCatalog::read(reader)?;

        let mut written = 0;
        for index in 0..usize::from(group.element_count) {
            let documents =
                render_shape(&catalog, index, reader, context).map_err(Error::in_asset("shape", index))?;

            // Only write once every LOD rendered.
            for (lod, document) in documents.iter().enumerate() {
                write_output(
                    context.output_dir,
                    &format!("shape_{index}_lod{lod}.dae"),
                    document.as_bytes(),
                )?;
            }
            written += documents.len();
        }

        Ok(written)
    }
}

fn render_shape(
    catalog: &ResourceCatalog,
    index: usize,
    reader: &mut BinaryReader<'_>,
    context: &ExportContext<'_>,
) -> Result<Vec<String>> {
    let subresource = 1 + index * 2;
    let header_bytes = catalog
        .subresource_bytes(HEADER_RESOURCE, subresource)
        .ok_or(Error::MissingSubresource {
            resource: HEADER_RESOURCE,
            subresource,
        })?;
    let header = ShapeHeader::parse(header_bytes, context.options.endian)?;
    let shape = Shape::read(header, reader, &context.options.shape)?;

    shape
        .lods
        .iter()
        .enumerate()
        .map(|(lod, lod_context)| {
            let mut exporter = ColladaExporter::new(lod_context);
            if context.options.write_metadata {
                exporter = exporter.with_comments(shape.metadata_comments(lod));
            }
            Ok(exporter.export()?)
        })
        .collect()
}
