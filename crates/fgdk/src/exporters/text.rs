//! Text assets.
//!
//! Only the string payloads are recovered: every sub-resource of a text
//! resource is a run of NUL-terminated Latin-1 strings.

use fgdk_common::{BinaryReader, TextEncoding};
use fgdk_preload::{AssetGroup, ResourceCatalog};

use super::{write_output, AssetExporter, ExportContext};
use crate::Result;

/// Writes `text_<i>.txt`, one string per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExporter;

impl AssetExporter for TextExporter {
    fn export(
        &self,
        group: &AssetGroup,
        reader: &mut BinaryReader<'_>,
        context: &ExportContext<'_>,
    ) -> Result<usize> {
        let catalog = ResourceCatalog::read(reader)?;

        let mut written = 0;
        for index in 0..usize::from(group.element_count) {
            let Some(payloads) = catalog.resource_payloads(index) else {
                tracing::debug!(segment = context.segment, index, "text asset has no resource");
                continue;
            };

            let mut lines = Vec::new();
            for payload in payloads {
                lines.extend(decode_strings(payload)?);
            }

            let mut contents = lines.join("\n");
            contents.push('\n');
            write_output(
                context.output_dir,
                &format!("text_{index}.txt"),
                contents.as_bytes(),
            )?;
            written += 1;
        }

        Ok(written)
    }
}

/// Split a payload into its strings. A trailing unterminated run is kept.
fn decode_strings(payload: &[u8]) -> Result<Vec<String>> {
    let mut reader = BinaryReader::new(payload);
    let mut strings = Vec::new();

    while !reader.is_empty() {
        let value = if reader.remaining_bytes().contains(&0) {
            reader.read_null_terminated_string(TextEncoding::Latin1)?
        } else {
            reader.read_fixed_string(reader.remaining(), false, TextEncoding::Latin1)?
        };
        strings.push(value);
    }

    Ok(strings)
}
