//! Shape header.

use fgdk_common::{BinaryReader, Endian};

use crate::{Error, Result};

/// Encoded size of a [`ShapeHeader`] in bytes.
pub const SHAPE_HEADER_SIZE: usize = 68;

/// Fixed 17-field header describing one shape.
///
/// Only the LOD count and the auxiliary scalar count are understood. The rest
/// is kept verbatim so nothing is lost when a later revision learns what it
/// means.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeHeader {
    /// Fields 0-3. Possibly a bounding sphere.
    pub unknown_floats: [f32; 4],
    /// Fields 4-6.
    pub unknown_head: [u32; 3],
    /// Field 7: number of LODs that follow the auxiliary scalars.
    pub lod_count: i32,
    /// Field 8: number of u32 scalars preceding the first LOD.
    pub aux_scalar_count: i32,
    /// Fields 9-16.
    pub unknown_tail: [u32; 8],
}

impl ShapeHeader {
    /// Parse a header from the start of a sub-resource blob.
    pub fn parse(data: &[u8], endian: Endian) -> Result<Self> {
        Self::read(&mut BinaryReader::with_endian(data, endian))
    }

    /// Read a header from a reader.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let unknown_floats = reader.read_f32_array::<4>()?;

        let mut unknown_head = [0u32; 3];
        for value in &mut unknown_head {
            *value = reader.read_u32()?;
        }

        let offset = reader.position();
        let lod_count = reader.read_i32()?;
        if lod_count < 0 {
            return Err(Error::MalformedShape {
                field: "lod_count",
                value: i64::from(lod_count),
                offset,
            });
        }

        let offset = reader.position();
        let aux_scalar_count = reader.read_i32()?;
        if aux_scalar_count < 0 {
            return Err(Error::MalformedShape {
                field: "aux_scalar_count",
                value: i64::from(aux_scalar_count),
                offset,
            });
        }

        let mut unknown_tail = [0u32; 8];
        for value in &mut unknown_tail {
            *value = reader.read_u32()?;
        }

        Ok(Self {
            unknown_floats,
            unknown_head,
            lod_count,
            aux_scalar_count,
            unknown_tail,
        })
    }

    /// Describe every opaque field as `name=value` lines.
    pub fn describe_unknowns(&self) -> Vec<String> {
        let floats = self
            .unknown_floats
            .iter()
            .enumerate()
            .map(|(i, v)| format!("header.unknown{i}={v}"));
        let head = self
            .unknown_head
            .iter()
            .enumerate()
            .map(|(i, v)| format!("header.unknown{}={v}", i + 4));
        let tail = self
            .unknown_tail
            .iter()
            .enumerate()
            .map(|(i, v)| format!("header.unknown{}={v}", i + 9));

        floats.chain(head).chain(tail).collect()
    }
}
