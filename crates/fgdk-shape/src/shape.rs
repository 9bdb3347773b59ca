//! Shapes and their levels of detail.
//!
//! A shape's header lives in a sub-resource blob; its body is read straight
//! from the segment stream:
//!
//! ```text
//! u32 aux_scalars[header.aux_scalar_count]
//! lod[header.lod_count]:
//!     i32 bone_list_length
//!     i32 mesh_count
//!     u32 unknown
//!     u32 bone_list[bone_list_length]
//!     mesh[mesh_count]
//! ```

use fgdk_common::{plausible_count, BinaryReader};

use crate::header::ShapeHeader;
use crate::mesh::ShapeMesh;
use crate::skeleton::Skeleton;
use crate::{Error, Result};

// Smallest possible mesh record: the fixed 12-byte prefix.
const MESH_MIN_SIZE: usize = 12;

/// Decoding knobs for shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShapeOptions {
    /// Reverse the four bone-index bytes of each weighted vertex.
    pub reverse_bone_order: bool,
}

/// Everything decoded for one LOD.
#[derive(Debug, Clone)]
pub struct SkinBuildContext {
    pub unknown: u32,
    pub bone_list: Vec<u32>,
    pub meshes: Vec<ShapeMesh>,
    pub skeleton: Skeleton,
}

impl SkinBuildContext {
    /// Read one LOD's shape object with a fresh skeleton.
    pub fn read(reader: &mut BinaryReader<'_>, options: &ShapeOptions) -> Result<Self> {
        let offset = reader.position();
        let bone_list_length = reader.read_i32()?;
        let mesh_count = reader.read_i32()?;
        let unknown = reader.read_u32()?;

        let bone_list_length = plausible_count(i64::from(bone_list_length), 4, reader.remaining())
            .ok_or(Error::MalformedShape {
                field: "bone_list_length",
                value: i64::from(bone_list_length),
                offset,
            })?;
        let bone_list = reader.read_u32_vec(bone_list_length)?;

        let mesh_count = plausible_count(i64::from(mesh_count), MESH_MIN_SIZE, reader.remaining())
            .ok_or(Error::MalformedShape {
                field: "mesh_count",
                value: i64::from(mesh_count),
                offset: offset + 4,
            })?;

        let mut skeleton = Skeleton::new();
        let mut meshes = Vec::with_capacity(mesh_count);
        for _ in 0..mesh_count {
            meshes.push(ShapeMesh::read(reader, &mut skeleton, options)?);
        }

        Ok(Self {
            unknown,
            bone_list,
            meshes,
            skeleton,
        })
    }

    /// Describe the opaque fields of this LOD as `name=value` lines.
    pub fn describe_unknowns(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(1 + self.bone_list.len() + 2 * self.meshes.len());
        lines.push(format!("object.unknown={}", self.unknown));
        for (i, value) in self.bone_list.iter().enumerate() {
            lines.push(format!("object.bone_list[{i}]={value}"));
        }
        for (i, mesh) in self.meshes.iter().enumerate() {
            lines.push(format!("m{i}.unknown0={}", mesh.unknown0));
            lines.push(format!("m{i}.format=0x{:X}", mesh.format_marker));
        }
        lines
    }
}

/// A fully decoded shape.
#[derive(Debug, Clone)]
pub struct Shape {
    pub header: ShapeHeader,
    pub aux_scalars: Vec<u32>,
    pub lods: Vec<SkinBuildContext>,
}

impl Shape {
    /// Read a shape body described by `header`.
    ///
    /// A failure inside a LOD is reported as [`Error::Lod`] and discards the
    /// whole shape.
    pub fn read(
        header: ShapeHeader,
        reader: &mut BinaryReader<'_>,
        options: &ShapeOptions,
    ) -> Result<Self> {
        let aux_count = plausible_count(
            i64::from(header.aux_scalar_count),
            4,
            reader.remaining(),
        )
        .ok_or(Error::MalformedShape {
            field: "aux_scalar_count",
            value: i64::from(header.aux_scalar_count),
            offset: reader.position(),
        })?;
        let aux_scalars = reader.read_u32_vec(aux_count)?;

        let lod_count = usize::try_from(header.lod_count).unwrap_or(0);
        let mut lods = Vec::with_capacity(lod_count.min(16));
        for lod in 0..lod_count {
            let context = SkinBuildContext::read(reader, options).map_err(|e| Error::Lod {
                lod,
                source: Box::new(e),
            })?;
            tracing::trace!(
                lod,
                meshes = context.meshes.len(),
                bones = context.skeleton.bone_count(),
                "decoded shape LOD"
            );
            lods.push(context);
        }

        Ok(Self {
            header,
            aux_scalars,
            lods,
        })
    }

    /// Comment lines describing every opaque field that applies to `lod`.
    pub fn metadata_comments(&self, lod: usize) -> Vec<String> {
        let mut lines = self.header.describe_unknowns();
        lines.extend(
            self.aux_scalars
                .iter()
                .enumerate()
                .map(|(i, v)| format!("aux[{i}]={v}")),
        );
        if let Some(context) = self.lods.get(lod) {
            lines.extend(context.describe_unknowns());
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tests::{quad_mesh, MeshBytes};
    use crate::mesh::WEIGHTED_FORMAT;

    fn object_prefix(bone_list: &[u32], mesh_count: i32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&(bone_list.len() as i32).to_le_bytes());
        data.extend_from_slice(&mesh_count.to_le_bytes());
        data.extend_from_slice(&0xABCDu32.to_le_bytes());
        for v in bone_list {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data
    }

    fn header(lod_count: i32, aux_scalar_count: i32) -> ShapeHeader {
        ShapeHeader {
            unknown_floats: [0.0; 4],
            unknown_head: [0; 3],
            lod_count,
            aux_scalar_count,
            unknown_tail: [0; 8],
        }
    }

    #[test]
    fn test_two_lods_have_independent_skeletons() {
        let mut data = Vec::new();
        data.extend_from_slice(&77u32.to_le_bytes()); // aux scalar

        data.extend(object_prefix(&[5, 6], 1));
        data.extend(
            MeshBytes::default()
                .header(&[3], &[0, 1, 2], 1, WEIGHTED_FORMAT)
                .vertex([0.0; 3], Some(([3, 0, 0, 0], [1.0, 0.0, 0.0, 0.0])))
                .bytes,
        );

        data.extend(object_prefix(&[], 1));
        data.extend(quad_mesh().bytes);

        let mut reader = BinaryReader::new(&data);
        let shape = Shape::read(header(2, 1), &mut reader, &ShapeOptions::default()).unwrap();

        assert!(reader.is_empty());
        assert_eq!(shape.aux_scalars, vec![77]);
        assert_eq!(shape.lods.len(), 2);
        assert_eq!(shape.lods[0].bone_list, vec![5, 6]);
        assert_eq!(shape.lods[0].skeleton.bone_count(), 2);
        assert_eq!(shape.lods[1].skeleton.bone_count(), 1);
        assert_eq!(shape.lods[1].meshes[0].faces.len(), 2);

        let comments = shape.metadata_comments(0);
        assert!(comments.contains(&"aux[0]=77".to_string()));
        assert!(comments.contains(&"object.unknown=43981".to_string()));
        assert!(comments.contains(&"object.bone_list[1]=6".to_string()));
        assert!(comments.contains(&"m0.format=0x411C".to_string()));
    }

    #[test]
    fn test_lod_failure_names_the_lod() {
        let mut data = object_prefix(&[], 1);
        data.extend(quad_mesh().bytes);
        data.extend(object_prefix(&[], 1));
        // second LOD's mesh strip overruns its indices
        data.extend(MeshBytes::default().header(&[5], &[0, 1, 2], 0, 0).bytes);

        let result = Shape::read(
            header(2, 0),
            &mut BinaryReader::new(&data),
            &ShapeOptions::default(),
        );
        match result {
            Err(Error::Lod { lod, source }) => {
                assert_eq!(lod, 1);
                assert!(matches!(
                    *source,
                    Error::MalformedShape {
                        field: "strip_length",
                        ..
                    }
                ));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_negative_mesh_count() {
        let data = object_prefix(&[], -1);
        let result = SkinBuildContext::read(&mut BinaryReader::new(&data), &ShapeOptions::default());
        assert!(matches!(
            result,
            Err(Error::MalformedShape {
                field: "mesh_count",
                value: -1,
                offset: 4
            })
        ));
    }
}
