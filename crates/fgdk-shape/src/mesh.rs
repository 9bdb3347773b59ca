//! Mesh records inside a shape LOD.
//!
//! ```text
//! i16 unknown0
//! u16 strip_count
//! u16 index_count
//! u16 vertex_count
//! u32 format_marker
//! u16 strip_lengths[strip_count]
//! u16 indices[index_count]
//! u16 padding            (only if strip_count + index_count is odd)
//! vertex[vertex_count]:
//!     f32 position[3]
//!     u8  bones[4]       (weighted only)
//!     f32 weights[4]     (weighted only)
//!     f32 normal[3]
//!     f32 uv[2]
//! ```

use fgdk_common::{plausible_count, BinaryReader};

use crate::shape::ShapeOptions;
use crate::skeleton::Skeleton;
use crate::strip::strips_to_triangles;
use crate::{Error, Result};

/// Format marker of meshes whose vertices carry bone weights.
pub const WEIGHTED_FORMAT: u32 = 0x411C;

const UNWEIGHTED_VERTEX_SIZE: usize = 32;
const WEIGHTED_VERTEX_SIZE: usize = 52;

/// Up to four bone influences on one vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexWeights {
    pub bones: [u8; 4],
    pub weights: [f32; 4],
}

impl VertexWeights {
    /// Influences with a nonzero weight, in slot order.
    ///
    /// `-0.0` counts as zero. NaN does not.
    pub fn nonzero(&self) -> impl Iterator<Item = (u8, f32)> + '_ {
        self.bones
            .iter()
            .zip(&self.weights)
            .filter(|&(_, &w)| w != 0.0)
            .map(|(&b, &w)| (b, w))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub skin: Option<VertexWeights>,
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// A triangle produced by strip decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshFace {
    pub indices: [u16; 3],
    pub weighted: bool,
}

/// One decoded mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeMesh {
    pub unknown0: i16,
    pub format_marker: u32,
    pub strip_lengths: Vec<u16>,
    pub indices: Vec<u16>,
    pub vertices: Vec<MeshVertex>,
    pub faces: Vec<MeshFace>,
}

impl ShapeMesh {
    /// Read a mesh, registering every bone its vertices reference.
    pub fn read(
        reader: &mut BinaryReader<'_>,
        skeleton: &mut Skeleton,
        options: &ShapeOptions,
    ) -> Result<Self> {
        let unknown0 = reader.read_i16()?;
        let strip_count = reader.read_u16()?;
        let index_count = reader.read_u16()?;
        let vertex_count = reader.read_u16()?;
        let format_marker = reader.read_u32()?;

        let strip_lengths = reader.read_u16_vec(usize::from(strip_count))?;
        let indices = reader.read_u16_vec(usize::from(index_count))?;

        if (usize::from(strip_count) + usize::from(index_count)) % 2 == 1 {
            reader.skip(2)?;
        }

        let weighted = format_marker == WEIGHTED_FORMAT;
        let stride = if weighted {
            WEIGHTED_VERTEX_SIZE
        } else {
            UNWEIGHTED_VERTEX_SIZE
        };
        let vertex_count = plausible_count(i64::from(vertex_count), stride, reader.remaining())
            .ok_or(Error::MalformedShape {
                field: "vertex_count",
                value: i64::from(vertex_count),
                offset: reader.position(),
            })?;

        let mut vertices = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            let position = reader.read_f32_array::<3>()?;

            let skin = if weighted {
                let mut bones = [0u8; 4];
                for bone in &mut bones {
                    *bone = reader.read_u8()?;
                }
                if options.reverse_bone_order {
                    bones.reverse();
                }
                for &bone in &bones {
                    skeleton.ensure_bone(bone);
                }
                let weights = reader.read_f32_array::<4>()?;
                Some(VertexWeights { bones, weights })
            } else {
                None
            };

            let normal = reader.read_f32_array::<3>()?;
            let uv = reader.read_f32_array::<2>()?;
            vertices.push(MeshVertex {
                position,
                skin,
                normal,
                uv,
            });
        }

        let faces = strips_to_triangles(&strip_lengths, &indices)?
            .into_iter()
            .map(|indices| MeshFace { indices, weighted })
            .collect();

        Ok(Self {
            unknown0,
            format_marker,
            strip_lengths,
            indices,
            vertices,
            faces,
        })
    }

    /// Whether vertices carry bone weights.
    #[inline]
    pub fn is_weighted(&self) -> bool {
        self.format_marker == WEIGHTED_FORMAT
    }
}
