//! Skinned shape decoder for FGDK games.
//!
//! Shapes are stored as triangle strips with optional four-bone vertex
//! weights. This crate decodes them into triangle meshes, synthesizes a joint
//! hierarchy from the bone IDs the vertices reference, and (with the
//! `collada-output` feature) writes each level of detail as a COLLADA scene.
//!
//! # Example
//!
//! ```no_run
//! use fgdk_common::BinaryReader;
//! use fgdk_shape::{ColladaExporter, Shape, ShapeHeader, ShapeOptions};
//!
//! let header_bytes = std::fs::read("shape_header.bin")?;
//! let body = std::fs::read("shape_body.bin")?;
//!
//! let header = ShapeHeader::parse(&header_bytes, Default::default())?;
//! let shape = Shape::read(header, &mut BinaryReader::new(&body), &ShapeOptions::default())?;
//!
//! for (lod, context) in shape.lods.iter().enumerate() {
//!     let document = ColladaExporter::new(context)
//!         .with_comments(shape.metadata_comments(lod))
//!         .export()?;
//!     std::fs::write(format!("shape_0_lod{lod}.dae"), document)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod header;
mod mesh;
mod shape;
mod skeleton;
mod strip;

#[cfg(feature = "collada-output")]
mod collada;

pub use error::{Error, Result};
pub use header::{ShapeHeader, SHAPE_HEADER_SIZE};
pub use mesh::{MeshFace, MeshVertex, ShapeMesh, VertexWeights, WEIGHTED_FORMAT};
pub use shape::{Shape, ShapeOptions, SkinBuildContext};
pub use skeleton::{Joint, JointId, Skeleton, AUTO_JOINT_PREFIX, ROOT_JOINT_NAME};
pub use strip::strips_to_triangles;

#[cfg(feature = "collada-output")]
pub use collada::ColladaExporter;
