//! Resource header decoding.
//!
//! Asset payloads inside an overlay segment start with a resource header: a
//! catalog of resources, each listing sub-resources by size, followed by the
//! sub-resource bytes themselves. The catalog is read completely before any
//! payload byte, so the two passes share one forward cursor.
//!
//! ```text
//! i32 resource_count_minus_one
//! resource[count]:
//!     i32 subresource_count
//!     subresource[subresource_count]:
//!         i32 data_size
//!         i32 annotation_count
//!         (u32, u32, u32)[annotation_count]
//! i32 dependency_count
//! (u32, u32)[dependency_count]
//! payload bytes for every subresource, in catalog order
//! ```

use fgdk_common::{plausible_count, BinaryReader};

use crate::{Error, Result};

/// Opaque triple attached to a sub-resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Annotation {
    pub unknown0: u32,
    pub unknown1: u32,
    pub unknown2: u32,
}

/// Opaque pair listed after the resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Dependency {
    pub unknown0: u32,
    pub unknown1: u32,
}

/// Declaration of one sub-resource.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Subresource {
    /// Payload length in bytes.
    pub data_size: i32,
    pub annotations: Vec<Annotation>,
}

/// A resource and its sub-resources.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Resource {
    pub subresources: Vec<Subresource>,
}

/// A decoded resource header with its payload blobs.
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    pub resources: Vec<Resource>,
    pub dependencies: Vec<Dependency>,
    /// `payloads[resource][subresource]` holds that sub-resource's bytes.
    payloads: Vec<Vec<Vec<u8>>>,
}

// Minimum encoded sizes, used to reject counts the buffer cannot satisfy.
const RESOURCE_MIN_SIZE: usize = 4;
const SUBRESOURCE_MIN_SIZE: usize = 8;
const ANNOTATION_SIZE: usize = 12;
const DEPENDENCY_SIZE: usize = 8;

impl ResourceCatalog {
    /// Read a resource header and its payloads.
    ///
    /// On success the reader sits immediately after the last payload byte.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        // The stored value is one less than the real count.
        let raw = reader.read_i32()?;
        let resource_count = checked_count(
            reader,
            "resource_count",
            i64::from(raw) + 1,
            RESOURCE_MIN_SIZE,
        )?;

        let mut resources = Vec::with_capacity(resource_count);
        for _ in 0..resource_count {
            resources.push(read_resource(reader)?);
        }

        let raw = reader.read_i32()?;
        let dependency_count =
            checked_count(reader, "dependency_count", i64::from(raw), DEPENDENCY_SIZE)?;
        let mut dependencies = Vec::with_capacity(dependency_count);
        for _ in 0..dependency_count {
            dependencies.push(Dependency {
                unknown0: reader.read_u32()?,
                unknown1: reader.read_u32()?,
            });
        }

        let total: i64 = resources
            .iter()
            .flat_map(|r| &r.subresources)
            .map(|s| i64::from(s.data_size))
            .sum();
        checked_count(reader, "total_data_size", total, 1)?;

        let mut payloads = Vec::with_capacity(resources.len());
        for resource in &resources {
            let mut blobs = Vec::with_capacity(resource.subresources.len());
            for subresource in &resource.subresources {
                let size = subresource.data_size as usize;
                blobs.push(reader.read_bytes(size)?.to_vec());
            }
            payloads.push(blobs);
        }

        Ok(Self {
            resources,
            dependencies,
            payloads,
        })
    }

    /// Number of resources.
    #[inline]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Payload bytes of one sub-resource.
    pub fn subresource_bytes(&self, resource: usize, subresource: usize) -> Option<&[u8]> {
        self.payloads
            .get(resource)?
            .get(subresource)
            .map(Vec::as_slice)
    }

    /// All payloads of one resource, in declaration order.
    pub fn resource_payloads(&self, resource: usize) -> Option<&[Vec<u8>]> {
        self.payloads.get(resource).map(Vec::as_slice)
    }
}

fn read_resource(reader: &mut BinaryReader<'_>) -> Result<Resource> {
    let raw = reader.read_i32()?;
    let subresource_count =
        checked_count(reader, "subresource_count", i64::from(raw), SUBRESOURCE_MIN_SIZE)?;

    let mut subresources = Vec::with_capacity(subresource_count);
    for _ in 0..subresource_count {
        let offset = reader.position();
        let data_size = reader.read_i32()?;
        if data_size < 0 {
            return Err(Error::MalformedHeader {
                field: "data_size",
                value: i64::from(data_size),
                offset,
            });
        }

        let raw = reader.read_i32()?;
        let annotation_count =
            checked_count(reader, "annotation_count", i64::from(raw), ANNOTATION_SIZE)?;
        let mut annotations = Vec::with_capacity(annotation_count);
        for _ in 0..annotation_count {
            annotations.push(Annotation {
                unknown0: reader.read_u32()?,
                unknown1: reader.read_u32()?,
                unknown2: reader.read_u32()?,
            });
        }

        subresources.push(Subresource {
            data_size,
            annotations,
        });
    }

    Ok(Resource { subresources })
}

fn checked_count(
    reader: &BinaryReader<'_>,
    field: &'static str,
    value: i64,
    min_element_size: usize,
) -> Result<usize> {
    plausible_count(value, min_element_size, reader.remaining()).ok_or(Error::MalformedHeader {
        field,
        value,
        offset: reader.position(),
    })
}
