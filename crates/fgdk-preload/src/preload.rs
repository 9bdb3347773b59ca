//! Preload catalog parsing.
//!
//! `PRELOAD.DAT` holds a small fixed header followed by a tree of tagged
//! nodes. Leaves are overlays; inner nodes are groups of children. The tree
//! has no size fields beyond the per-group child count, so the only way to
//! find every overlay is to decode the whole thing front to back.
//!
//! # Layout
//!
//! ```text
//! u8                      unknown0
//! u8                      unknown1
//! u16[asset_type_count]   total asset counts
//! u8                      unknown3
//! group                   root (child count byte, then children, no tag)
//!
//! node    := u8 tag, then overlay (tag 0) | group (tag 1 or 2)
//! group   := u8 child count, node[count]
//! overlay := u8 id, asset_group[asset_type_count] x 4
//! asset_group := u16 element count, u16 aux count, (u16, u16)[aux count]
//! ```

use std::collections::VecDeque;

use fgdk_common::{BinaryReader, Endian};

use crate::{Error, Result};

/// Number of asset-group arrays carried by every overlay.
pub const SEGMENT_KIND_COUNT: usize = 4;

/// Deepest group nesting accepted before the catalog is rejected.
pub const MAX_NESTING_DEPTH: usize = 64;

const TAG_OVERLAY: u8 = 0;
const TAG_GROUP_1: u8 = 1;
const TAG_GROUP_2: u8 = 2;

/// Auxiliary record attached to an asset group. Meaning unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AuxRecord {
    pub unknown0: u16,
    pub unknown1: u16,
}

/// Per-asset-type descriptor inside an overlay segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AssetGroup {
    /// Number of assets of this type in the segment. Zero means absent.
    pub element_count: u16,
    /// Opaque auxiliary records.
    pub aux_records: Vec<AuxRecord>,
}

impl AssetGroup {
    /// Check whether the segment holds no assets of this type.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.element_count == 0
    }

    fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let element_count = reader.read_u16()?;
        let aux_count = reader.read_u16()?;

        let mut aux_records = Vec::with_capacity(aux_count as usize);
        for _ in 0..aux_count {
            aux_records.push(AuxRecord {
                unknown0: reader.read_u16()?,
                unknown1: reader.read_u16()?,
            });
        }

        Ok(Self {
            element_count,
            aux_records,
        })
    }
}

/// The four overlay segment kinds, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// `<id>.ovl`
    Base,
    /// `<id>d0.ovl`
    D0,
    /// `<id>l<n>.ovl`, one per localization.
    Localized,
    /// `<id>d0l<n>.ovl`, one per localization.
    D0Localized,
}

impl SegmentKind {
    /// All segment kinds in the order their asset groups are stored.
    pub const ALL: [SegmentKind; SEGMENT_KIND_COUNT] = [
        SegmentKind::Base,
        SegmentKind::D0,
        SegmentKind::Localized,
        SegmentKind::D0Localized,
    ];

    /// Whether one file exists per localization.
    pub const fn is_localized(self) -> bool {
        matches!(self, SegmentKind::Localized | SegmentKind::D0Localized)
    }

    /// Segment base name (without `.ovl`) for an overlay.
    ///
    /// `localization` is ignored for unlocalized kinds.
    pub fn name(self, overlay_id: u8, localization: usize) -> String {
        match self {
            SegmentKind::Base => format!("{overlay_id}"),
            SegmentKind::D0 => format!("{overlay_id}d0"),
            SegmentKind::Localized => format!("{overlay_id}l{localization}"),
            SegmentKind::D0Localized => format!("{overlay_id}d0l{localization}"),
        }
    }
}

/// A named overlay segment and the asset groups that describe its payload.
#[derive(Debug, Clone)]
pub struct OverlaySegment<'a> {
    /// Segment base name, e.g. `12d0l3`.
    pub name: String,
    pub kind: SegmentKind,
    pub groups: &'a [AssetGroup],
}

impl OverlaySegment<'_> {
    /// File name of the segment payload.
    pub fn file_name(&self) -> String {
        format!("{}.ovl", self.name)
    }

    /// Whether any asset type has a nonzero element count.
    pub fn has_assets(&self) -> bool {
        self.groups.iter().any(|g| !g.is_empty())
    }
}

/// An overlay leaf of the catalog tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Overlay {
    pub id: u8,
    /// Asset groups per segment kind, each `asset_type_count` long.
    pub asset_groups: [Vec<AssetGroup>; SEGMENT_KIND_COUNT],
}

impl Overlay {
    fn read(reader: &mut BinaryReader<'_>, asset_type_count: usize) -> Result<Self> {
        let id = reader.read_u8()?;

        let mut read_array = || -> Result<Vec<AssetGroup>> {
            (0..asset_type_count)
                .map(|_| AssetGroup::read(reader))
                .collect()
        };
        let asset_groups = [read_array()?, read_array()?, read_array()?, read_array()?];

        Ok(Self { id, asset_groups })
    }

    /// Asset groups for one segment kind.
    pub fn groups(&self, kind: SegmentKind) -> &[AssetGroup] {
        let index = match kind {
            SegmentKind::Base => 0,
            SegmentKind::D0 => 1,
            SegmentKind::Localized => 2,
            SegmentKind::D0Localized => 3,
        };
        &self.asset_groups[index]
    }

    /// Enumerate every segment file this overlay may have.
    ///
    /// Localized kinds expand to `localization_count` segments that share the
    /// same asset groups.
    pub fn segments(&self, localization_count: usize) -> Vec<OverlaySegment<'_>> {
        let mut segments = Vec::with_capacity(2 + 2 * localization_count);

        for kind in SegmentKind::ALL {
            let copies = if kind.is_localized() {
                localization_count
            } else {
                1
            };
            for localization in 0..copies {
                segments.push(OverlaySegment {
                    name: kind.name(self.id, localization),
                    kind,
                    groups: self.groups(kind),
                });
            }
        }

        segments
    }
}

/// Group node flavor. Both share one layout; what distinguishes them is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum GroupKind {
    /// Tag 1.
    Tag1,
    /// Tag 2. The catalog root is always of this kind.
    Tag2,
}

/// A node of the catalog tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ArchiveNode {
    Overlay(Overlay),
    Group {
        kind: GroupKind,
        children: Vec<ArchiveNode>,
    },
}

impl ArchiveNode {
    /// Read a tagged node (and everything below it).
    pub fn read(reader: &mut BinaryReader<'_>, asset_type_count: usize) -> Result<Self> {
        Self::read_node(reader, asset_type_count, 0)
    }

    fn read_node(
        reader: &mut BinaryReader<'_>,
        asset_type_count: usize,
        depth: usize,
    ) -> Result<Self> {
        let offset = reader.position();
        let tag = reader.read_u8()?;

        match tag {
            TAG_OVERLAY => Ok(ArchiveNode::Overlay(Overlay::read(reader, asset_type_count)?)),
            TAG_GROUP_1 => Self::read_group(reader, GroupKind::Tag1, asset_type_count, depth),
            TAG_GROUP_2 => Self::read_group(reader, GroupKind::Tag2, asset_type_count, depth),
            _ => Err(Error::NotSupported { tag, offset }),
        }
    }

    fn read_group(
        reader: &mut BinaryReader<'_>,
        kind: GroupKind,
        asset_type_count: usize,
        depth: usize,
    ) -> Result<Self> {
        if depth >= MAX_NESTING_DEPTH {
            return Err(Error::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
                offset: reader.position(),
            });
        }

        let child_count = reader.read_u8()?;
        let mut children = Vec::with_capacity(child_count as usize);
        for _ in 0..child_count {
            children.push(Self::read_node(reader, asset_type_count, depth + 1)?);
        }

        Ok(ArchiveNode::Group { kind, children })
    }

    /// Collect every overlay leaf with a breadth-first walk.
    pub fn overlays(&self) -> Vec<&Overlay> {
        let mut overlays = Vec::new();
        let mut queue = VecDeque::from([self]);

        while let Some(node) = queue.pop_front() {
            match node {
                ArchiveNode::Overlay(overlay) => overlays.push(overlay),
                ArchiveNode::Group { children, .. } => queue.extend(children),
            }
        }

        overlays
    }
}

/// Parsed `PRELOAD.DAT`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PreloadFile {
    pub unknown0: u8,
    pub unknown1: u8,
    /// Total number of assets per asset type across the game.
    pub total_asset_counts: Vec<u16>,
    pub unknown3: u8,
    pub root: ArchiveNode,
}

impl PreloadFile {
    /// Parse a preload catalog.
    ///
    /// `asset_type_count` depends on the game and is not stored in the file.
    pub fn parse(data: &[u8], asset_type_count: usize, endian: Endian) -> Result<Self> {
        let mut reader = BinaryReader::with_endian(data, endian);
        Self::read(&mut reader, asset_type_count)
    }

    /// Read a preload catalog from a reader positioned at its start.
    pub fn read(reader: &mut BinaryReader<'_>, asset_type_count: usize) -> Result<Self> {
        let unknown0 = reader.read_u8()?;
        let unknown1 = reader.read_u8()?;
        let total_asset_counts = reader.read_u16_vec(asset_type_count)?;
        let unknown3 = reader.read_u8()?;
        let root = ArchiveNode::read_group(reader, GroupKind::Tag2, asset_type_count, 0)?;

        tracing::debug!(
            "Parsed preload catalog: {} bytes consumed, {} trailing",
            reader.position(),
            reader.remaining()
        );

        Ok(Self {
            unknown0,
            unknown1,
            total_asset_counts,
            unknown3,
            root,
        })
    }

    /// Every overlay in the catalog, breadth-first.
    pub fn overlays(&self) -> Vec<&Overlay> {
        self.root.overlays()
    }
}
