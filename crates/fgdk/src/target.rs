//! Supported games.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::Error;

/// A game built on the FGDK engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Target {
    /// Dog's Life.
    Dogs,
    /// Wallace & Gromit in Project Zoo.
    Zoo,
}

const DOGS_ASSET_TYPES: &[&str] = &[
    "Text",
    "Texture",
    "Font",
    "Shape",
    "Sound",
    "Creature",
    "DogsTaleLand",
    "Animation",
    "Script",
    "NavGraph",
    "Music",
];

const ZOO_ASSET_TYPES: &[&str] = &["Text", "Texture", "Shape"];

impl Target {
    pub const ALL: [Target; 2] = [Target::Dogs, Target::Zoo];

    /// Short name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Target::Dogs => "dogs",
            Target::Zoo => "zoo",
        }
    }

    /// Full game title.
    pub fn title(self) -> &'static str {
        match self {
            Target::Dogs => "Dog's Life",
            Target::Zoo => "Wallace & Gromit in Project Zoo",
        }
    }

    /// Number of asset types in every asset group set.
    pub fn asset_type_count(self) -> usize {
        match self {
            Target::Dogs => 11,
            Target::Zoo => 10,
        }
    }

    /// Number of localized segments of each localized kind.
    pub fn localization_count(self) -> usize {
        match self {
            Target::Dogs => 11,
            Target::Zoo => 5,
        }
    }

    /// Name of an asset type, if known.
    pub fn asset_type_name(self, asset_type: usize) -> Option<&'static str> {
        let names = match self {
            Target::Dogs => DOGS_ASSET_TYPES,
            Target::Zoo => ZOO_ASSET_TYPES,
        };
        names.get(asset_type).copied()
    }

    /// File whose presence next to the preload catalog identifies the game.
    pub fn marker_file(self) -> &'static str {
        match self {
            Target::Dogs => "DOGS.DGF",
            Target::Zoo => "ZOO.DGF",
        }
    }

    /// Identify the game from the files in `dir`.
    pub fn detect(dir: &Path) -> Option<Target> {
        Self::ALL
            .into_iter()
            .find(|target| dir.join(target.marker_file()).is_file())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|target| target.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidTarget(s.to_string()))
    }
}
