//! Sprite name table following the textures of an asset group.

use fgdk_common::{plausible_count, BinaryReader, TextEncoding};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    pub id: i32,
    pub name: String,
}

/// All sprites declared after a texture group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpriteTable {
    pub sprites: Vec<Sprite>,
}

impl SpriteTable {
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let offset = reader.position();
        let raw = reader.read_i32()?;
        let count = plausible_count(i64::from(raw), 8, reader.remaining()).ok_or(
            Error::MalformedTexture {
                field: "sprite_count",
                value: i64::from(raw),
                offset,
            },
        )?;

        let mut sprites = Vec::with_capacity(count);
        for _ in 0..count {
            let id = reader.read_i32()?;
            let offset = reader.position();
            let raw = reader.read_i32()?;
            let length = plausible_count(i64::from(raw), 1, reader.remaining()).ok_or(
                Error::MalformedTexture {
                    field: "sprite_name_length",
                    value: i64::from(raw),
                    offset,
                },
            )?;
            let name = reader.read_fixed_string(length, true, TextEncoding::Latin1)?;
            sprites.push(Sprite { id, name });
        }

        tracing::trace!(count, "read sprite table");
        Ok(Self { sprites })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_sprites() {
        let mut data = Vec::new();
        data.extend_from_slice(&2i32.to_le_bytes());
        data.extend_from_slice(&10i32.to_le_bytes());
        data.extend_from_slice(&4i32.to_le_bytes());
        data.extend_from_slice(b"dog\0");
        data.extend_from_slice(&11i32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.push(0xAA);

        let mut reader = BinaryReader::new(&data);
        let table = SpriteTable::read(&mut reader).unwrap();

        assert_eq!(
            table.sprites,
            vec![
                Sprite {
                    id: 10,
                    name: "dog".to_string()
                },
                Sprite {
                    id: 11,
                    name: String::new()
                },
            ]
        );
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn test_name_longer_than_buffer() {
        let mut data = Vec::new();
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&100i32.to_le_bytes());
        data.extend_from_slice(b"abc");

        let result = SpriteTable::read(&mut BinaryReader::new(&data));
        assert!(matches!(
            result,
            Err(Error::MalformedTexture {
                field: "sprite_name_length",
                value: 100,
                offset: 8
            })
        ));
    }
}
