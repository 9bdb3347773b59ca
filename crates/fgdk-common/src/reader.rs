//! Binary reader for forward-only parsing of byte slices.
//!
//! This module provides [`BinaryReader`], a cursor over a borrowed byte slice.
//! Every read advances the cursor by the exact width of the field, and every
//! multi-byte value is decoded with the reader's [`Endian`].

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::{Error, Result};

/// Byte order used to decode multi-byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endian {
    /// Least significant byte first. Every archive seen so far uses this.
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

/// Character encoding for string reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextEncoding {
    /// One byte per character, mapped straight to U+0000..U+00FF. Never fails.
    #[default]
    Latin1,
    /// UTF-8, validated.
    Utf8,
}

impl TextEncoding {
    /// Decode bytes with this encoding.
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            TextEncoding::Utf8 => Ok(std::str::from_utf8(bytes)?.to_owned()),
        }
    }
}

/// Validate a count read from the stream.
///
/// Returns `None` when `raw` is negative or when `raw` elements of at least
/// `min_element_size` bytes each could not fit in `remaining` bytes.
pub fn plausible_count(raw: i64, min_element_size: usize, remaining: usize) -> Option<usize> {
    let count = usize::try_from(raw).ok()?;
    let footprint = count.checked_mul(min_element_size)?;
    (footprint <= remaining).then_some(count)
}

/// A forward-only binary reader over a byte slice.
///
/// # Example
///
/// ```
/// use fgdk_common::{BinaryReader, Endian};
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
/// let mut reader = BinaryReader::new(&data);
/// assert_eq!(reader.read_u32().unwrap(), 0x04030201);
///
/// let mut reader = BinaryReader::with_endian(&data, Endian::Big);
/// assert_eq!(reader.read_u32().unwrap(), 0x01020304);
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
    endian: Endian,
}

impl<'a> BinaryReader<'a> {
    /// Create a little-endian reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self::with_endian(data, Endian::Little)
    }

    /// Create a reader with an explicit byte order.
    #[inline]
    pub const fn with_endian(data: &'a [u8], endian: Endian) -> Self {
        Self {
            data,
            position: 0,
            endian,
        }
    }

    /// The byte order applied to multi-byte reads.
    #[inline]
    pub const fn endian(&self) -> Endian {
        self.endian
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Get the remaining bytes as a slice.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(self.end_of_data(count));
        }
        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    /// Skip `count` bytes. Skipping past the end is an error, like a read.
    #[inline]
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count).map(|_| ())
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Read a u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_with(2, LittleEndian::read_u16, BigEndian::read_u16)
    }

    /// Read an i16.
    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_with(2, LittleEndian::read_i16, BigEndian::read_i16)
    }

    /// Read a u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_with(4, LittleEndian::read_u32, BigEndian::read_u32)
    }

    /// Read an i32.
    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_with(4, LittleEndian::read_i32, BigEndian::read_i32)
    }

    /// Read an f32.
    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_with(4, LittleEndian::read_f32, BigEndian::read_f32)
    }

    /// Read `N` consecutive f32 values.
    pub fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N]> {
        let mut values = [0.0; N];
        for value in &mut values {
            *value = self.read_f32()?;
        }
        Ok(values)
    }

    /// Read `count` u16 values.
    ///
    /// The whole run is bounds-checked before anything is allocated.
    pub fn read_u16_vec(&mut self, count: usize) -> Result<Vec<u16>> {
        let needed = count.saturating_mul(2);
        if self.remaining() < needed {
            return Err(self.end_of_data(needed));
        }
        (0..count).map(|_| self.read_u16()).collect()
    }

    /// Read `count` u32 values.
    pub fn read_u32_vec(&mut self, count: usize) -> Result<Vec<u32>> {
        let needed = count.saturating_mul(4);
        if self.remaining() < needed {
            return Err(self.end_of_data(needed));
        }
        (0..count).map(|_| self.read_u32()).collect()
    }

    /// Read a string from a fixed-size field.
    ///
    /// With `trim_trailing_nulls` the field's trailing NUL bytes are dropped;
    /// interior NULs are kept either way.
    pub fn read_fixed_string(
        &mut self,
        length: usize,
        trim_trailing_nulls: bool,
        encoding: TextEncoding,
    ) -> Result<String> {
        let mut bytes = self.read_bytes(length)?;
        if trim_trailing_nulls {
            while let [rest @ .., 0] = bytes {
                bytes = rest;
            }
        }
        encoding.decode(bytes)
    }

    /// Read a null-terminated string, consuming the terminator.
    pub fn read_null_terminated_string(&mut self, encoding: TextEncoding) -> Result<String> {
        let start = self.position;
        let remaining = self.remaining_bytes();
        let null_pos =
            memchr::memchr(0, remaining).ok_or(Error::MissingNullTerminator(start))?;

        let value = encoding.decode(&remaining[..null_pos])?;
        self.position = start + null_pos + 1;
        Ok(value)
    }

    fn read_with<T>(
        &mut self,
        width: usize,
        little: fn(&[u8]) -> T,
        big: fn(&[u8]) -> T,
    ) -> Result<T> {
        let bytes = self.read_bytes(width)?;
        Ok(match self.endian {
            Endian::Little => little(bytes),
            Endian::Big => big(bytes),
        })
    }

    fn end_of_data(&self, needed: usize) -> Error {
        Error::UnexpectedEndOfData {
            offset: self.position,
            needed,
            available: self.remaining(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives() {
        let data = [
            0x01u8, 0x02, 0x03, 0x04, // u32: 0x04030201
            0xFF, 0xFF, // i16: -1
            0x00, 0x00, 0x80, 0x3F, // f32: 1.0
        ];
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_u32().unwrap(), 0x04030201);
        assert_eq!(reader.read_i16().unwrap(), -1);
        assert_eq!(reader.read_f32().unwrap(), 1.0);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_big_endian() {
        let data = [0x12, 0x34, 0x3F, 0x80, 0x00, 0x00];
        let mut reader = BinaryReader::with_endian(&data, Endian::Big);

        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_f32().unwrap(), 1.0);
    }

    #[test]
    fn test_eof_error() {
        let data = [0x01, 0x02];
        let mut reader = BinaryReader::new(&data);

        let err = reader.read_u32().unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedEndOfData {
                offset: 0,
                needed: 4,
                available: 2
            }
        ));
        // A failed read leaves the cursor where it was.
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_skip_past_end() {
        let data = [0u8; 3];
        let mut reader = BinaryReader::new(&data);

        reader.skip(2).unwrap();
        assert_eq!(reader.position(), 2);
        assert!(reader.skip(2).is_err());
    }

    #[test]
    fn test_read_null_terminated_string() {
        let data = b"hello\0w\xF6rld\0tail";
        let mut reader = BinaryReader::new(data);

        assert_eq!(
            reader.read_null_terminated_string(TextEncoding::Utf8).unwrap(),
            "hello"
        );
        assert_eq!(
            reader.read_null_terminated_string(TextEncoding::Latin1).unwrap(),
            "w\u{f6}rld"
        );
        assert!(matches!(
            reader.read_null_terminated_string(TextEncoding::Latin1),
            Err(Error::MissingNullTerminator(12))
        ));
    }

    #[test]
    fn test_read_fixed_string() {
        let data = b"ab\0c\0\0xy";
        let mut reader = BinaryReader::new(data);

        assert_eq!(
            reader
                .read_fixed_string(6, true, TextEncoding::Latin1)
                .unwrap(),
            "ab\0c"
        );
        assert_eq!(
            reader
                .read_fixed_string(2, false, TextEncoding::Utf8)
                .unwrap(),
            "xy"
        );
    }

    #[test]
    fn test_read_u16_vec_checks_bounds_first() {
        let data = [1, 0, 2, 0, 3];
        let mut reader = BinaryReader::new(&data);

        assert!(reader.read_u16_vec(3).is_err());
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_u16_vec(2).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_plausible_count() {
        assert_eq!(plausible_count(3, 4, 12), Some(3));
        assert_eq!(plausible_count(4, 4, 12), None);
        assert_eq!(plausible_count(-1, 4, 12), None);
        assert_eq!(plausible_count(0, 4, 0), Some(0));
        assert_eq!(plausible_count(i64::MAX, 8, usize::MAX), None);
    }
}
