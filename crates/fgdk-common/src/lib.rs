//! Common utilities for FGDK asset decoding.
//!
//! This crate provides the foundation shared by every FGDK format crate:
//!
//! - [`BinaryReader`] - Forward-only, endian-aware reading from byte slices
//! - [`Endian`] - Byte order applied uniformly by a reader
//! - [`TextEncoding`] - Character encodings for fixed and null-terminated strings
//! - [`plausible_count`] - Rejects counts the remaining buffer cannot hold

mod error;
mod reader;

pub use error::{Error, Result};
pub use reader::{plausible_count, BinaryReader, Endian, TextEncoding};
