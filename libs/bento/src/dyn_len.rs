//! Dynamic-length encoding/decoding.
//!
//! This is the length prefix in front of every node, every attribute, and
//! every embedded string or blob:
//!
//! - values up to [`MAX_INLINE`] are a single byte,
//! - otherwise a marker byte is followed by the value as a big-endian `u16`,
//!   `u32`, or `u64`, whichever is the smallest that fits.
//!
//! There is exactly one encoding written per value. The reader also accepts
//! wider-than-necessary encodings.

use std::io;

use crate::de::Read;
use crate::error::{Error, Result};

/// The largest value that is encoded as just a single byte.
pub const MAX_INLINE: u8 = 252;
/// Marker for a 2-byte length.
const MARK_U16: u8 = 253;
/// Marker for a 4-byte length.
const MARK_U32: u8 = 254;
/// Marker for an 8-byte length.
const MARK_U64: u8 = 255;

/// Gets the amount of bytes [`write`] emits for `value`.
///
/// This is always 1, 3, 5, or 9.
pub const fn encoded_len(value: u64) -> u64 {
    if value <= MAX_INLINE as u64 {
        1
    } else if value <= u16::MAX as u64 {
        3
    } else if value <= u32::MAX as u64 {
        5
    } else {
        9
    }
}

/// Writes the shortest encoding of `value`.
///
/// # Errors
///
/// Returns an error if the writer fails.
#[allow(clippy::cast_possible_truncation)]
pub fn write<W: io::Write>(mut writer: W, value: u64) -> Result<()> {
    // the casts are guarded by the range checks in the conditions
    if value <= u64::from(MAX_INLINE) {
        writer.write_all(&[value as u8])?;
    } else if let Ok(v) = u16::try_from(value) {
        writer.write_all(&[MARK_U16])?;
        writer.write_all(&v.to_be_bytes())?;
    } else if let Ok(v) = u32::try_from(value) {
        writer.write_all(&[MARK_U32])?;
        writer.write_all(&v.to_be_bytes())?;
    } else {
        writer.write_all(&[MARK_U64])?;
        writer.write_all(&value.to_be_bytes())?;
    }

    Ok(())
}

/// Reads a dynamic length.
///
/// # Errors
///
/// Returns [`Error::Truncated`] if the reader ends mid-field.
pub fn read<'de, R: Read<'de>>(mut reader: R) -> Result<u64> {
    match reader.read_u8()? {
        MARK_U16 => reader.read_u16().map(u64::from),
        MARK_U32 => reader.read_u32().map(u64::from),
        MARK_U64 => reader.read_u64(),
        b => Ok(u64::from(b)),
    }
}

/// Reads a dynamic length that must fit into a [`usize`].
///
/// # Errors
///
/// Returns [`Error::Range`] if it doesn't fit, otherwise the same as [`read`].
pub fn read_usize<'de, R: Read<'de>>(reader: R) -> Result<usize> {
    let len = read(reader)?;
    usize::try_from(len).map_err(|_| Error::range(format_args!("length {len} exceeds usize")))
}

/// Converts an in-memory length to a wire length.
pub(crate) fn from_usize(len: usize) -> u64 {
    // usize is at most 64 bits on every supported target
    len as u64
}

/// Gets the encoded size of a length-prefixed byte sequence.
pub(crate) fn prefixed_size(len: usize) -> u64 {
    let len = from_usize(len);
    encoded_len(len) + len
}

/// Writes a length-prefixed byte sequence.
pub(crate) fn write_bytes<W: io::Write>(mut writer: W, bytes: &[u8]) -> Result<()> {
    write(&mut writer, from_usize(bytes.len()))?;
    Ok(writer.write_all(bytes)?)
}

/// Writes a length-prefixed UTF-8 string.
pub(crate) fn write_str<W: io::Write>(writer: W, s: &str) -> Result<()> {
    write_bytes(writer, s.as_bytes())
}

/// Reads a length-prefixed byte sequence.
pub(crate) fn read_bytes<'de, R: Read<'de>>(mut reader: R) -> Result<Vec<u8>> {
    let len = read_usize(&mut reader)?;
    reader.read_byte_vec(len)
}

/// Reads a length-prefixed UTF-8 string.
pub(crate) fn read_string<'de, R: Read<'de>>(reader: R) -> Result<String> {
    let bytes = read_bytes(reader)?;
    String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
}
