//! Exposes a specialized reader trait.

use std::io;

use crate::error::{Error, Result};

macro_rules! read_be {
    ($($(#[$attr:meta])* $name:ident -> $Ty:ty;)*) => { $(
        $(#[$attr])*
        #[inline]
        fn $name(&mut self) -> Result<$Ty> {
            self.read_bytes().map(<$Ty>::from_be_bytes)
        }
    )* };
}

/// Specialized reader trait used by the binary decoder and the
/// [`CallbackReader`](crate::callback::CallbackReader).
///
/// By default, this is implemented for [`SliceRead`], [`IoRead`] and mutable
/// references to [`Read`] implementations.
///
/// This trait also allows access to borrowed data if supported at runtime.
/// `'de` represents that borrowed lifetime and is otherwise unused.
///
/// All multi-byte integers are read big-endian.
pub trait Read<'de> {
    /// Reads a constant size chunk of bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] if the reader ends early.
    fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N]>;

    /// Reads a chunk of bytes, returning it as a newly allocated [`Vec`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] if the reader ends early.
    fn read_byte_vec(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Advances past `len` bytes without interpreting them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] if the reader ends early.
    fn skip(&mut self, len: u64) -> Result<()>;

    /// The number of bytes consumed so far.
    fn position(&self) -> u64;

    /// Attempts to read a chunk of bytes, borrowing from the reader.
    ///
    /// If the reader supports borrowing data from it, returns [`Some`] with the
    /// result of the operation. If the reader does not support it, returns
    /// [`None`] without advancing.
    ///
    /// If [`None`] was returned, calling another reader method with the same
    /// `len` must have the same result as if this method was never called.
    fn try_read_bytes_borrow(&mut self, len: usize) -> Option<Result<&'de [u8]>> {
        _ = len;
        None
    }

    /// Reads a single byte.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] if the reader ends early.
    #[inline]
    fn read_u8(&mut self) -> Result<u8> {
        let [b] = self.read_bytes()?;
        Ok(b)
    }

    /// Reads a single byte that must be 0 or 1.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBool`] for any other byte value.
    #[inline]
    fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(Error::InvalidBool),
        }
    }

    read_be! {
        /// Reads a big-endian [`i8`].
        read_i8 -> i8;
        /// Reads a big-endian [`i16`].
        read_i16 -> i16;
        /// Reads a big-endian [`i32`].
        read_i32 -> i32;
        /// Reads a big-endian [`i64`].
        read_i64 -> i64;
        /// Reads a big-endian [`u16`].
        read_u16 -> u16;
        /// Reads a big-endian [`u32`].
        read_u32 -> u32;
        /// Reads a big-endian [`u64`].
        read_u64 -> u64;
        /// Reads a big-endian [`f32`].
        read_f32 -> f32;
        /// Reads a big-endian [`f64`].
        read_f64 -> f64;
    }
}

// this implementation is required so the reader can be reborrowed
impl<'de, R: Read<'de>> Read<'de> for &mut R {
    fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        (**self).read_bytes()
    }

    fn read_byte_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        (**self).read_byte_vec(len)
    }

    fn skip(&mut self, len: u64) -> Result<()> {
        (**self).skip(len)
    }

    fn position(&self) -> u64 {
        (**self).position()
    }

    fn try_read_bytes_borrow(&mut self, len: usize) -> Option<Result<&'de [u8]>> {
        (**self).try_read_bytes_borrow(len)
    }
}

/// Wraps a slice so it can be used as a [`Read`].
#[derive(Debug, Clone)]
pub struct SliceRead<'de> {
    slice: &'de [u8],
    pos: u64,
}

impl<'de> SliceRead<'de> {
    /// Creates a reader over the slice.
    pub fn new(slice: &'de [u8]) -> Self {
        Self { slice, pos: 0 }
    }

    /// Gets the remaining unread part of the slice.
    pub fn remainder(&self) -> &'de [u8] {
        self.slice
    }

    #[inline]
    fn read_bytes_borrow(&mut self, len: usize) -> Result<&'de [u8]> {
        let (out, rem) = self
            .slice
            .split_at_checked(len)
            .ok_or(Error::Truncated)?;
        self.slice = rem;
        self.pos += len as u64;
        Ok(out)
    }
}

impl<'de> Read<'de> for SliceRead<'de> {
    fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let (out, rem) = self
            .slice
            .split_first_chunk::<N>()
            .ok_or(Error::Truncated)?;
        self.slice = rem;
        self.pos += N as u64;
        Ok(*out)
    }

    fn read_byte_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        self.read_bytes_borrow(len).map(<[u8]>::to_vec)
    }

    fn skip(&mut self, len: u64) -> Result<()> {
        let len = usize::try_from(len).map_err(|_| Error::Truncated)?;
        self.read_bytes_borrow(len).map(drop)
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn try_read_bytes_borrow(&mut self, len: usize) -> Option<Result<&'de [u8]>> {
        Some(self.read_bytes_borrow(len))
    }
}

/// Wraps a [`io::Read`] implementation so it can be used as a [`Read`].
#[derive(Debug)]
pub struct IoRead<R> {
    inner: R,
    pos: u64,
}

impl<R> IoRead<R> {
    /// Creates a reader over the [`io::Read`].
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    /// Unwraps the reader into its inner [`io::Read`].
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: io::Read> Read<'_> for IoRead<R> {
    fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        self.pos += N as u64;
        Ok(buf)
    }

    #[inline(never)]
    fn read_byte_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        use std::io::Read as _;

        // don't allocate too much or incorrect data could lead to a DoS
        let capacity = len.min(0x1000);
        let mut buf = Vec::with_capacity(capacity);
        let limit = u64::try_from(len).map_err(|_| Error::Truncated)?;
        self.inner.by_ref().take(limit).read_to_end(&mut buf)?;
        self.pos += buf.len() as u64;

        if buf.len() == len {
            Ok(buf)
        } else {
            Err(Error::Truncated)
        }
    }

    fn skip(&mut self, len: u64) -> Result<()> {
        use std::io::Read as _;

        let copied = io::copy(&mut self.inner.by_ref().take(len), &mut io::sink())?;
        self.pos += copied;

        if copied == len {
            Ok(())
        } else {
            Err(Error::Truncated)
        }
    }

    fn position(&self) -> u64 {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_reads_big_endian() {
        let mut r = SliceRead::new(&[0x01, 0x02, 0xFF, 0xFF, 0xFF, 0xFE, 7]);
        assert_eq!(r.read_u16().expect("enough data"), 0x0102, "u16 must be big-endian");
        assert_eq!(r.read_i32().expect("enough data"), -2, "i32 must be big-endian");
        assert_eq!(r.position(), 6, "position must track reads");
        assert!(matches!(r.read_u16(), Err(Error::Truncated)), "must be truncated");
    }

    #[test]
    fn io_skip_and_truncation() {
        let data = [1u8, 2, 3, 4, 5];
        let mut r = IoRead::new(&data[..]);
        r.skip(3).expect("enough data to skip");
        assert_eq!(r.read_u8().expect("enough data"), 4, "skip must advance");
        assert!(matches!(r.skip(5), Err(Error::Truncated)), "must be truncated");
        assert!(
            matches!(r.read_byte_vec(1), Err(Error::Truncated)),
            "reading past the end must be truncated"
        );
    }

    #[test]
    fn bool_must_be_zero_or_one() {
        let mut r = SliceRead::new(&[0, 1, 2]);
        assert!(!r.read_bool().expect("valid bool"), "0 is false");
        assert!(r.read_bool().expect("valid bool"), "1 is true");
        assert!(matches!(r.read_bool(), Err(Error::InvalidBool)), "2 is invalid");
    }
}
