//! Error handling types.
//!
//! Binary decoding, binary encoding, and text parsing all share this one
//! error type. And also a result type.

use std::io;

use crate::kind::Tag;

pub type Result<T> = std::result::Result<T, Error>;

/// Potential errors to encounter when encoding, decoding, or parsing trees.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The stream ended before a required field could be fully read.
    #[error("stream ended before the value was complete")]
    Truncated,
    /// The error originated from the [`io::Write`] or [`io::Read`]
    /// implementation.
    #[error(transparent)]
    Io(io::Error),

    /// The text format input is malformed.
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        /// The 1-based line of the offending character.
        line: u32,
        /// The 1-based column of the offending character.
        column: u32,
        /// What was wrong.
        message: String,
    },
    /// A length, count, or literal does not fit its target range.
    #[error("value out of range: {0}")]
    Range(String),

    /// A lookup by name found nothing.
    #[error("no attribute or node named `{0}`")]
    NotFound(String),
    /// An attribute exists but holds a different kind than requested.
    #[error("kind mismatch: expected `{expected}`, found `{found}`")]
    KindMismatch {
        /// The kind the caller asked for.
        expected: Tag,
        /// The kind actually stored.
        found: Tag,
    },

    /// The binary data is structurally invalid.
    #[error("invalid data: {0}")]
    InvalidData(&'static str),
    /// Tried to decode a string but it contained invalid UTF-8.
    #[error("invalid utf-8 in data for string")]
    InvalidUtf8,
    /// Tried to decode a boolean but it wasn't 0 or 1.
    #[error("invalid bool value")]
    InvalidBool,
    /// Tried to decode a character but its code was invalid.
    #[error("invalid char code")]
    InvalidChar,
    /// Past the expected end of the decoded tree were trailing bytes.
    #[error("trailing bytes past the end of the decoded node")]
    TrailingBytes,
}

// not `#[from]` since an early eof gets its own variant
impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        if value.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated
        } else {
            Self::Io(value)
        }
    }
}

impl Error {
    /// Constructs an [`Error::Range`] from anything displayable.
    pub(crate) fn range(msg: impl std::fmt::Display) -> Self {
        Self::Range(msg.to_string())
    }
}
