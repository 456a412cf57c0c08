//! The kind registry: 4-byte wire tags and the known value kinds.

use std::fmt;

/// A 4-byte kind tag, as stored on the wire in front of every attribute.
///
/// Tags shorter than 4 bytes are padded with trailing spaces.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag([u8; 4]);

impl Tag {
    /// Creates a tag from its raw wire bytes.
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Creates a tag from a string of 1 to 4 ASCII characters, padding it with
    /// spaces.
    ///
    /// Returns [`None`] if the string is empty, too long, or not ASCII.
    pub fn new(code: &str) -> Option<Self> {
        if code.is_empty() || code.len() > 4 || !code.is_ascii() {
            return None;
        }

        let mut bytes = [b' '; 4];
        bytes[..code.len()].copy_from_slice(code.as_bytes());
        Some(Self(bytes))
    }

    /// Gets the raw wire bytes.
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Gets the known kind for this tag, if there is one.
    pub fn kind(self) -> Option<Kind> {
        Kind::from_tag(self)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the padding isn't part of the code as a user would write it
        let trimmed = self.0.trim_ascii_end();
        for &b in trimmed {
            if b == b'\\' {
                f.write_str("\\\\")?;
            } else if b.is_ascii_graphic() || b == b' ' {
                fmt::Write::write_char(f, char::from(b))?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag(\"{self}\")")
    }
}

macro_rules! define_kinds {
    ($($(#[$attr:meta])* $Var:ident => $tag:literal,)*) => {
        /// A value kind known to this crate.
        ///
        /// Any tag not listed here decodes to [`Value::Unknown`](crate::Value::Unknown).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[non_exhaustive]
        pub enum Kind {
            $( $(#[$attr])* $Var, )*
        }

        impl Kind {
            /// Every known kind, in registry order.
            pub const ALL: &'static [Self] = &[$(Self::$Var),*];

            /// Gets the wire tag of this kind.
            pub const fn tag(self) -> Tag {
                match self {
                    $( Self::$Var => Tag(*$tag), )*
                }
            }

            /// Looks up the kind for a wire tag.
            pub fn from_tag(tag: Tag) -> Option<Self> {
                match &tag.0 {
                    $( $tag => Some(Self::$Var), )*
                    _ => None,
                }
            }
        }
    };
}

define_kinds! {
    /// [`i8`]
    I8 => b"vs08",
    /// [`i16`]
    I16 => b"vs16",
    /// [`i32`]
    I32 => b"vs32",
    /// [`i64`]
    I64 => b"vs64",
    /// [`u8`]
    U8 => b"vu08",
    /// [`u16`]
    U16 => b"vu16",
    /// [`u32`]
    U32 => b"vu32",
    /// [`u64`]
    U64 => b"vu64",
    /// [`bool`]
    Bool => b"bool",
    /// [`char`]
    Char => b"char",
    /// [`f32`]
    F32 => b"fl32",
    /// [`f64`]
    F64 => b"fl64",
    /// UTF-8 string.
    Str => b"strg",
    /// String with a text-encoding label.
    TaggedStr => b"tstr",
    /// Signed duration.
    Duration => b"dura",
    /// Point in time.
    Instant => b"inst",
    /// Integer point.
    Point => b"pnti",
    /// Floating point point.
    PointF => b"pntf",
    /// Integer size.
    Size => b"sizi",
    /// Integer rectangle.
    Rect => b"rcti",
    /// RGBA color.
    Color => b"colr",
    /// Opaque bytes.
    Blob => b"blob",
    /// Array of [`i16`].
    I16Array => b"as16",
    /// Array of [`i32`].
    I32Array => b"as32",
    /// Array of [`i64`].
    I64Array => b"as64",
    /// Array of [`u32`].
    U32Array => b"au32",
    /// Array of [`u64`].
    U64Array => b"au64",
    /// Array of [`f64`].
    F64Array => b"af64",
    /// Array of [`bool`].
    BoolArray => b"abol",
    /// Array of strings.
    StrArray => b"astr",
    /// Array of durations.
    DurationArray => b"adur",
    /// Array of instants.
    InstantArray => b"atim",
}

impl Kind {
    /// Whether the text format omits the `(type)` tag for this kind.
    ///
    /// The parser infers exactly these kinds when no tag is present.
    pub const fn is_inferred(self) -> bool {
        matches!(self, Self::Str | Self::Bool | Self::I32)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.tag(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for &kind in Kind::ALL {
            assert_eq!(Kind::from_tag(kind.tag()), Some(kind), "tag must map back to {kind:?}");
        }
    }

    #[test]
    fn tags_are_unique() {
        for (i, a) in Kind::ALL.iter().enumerate() {
            for b in &Kind::ALL[i + 1..] {
                assert_ne!(a.tag(), b.tag(), "{a:?} and {b:?} share a tag");
            }
        }
    }

    #[test]
    fn short_tags_are_padded() {
        let tag = Tag::new("ab").expect("valid short tag");
        assert_eq!(tag.as_bytes(), b"ab  ", "must be space padded");
        assert_eq!(tag.to_string(), "ab", "padding is not displayed");
        assert!(Tag::new("").is_none(), "empty tag is invalid");
        assert!(Tag::new("abcde").is_none(), "long tag is invalid");
        assert_eq!(Tag::new("vs32").and_then(Tag::kind), Some(Kind::I32), "known tag");
    }

    #[test]
    fn display_escapes() {
        let control = Tag::from_bytes([1, b' ', b' ', b' ']);
        let backslash = Tag::from_bytes(*br"\x01");
        assert_eq!(control.to_string(), r"\x01", "control byte is hex escaped");
        assert_eq!(backslash.to_string(), r"\\x01", "backslash is doubled");
        assert_eq!(format!("{backslash:?}"), r#"Tag("\\x01")"#, "debug uses display");
    }
}
