//! Typed attribute values and their binary payload codec.

use std::io;

use time::{Duration, OffsetDateTime};

use crate::de::{Read, SliceRead};
use crate::dyn_len;
use crate::error::{Error, Result};
use crate::geom::{Color, Point, PointF, Rect, Size};
use crate::kind::{Kind, Tag};

/// A typed value held by an [`Attribute`](crate::Attribute).
///
/// There is one variant per [`Kind`], plus [`Value::Unknown`] for tags this
/// crate doesn't know. Unknown values keep their payload verbatim so that
/// they survive being decoded and encoded again.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Bool(bool),
    Char(char),
    F32(f32),
    F64(f64),
    Str(String),
    /// A string together with the name of the text encoding it came from.
    TaggedStr {
        encoding: String,
        text: String,
    },
    Duration(Duration),
    Instant(OffsetDateTime),
    Point(Point),
    PointF(PointF),
    Size(Size),
    Rect(Rect),
    Color(Color),
    Blob(Vec<u8>),
    I16Array(Vec<i16>),
    I32Array(Vec<i32>),
    I64Array(Vec<i64>),
    U32Array(Vec<u32>),
    U64Array(Vec<u64>),
    F64Array(Vec<f64>),
    BoolArray(Vec<bool>),
    StrArray(Vec<String>),
    DurationArray(Vec<Duration>),
    InstantArray(Vec<OffsetDateTime>),
    /// A value whose tag isn't known. `raw` holds the undecoded payload.
    ///
    /// `tag` must not be the tag of a known [`Kind`]. Such a value can't be
    /// encoded.
    Unknown {
        tag: Tag,
        raw: Vec<u8>,
    },
}

impl Value {
    /// Gets the known kind, or [`None`] for [`Value::Unknown`].
    pub fn kind(&self) -> Option<Kind> {
        Some(match self {
            Self::I8(_) => Kind::I8,
            Self::I16(_) => Kind::I16,
            Self::I32(_) => Kind::I32,
            Self::I64(_) => Kind::I64,
            Self::U8(_) => Kind::U8,
            Self::U16(_) => Kind::U16,
            Self::U32(_) => Kind::U32,
            Self::U64(_) => Kind::U64,
            Self::Bool(_) => Kind::Bool,
            Self::Char(_) => Kind::Char,
            Self::F32(_) => Kind::F32,
            Self::F64(_) => Kind::F64,
            Self::Str(_) => Kind::Str,
            Self::TaggedStr { .. } => Kind::TaggedStr,
            Self::Duration(_) => Kind::Duration,
            Self::Instant(_) => Kind::Instant,
            Self::Point(_) => Kind::Point,
            Self::PointF(_) => Kind::PointF,
            Self::Size(_) => Kind::Size,
            Self::Rect(_) => Kind::Rect,
            Self::Color(_) => Kind::Color,
            Self::Blob(_) => Kind::Blob,
            Self::I16Array(_) => Kind::I16Array,
            Self::I32Array(_) => Kind::I32Array,
            Self::I64Array(_) => Kind::I64Array,
            Self::U32Array(_) => Kind::U32Array,
            Self::U64Array(_) => Kind::U64Array,
            Self::F64Array(_) => Kind::F64Array,
            Self::BoolArray(_) => Kind::BoolArray,
            Self::StrArray(_) => Kind::StrArray,
            Self::DurationArray(_) => Kind::DurationArray,
            Self::InstantArray(_) => Kind::InstantArray,
            Self::Unknown { .. } => return None,
        })
    }

    /// Gets the wire tag. Unknown values report their original tag.
    pub fn tag(&self) -> Tag {
        match self {
            Self::Unknown { tag, .. } => *tag,
            _ => self.kind().map_or(Tag::from_bytes(*b"????"), Kind::tag),
        }
    }

    /// Whether `other` has the same kind tag.
    ///
    /// An unknown value is never the same kind as a known one, even if it
    /// carries that kind's tag.
    pub fn same_kind(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.tag() == other.tag()
    }

    /// Gets the exact size of the binary payload.
    pub fn payload_size(&self) -> u64 {
        use dyn_len::{from_usize, prefixed_size};

        fn array(len: usize, width: u64) -> u64 {
            4 + from_usize(len) * width
        }

        match self {
            Self::I8(_) | Self::U8(_) | Self::Bool(_) => 1,
            Self::I16(_) | Self::U16(_) => 2,
            Self::I32(_) | Self::U32(_) | Self::F32(_) | Self::Char(_) | Self::Color(_) => 4,
            Self::I64(_)
            | Self::U64(_)
            | Self::F64(_)
            | Self::Duration(_)
            | Self::Instant(_)
            | Self::Point(_)
            | Self::Size(_) => 8,
            Self::PointF(_) | Self::Rect(_) => 16,
            Self::Str(s) => prefixed_size(s.len()),
            Self::TaggedStr { encoding, text } => {
                prefixed_size(encoding.len()) + prefixed_size(text.len())
            },
            Self::Blob(b) => prefixed_size(b.len()),
            Self::I16Array(v) => array(v.len(), 2),
            Self::I32Array(v) => array(v.len(), 4),
            Self::I64Array(v) => array(v.len(), 8),
            Self::U32Array(v) => array(v.len(), 4),
            Self::U64Array(v) => array(v.len(), 8),
            Self::F64Array(v) => array(v.len(), 8),
            Self::BoolArray(v) => array(v.len(), 1),
            Self::DurationArray(v) => array(v.len(), 8),
            Self::InstantArray(v) => array(v.len(), 8),
            Self::StrArray(v) => 4 + v.iter().map(|s| prefixed_size(s.len())).sum::<u64>(),
            Self::Unknown { raw, .. } => from_usize(raw.len()),
        }
    }

    /// Writes the binary payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Range`] if an array has more than [`i32::MAX`] elements
    /// or a duration/instant does not fit 64-bit nanoseconds, and
    /// [`Error::InvalidData`] for an unknown value with a known kind's tag.
    /// Otherwise only fails if the writer fails.
    pub fn write_payload<W: io::Write>(&self, mut w: W) -> Result<()> {
        match self {
            Self::I8(v) => w.write_all(&v.to_be_bytes())?,
            Self::I16(v) => w.write_all(&v.to_be_bytes())?,
            Self::I32(v) => w.write_all(&v.to_be_bytes())?,
            Self::I64(v) => w.write_all(&v.to_be_bytes())?,
            Self::U8(v) => w.write_all(&[*v])?,
            Self::U16(v) => w.write_all(&v.to_be_bytes())?,
            Self::U32(v) => w.write_all(&v.to_be_bytes())?,
            Self::U64(v) => w.write_all(&v.to_be_bytes())?,
            Self::Bool(v) => w.write_all(&[u8::from(*v)])?,
            Self::Char(v) => w.write_all(&u32::from(*v).to_be_bytes())?,
            Self::F32(v) => w.write_all(&v.to_be_bytes())?,
            Self::F64(v) => w.write_all(&v.to_be_bytes())?,
            Self::Str(s) => dyn_len::write_str(w, s)?,
            Self::TaggedStr { encoding, text } => {
                dyn_len::write_str(&mut w, encoding)?;
                dyn_len::write_str(w, text)?;
            },
            Self::Duration(v) => w.write_all(&duration_nanos(*v)?.to_be_bytes())?,
            Self::Instant(v) => w.write_all(&instant_nanos(*v)?.to_be_bytes())?,
            Self::Point(p) => {
                w.write_all(&p.x.to_be_bytes())?;
                w.write_all(&p.y.to_be_bytes())?;
            },
            Self::PointF(p) => {
                w.write_all(&p.x.to_be_bytes())?;
                w.write_all(&p.y.to_be_bytes())?;
            },
            Self::Size(s) => {
                w.write_all(&s.width.to_be_bytes())?;
                w.write_all(&s.height.to_be_bytes())?;
            },
            Self::Rect(r) => {
                for v in [r.x, r.y, r.width, r.height] {
                    w.write_all(&v.to_be_bytes())?;
                }
            },
            Self::Color(c) => w.write_all(&c.to_array())?,
            Self::Blob(b) => dyn_len::write_bytes(w, b)?,
            Self::I16Array(v) => write_array(w, v, |w, x| Ok(w.write_all(&x.to_be_bytes())?))?,
            Self::I32Array(v) => write_array(w, v, |w, x| Ok(w.write_all(&x.to_be_bytes())?))?,
            Self::I64Array(v) => write_array(w, v, |w, x| Ok(w.write_all(&x.to_be_bytes())?))?,
            Self::U32Array(v) => write_array(w, v, |w, x| Ok(w.write_all(&x.to_be_bytes())?))?,
            Self::U64Array(v) => write_array(w, v, |w, x| Ok(w.write_all(&x.to_be_bytes())?))?,
            Self::F64Array(v) => write_array(w, v, |w, x| Ok(w.write_all(&x.to_be_bytes())?))?,
            Self::BoolArray(v) => write_array(w, v, |w, x| Ok(w.write_all(&[u8::from(*x)])?))?,
            Self::StrArray(v) => write_array(w, v, |w, x| dyn_len::write_str(w, x))?,
            Self::DurationArray(v) => write_array(w, v, |w, x| {
                Ok(w.write_all(&duration_nanos(*x)?.to_be_bytes())?)
            })?,
            Self::InstantArray(v) => write_array(w, v, |w, x| {
                Ok(w.write_all(&instant_nanos(*x)?.to_be_bytes())?)
            })?,
            Self::Unknown { tag, .. } if tag.kind().is_some() => {
                return Err(Error::InvalidData("unknown value carries a known kind tag"));
            },
            Self::Unknown { raw, .. } => w.write_all(raw)?,
        }

        Ok(())
    }

    /// Reads the binary payload of a known kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] if the reader ends early, or the relevant
    /// error if the payload is invalid for the kind.
    pub fn read_payload<'de, R: Read<'de>>(kind: Kind, mut r: R) -> Result<Self> {
        Ok(match kind {
            Kind::I8 => Self::I8(r.read_i8()?),
            Kind::I16 => Self::I16(r.read_i16()?),
            Kind::I32 => Self::I32(r.read_i32()?),
            Kind::I64 => Self::I64(r.read_i64()?),
            Kind::U8 => Self::U8(r.read_u8()?),
            Kind::U16 => Self::U16(r.read_u16()?),
            Kind::U32 => Self::U32(r.read_u32()?),
            Kind::U64 => Self::U64(r.read_u64()?),
            Kind::Bool => Self::Bool(r.read_bool()?),
            Kind::Char => Self::Char(char::from_u32(r.read_u32()?).ok_or(Error::InvalidChar)?),
            Kind::F32 => Self::F32(r.read_f32()?),
            Kind::F64 => Self::F64(r.read_f64()?),
            Kind::Str => Self::Str(dyn_len::read_string(&mut r)?),
            Kind::TaggedStr => Self::TaggedStr {
                encoding: dyn_len::read_string(&mut r)?,
                text: dyn_len::read_string(&mut r)?,
            },
            Kind::Duration => Self::Duration(Duration::nanoseconds(r.read_i64()?)),
            Kind::Instant => Self::Instant(instant_from_nanos(r.read_i64()?)?),
            Kind::Point => Self::Point(Point::new(r.read_i32()?, r.read_i32()?)),
            Kind::PointF => Self::PointF(PointF::new(r.read_f64()?, r.read_f64()?)),
            Kind::Size => Self::Size(Size::new(r.read_i32()?, r.read_i32()?)),
            Kind::Rect => Self::Rect(Rect::new(
                r.read_i32()?,
                r.read_i32()?,
                r.read_i32()?,
                r.read_i32()?,
            )),
            Kind::Color => Self::Color(Color::from_array(r.read_bytes()?)),
            Kind::Blob => Self::Blob(dyn_len::read_bytes(&mut r)?),
            Kind::I16Array => Self::I16Array(read_array(r, |r| r.read_i16())?),
            Kind::I32Array => Self::I32Array(read_array(r, |r| r.read_i32())?),
            Kind::I64Array => Self::I64Array(read_array(r, |r| r.read_i64())?),
            Kind::U32Array => Self::U32Array(read_array(r, |r| r.read_u32())?),
            Kind::U64Array => Self::U64Array(read_array(r, |r| r.read_u64())?),
            Kind::F64Array => Self::F64Array(read_array(r, |r| r.read_f64())?),
            Kind::BoolArray => Self::BoolArray(read_array(r, |r| r.read_bool())?),
            Kind::StrArray => Self::StrArray(read_array(r, |r| dyn_len::read_string(r))?),
            Kind::DurationArray => Self::DurationArray(read_array(r, |r| {
                r.read_i64().map(Duration::nanoseconds)
            })?),
            Kind::InstantArray => Self::InstantArray(read_array(r, |r| {
                r.read_i64().and_then(instant_from_nanos)
            })?),
        })
    }

    /// Decodes a payload given its tag.
    ///
    /// Unknown tags produce a [`Value::Unknown`] holding a copy of `bytes`.
    /// Bytes past the end of a known kind's payload are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not a valid payload for a known kind.
    pub fn from_payload(tag: Tag, bytes: &[u8]) -> Result<Self> {
        match tag.kind() {
            Some(kind) => {
                let mut r = SliceRead::new(bytes);
                let value = Self::read_payload(kind, &mut r)?;
                if !r.remainder().is_empty() {
                    log::debug!(
                        "ignoring {} trailing payload bytes of `{tag}` value",
                        r.remainder().len()
                    );
                }
                Ok(value)
            },
            None => Ok(Self::Unknown {
                tag,
                raw: bytes.to_vec(),
            }),
        }
    }
}

fn duration_nanos(d: Duration) -> Result<i64> {
    i64::try_from(d.whole_nanoseconds())
        .map_err(|_| Error::range(format_args!("duration {d} exceeds 64-bit nanoseconds")))
}

fn instant_nanos(t: OffsetDateTime) -> Result<i64> {
    i64::try_from(t.unix_timestamp_nanos())
        .map_err(|_| Error::range(format_args!("instant {t} exceeds 64-bit nanoseconds")))
}

fn instant_from_nanos(nanos: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos)).map_err(Error::range)
}

/// Writes an S32 element count.
pub(crate) fn write_count<W: io::Write>(mut w: W, len: usize) -> Result<()> {
    let len = i32::try_from(len)
        .map_err(|_| Error::range(format_args!("{len} elements exceed the i32 count limit")))?;
    Ok(w.write_all(&len.to_be_bytes())?)
}

/// Reads an S32 element count, rejecting negative values.
pub(crate) fn read_count<'de, R: Read<'de>>(mut r: R) -> Result<usize> {
    let len = r.read_i32()?;
    usize::try_from(len).map_err(|_| Error::InvalidData("negative element count"))
}

fn write_array<W, T, F>(mut w: W, items: &[T], mut write_one: F) -> Result<()>
where
    W: io::Write,
    F: FnMut(&mut W, &T) -> Result<()>,
{
    write_count(&mut w, items.len())?;
    for item in items {
        write_one(&mut w, item)?;
    }
    Ok(())
}

fn read_array<'de, R, T, F>(mut r: R, mut read_one: F) -> Result<Vec<T>>
where
    R: Read<'de>,
    F: FnMut(&mut R) -> Result<T>,
{
    let len = read_count(&mut r)?;

    // a corrupt count shouldn't get to reserve gigabytes up front
    let mut out = Vec::with_capacity(len.min(0x400));
    for _ in 0..len {
        out.push(read_one(&mut r)?);
    }
    Ok(out)
}

/// Extracts a typed value from a [`Value`] of the matching kind.
pub trait FromValue: Sized {
    /// The kind this type is stored as.
    const KIND: Kind;

    /// Gets the value if it has kind [`Self::KIND`].
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_value_conv {
    ($($Ty:ty => $Var:ident),* $(,)?) => { $(
        impl From<$Ty> for Value {
            fn from(value: $Ty) -> Self {
                Self::$Var(value)
            }
        }

        impl FromValue for $Ty {
            const KIND: Kind = Kind::$Var;

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$Var(v) => Some(Clone::clone(v)),
                    _ => None,
                }
            }
        }
    )* };
}

impl_value_conv!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    bool => Bool,
    char => Char,
    f32 => F32,
    f64 => F64,
    String => Str,
    Duration => Duration,
    OffsetDateTime => Instant,
    Point => Point,
    PointF => PointF,
    Size => Size,
    Rect => Rect,
    Color => Color,
    Vec<u8> => Blob,
    Vec<i16> => I16Array,
    Vec<i32> => I32Array,
    Vec<i64> => I64Array,
    Vec<u32> => U32Array,
    Vec<u64> => U64Array,
    Vec<f64> => F64Array,
    Vec<bool> => BoolArray,
    Vec<String> => StrArray,
    Vec<Duration> => DurationArray,
    Vec<OffsetDateTime> => InstantArray,
);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}
