//! Per-kind text forms of values.

use std::fmt::Write as _;
use std::num::{IntErrorKind, ParseIntError};
use std::str::FromStr;

use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use crate::error::{Error, Result};
use crate::geom::{Color, Point, PointF, Rect, Size};
use crate::kind::Kind;
use crate::value::Value;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// One comma-separated element of an attribute value, as it appeared in the
/// text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub text: String,
    pub quoted: bool,
}

/// Why an attribute value couldn't be parsed.
///
/// The parser attaches the position for syntax errors.
#[derive(Debug)]
pub(crate) enum ValueError {
    Syntax(String),
    Range(String),
}

type ValueResult<T> = std::result::Result<T, ValueError>;

fn syntax<T>(msg: impl Into<String>) -> ValueResult<T> {
    Err(ValueError::Syntax(msg.into()))
}

/// Writes `s` as a quoted string, escaping `"` and `\`.
pub(crate) fn write_quoted(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

/// Writes bytes as lowercase hex.
pub(crate) fn write_hex(out: &mut String, bytes: &[u8]) {
    for b in bytes {
        _ = write!(out, "{b:02x}");
    }
}

fn write_duration(out: &mut String, d: Duration) {
    let nanos = d.whole_nanoseconds();
    let abs = nanos.unsigned_abs();
    let sign = if nanos < 0 { "-" } else { "" };
    _ = write!(
        out,
        "{sign}{}.{:09}",
        abs / NANOS_PER_SEC,
        abs % NANOS_PER_SEC
    );
}

fn write_instant(out: &mut String, t: OffsetDateTime) -> Result<()> {
    let text = t.format(&Rfc3339).map_err(Error::range)?;
    out.push_str(&text);
    Ok(())
}

fn write_list<T>(out: &mut String, items: &[T], mut write_one: impl FnMut(&mut String, &T)) {
    for (i, item) in items.iter().enumerate() {
        if i != 0 {
            out.push(',');
        }
        write_one(out, item);
    }
}

/// Writes the text form of a value, without its type tag.
///
/// Unknown values are written as hex of their raw bytes. The text parser
/// can't read those back.
///
/// # Errors
///
/// Returns [`Error::Range`] if an instant can't be formatted as RFC 3339.
pub(crate) fn write_value(out: &mut String, value: &Value) -> Result<()> {
    match value {
        Value::I8(v) => _ = write!(out, "{v}"),
        Value::I16(v) => _ = write!(out, "{v}"),
        Value::I32(v) => _ = write!(out, "{v}"),
        Value::I64(v) => _ = write!(out, "{v}"),
        Value::U8(v) => _ = write!(out, "{v}"),
        Value::U16(v) => _ = write!(out, "{v}"),
        Value::U32(v) => _ = write!(out, "{v}"),
        Value::U64(v) => _ = write!(out, "{v}"),
        Value::Bool(v) => _ = write!(out, "{v}"),
        Value::Char(c) => write_quoted(out, c.encode_utf8(&mut [0u8; 4])),
        Value::F32(v) => _ = write!(out, "{v:.6}"),
        Value::F64(v) => _ = write!(out, "{v:.6}"),
        Value::Str(s) => write_quoted(out, s),
        Value::TaggedStr { encoding, text } => {
            write_quoted(out, encoding);
            out.push(',');
            write_quoted(out, text);
        },
        Value::Duration(d) => write_duration(out, *d),
        Value::Instant(t) => write_instant(out, *t)?,
        Value::Point(p) => _ = write!(out, "{},{}", p.x, p.y),
        Value::PointF(p) => _ = write!(out, "{:.6},{:.6}", p.x, p.y),
        Value::Size(s) => _ = write!(out, "{},{}", s.width, s.height),
        Value::Rect(r) => _ = write!(out, "{},{},{},{}", r.x, r.y, r.width, r.height),
        Value::Color(c) => {
            out.push('#');
            write_hex(out, &c.to_array());
        },
        Value::Blob(b) => write_hex(out, b),
        Value::I16Array(v) => write_list(out, v, |out, x| _ = write!(out, "{x}")),
        Value::I32Array(v) => write_list(out, v, |out, x| _ = write!(out, "{x}")),
        Value::I64Array(v) => write_list(out, v, |out, x| _ = write!(out, "{x}")),
        Value::U32Array(v) => write_list(out, v, |out, x| _ = write!(out, "{x}")),
        Value::U64Array(v) => write_list(out, v, |out, x| _ = write!(out, "{x}")),
        Value::F64Array(v) => write_list(out, v, |out, x| _ = write!(out, "{x:.6}")),
        Value::BoolArray(v) => write_list(out, v, |out, x| _ = write!(out, "{x}")),
        Value::StrArray(v) => write_list(out, v, |out, x| write_quoted(out, x)),
        Value::DurationArray(v) => write_list(out, v, |out, x| write_duration(out, *x)),
        Value::InstantArray(v) => {
            for (i, t) in v.iter().enumerate() {
                if i != 0 {
                    out.push(',');
                }
                write_instant(out, *t)?;
            }
        },
        Value::Unknown { raw, .. } => write_hex(out, raw),
    }

    Ok(())
}

/// Parses an attribute value.
///
/// With no explicit kind, a single quoted element is a string, `true` and
/// `false` are booleans, and an integer is an [`i32`].
pub(crate) fn parse_value(kind: Option<Kind>, elements: &[Element]) -> ValueResult<Value> {
    let Some(kind) = kind else {
        return infer_value(elements);
    };

    Ok(match kind {
        Kind::I8 => Value::I8(int(single_bare(elements)?)?),
        Kind::I16 => Value::I16(int(single_bare(elements)?)?),
        Kind::I32 => Value::I32(int(single_bare(elements)?)?),
        Kind::I64 => Value::I64(int(single_bare(elements)?)?),
        Kind::U8 => Value::U8(int(single_bare(elements)?)?),
        Kind::U16 => Value::U16(int(single_bare(elements)?)?),
        Kind::U32 => Value::U32(int(single_bare(elements)?)?),
        Kind::U64 => Value::U64(int(single_bare(elements)?)?),
        Kind::Bool => Value::Bool(boolean(single_bare(elements)?)?),
        Kind::Char => Value::Char(character(single_quoted(elements)?)?),
        Kind::F32 => Value::F32(float(single_bare(elements)?)?),
        Kind::F64 => Value::F64(float(single_bare(elements)?)?),
        Kind::Str => Value::Str(single_quoted(elements)?.to_owned()),
        Kind::TaggedStr => match elements {
            [encoding, text] if encoding.quoted && text.quoted => Value::TaggedStr {
                encoding: encoding.text.clone(),
                text: text.text.clone(),
            },
            _ => return syntax("expected two quoted strings: encoding and text"),
        },
        Kind::Duration => Value::Duration(duration(single_bare(elements)?)?),
        Kind::Instant => Value::Instant(instant(single_bare(elements)?)?),
        Kind::Point => {
            let [x, y] = bare_tuple(elements)?;
            Value::Point(Point::new(int(x)?, int(y)?))
        },
        Kind::PointF => {
            let [x, y] = bare_tuple(elements)?;
            Value::PointF(PointF::new(float(x)?, float(y)?))
        },
        Kind::Size => {
            let [w, h] = bare_tuple(elements)?;
            Value::Size(Size::new(int(w)?, int(h)?))
        },
        Kind::Rect => {
            let [x, y, w, h] = bare_tuple(elements)?;
            Value::Rect(Rect::new(int(x)?, int(y)?, int(w)?, int(h)?))
        },
        Kind::Color => Value::Color(color(single_bare(elements)?)?),
        Kind::Blob => Value::Blob(hex(single_bare(elements)?)?),
        Kind::I16Array => Value::I16Array(bare_list(elements, int)?),
        Kind::I32Array => Value::I32Array(bare_list(elements, int)?),
        Kind::I64Array => Value::I64Array(bare_list(elements, int)?),
        Kind::U32Array => Value::U32Array(bare_list(elements, int)?),
        Kind::U64Array => Value::U64Array(bare_list(elements, int)?),
        Kind::F64Array => Value::F64Array(bare_list(elements, float)?),
        Kind::BoolArray => Value::BoolArray(bare_list(elements, boolean)?),
        Kind::DurationArray => Value::DurationArray(bare_list(elements, duration)?),
        Kind::InstantArray => Value::InstantArray(bare_list(elements, instant)?),
        Kind::StrArray => {
            if is_empty_list(elements) {
                Value::StrArray(Vec::new())
            } else if elements.iter().all(|e| e.quoted) {
                Value::StrArray(elements.iter().map(|e| e.text.clone()).collect())
            } else {
                return syntax("string array elements must be quoted");
            }
        },
    })
}

fn infer_value(elements: &[Element]) -> ValueResult<Value> {
    let [element] = elements else {
        return syntax("a list needs an explicit `(type)` tag");
    };

    if element.quoted {
        return Ok(Value::Str(element.text.clone()));
    }

    match element.text.as_str() {
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        text if looks_like_int(text) => int(text).map(Value::I32),
        text => syntax(format!(
            "can't infer the kind of `{text}`; quote strings or add a `(type)` tag"
        )),
    }
}

fn looks_like_int(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// An empty value, as in `[name(as32)=]`.
fn is_empty_list(elements: &[Element]) -> bool {
    matches!(elements, [e] if !e.quoted && e.text.is_empty())
}

fn single_bare(elements: &[Element]) -> ValueResult<&str> {
    match elements {
        [e] if !e.quoted => Ok(&e.text),
        [_] => syntax("expected an unquoted value"),
        _ => syntax("expected a single value"),
    }
}

fn single_quoted(elements: &[Element]) -> ValueResult<&str> {
    match elements {
        [e] if e.quoted => Ok(&e.text),
        [_] => syntax("expected a quoted value"),
        _ => syntax("expected a single value"),
    }
}

fn bare_tuple<const N: usize>(elements: &[Element]) -> ValueResult<[&str; N]> {
    let parts: &[Element; N] = elements
        .try_into()
        .map_err(|_| ValueError::Syntax(format!("expected {N} comma-separated numbers")))?;

    if parts.iter().any(|e| e.quoted) {
        return syntax("numbers must not be quoted");
    }

    Ok(parts.each_ref().map(|e| e.text.as_str()))
}

fn bare_list<T>(
    elements: &[Element],
    parse_one: impl Fn(&str) -> ValueResult<T>,
) -> ValueResult<Vec<T>> {
    if is_empty_list(elements) {
        return Ok(Vec::new());
    }

    elements
        .iter()
        .map(|e| {
            if e.quoted {
                syntax("array elements of this kind must not be quoted")
            } else {
                parse_one(&e.text)
            }
        })
        .collect()
}

fn int<T>(s: &str) -> ValueResult<T>
where
    T: FromStr<Err = ParseIntError>,
{
    s.parse().map_err(|e: ParseIntError| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            ValueError::Range(format!("integer `{s}` is out of range"))
        },
        _ => ValueError::Syntax(format!("`{s}` is not an integer")),
    })
}

fn float<T: FromStr>(s: &str) -> ValueResult<T> {
    s.parse()
        .map_err(|_| ValueError::Syntax(format!("`{s}` is not a number")))
}

fn boolean(s: &str) -> ValueResult<bool> {
    match s {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => syntax(format!("`{s}` is not `true` or `false`")),
    }
}

fn character(s: &str) -> ValueResult<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => syntax("expected exactly one character"),
    }
}

fn duration(s: &str) -> ValueResult<Duration> {
    let invalid = || ValueError::Syntax(format!("`{s}` is not a duration in seconds"));

    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let (secs, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if secs.is_empty()
        || frac.len() > 9
        || !secs.bytes().all(|b| b.is_ascii_digit())
        || !frac.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let out_of_range = || ValueError::Range(format!("duration `{s}` is out of range"));
    let secs: u128 = secs.parse().map_err(|_| out_of_range())?;
    let frac: u128 = if frac.is_empty() {
        0
    } else {
        // right-pad to nanoseconds
        let digits: u128 = frac.parse().map_err(|_| invalid())?;
        let scale = 9 - u32::try_from(frac.len()).map_err(|_| invalid())?;
        digits * 10u128.pow(scale)
    };

    let abs = secs
        .checked_mul(NANOS_PER_SEC)
        .and_then(|n| n.checked_add(frac))
        .and_then(|n| i128::try_from(n).ok())
        .ok_or_else(out_of_range)?;
    let nanos = if negative { -abs } else { abs };
    let nanos = i64::try_from(nanos).map_err(|_| out_of_range())?;
    Ok(Duration::nanoseconds(nanos))
}

fn instant(s: &str) -> ValueResult<OffsetDateTime> {
    OffsetDateTime::parse(s, &Rfc3339)
        .map_err(|e| ValueError::Syntax(format!("`{s}` is not an RFC 3339 timestamp: {e}")))
}

fn hex(s: &str) -> ValueResult<Vec<u8>> {
    if !s.is_ascii() || s.len() % 2 != 0 {
        return syntax(format!("`{s}` is not an even number of hex digits"));
    }

    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|_| ValueError::Syntax(format!("`{s}` is not hex")))
        })
        .collect()
}

fn color(s: &str) -> ValueResult<Color> {
    let Some(digits) = s.strip_prefix('#') else {
        return syntax(format!("color `{s}` must start with `#`"));
    };

    match *hex(digits)?.as_slice() {
        [r, g, b, a] => Ok(Color::rgba(r, g, b, a)),
        [r, g, b] => Ok(Color::rgb(r, g, b)),
        _ => syntax(format!("color `{s}` must be `#rrggbb` or `#rrggbbaa`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare(text: &str) -> Element {
        Element {
            text: text.to_owned(),
            quoted: false,
        }
    }

    fn quoted(text: &str) -> Element {
        Element {
            text: text.to_owned(),
            quoted: true,
        }
    }

    fn text_of(value: &Value) -> String {
        let mut out = String::new();
        write_value(&mut out, value).expect("value must format");
        out
    }

    #[test]
    fn inference() {
        assert!(
            matches!(parse_value(None, &[bare("5")]), Ok(Value::I32(5))),
            "integer infers vs32"
        );
        assert!(
            matches!(parse_value(None, &[bare("true")]), Ok(Value::Bool(true))),
            "true infers bool"
        );
        assert!(
            matches!(parse_value(None, &[quoted("true")]), Ok(Value::Str(s)) if s == "true"),
            "quoted infers strg"
        );
        assert!(
            matches!(parse_value(None, &[bare("3000000000")]), Err(ValueError::Range(_))),
            "integer outside i32 is a range error"
        );
        assert!(
            matches!(parse_value(None, &[bare("1.5")]), Err(ValueError::Syntax(_))),
            "floats need a tag"
        );
    }

    #[test]
    fn durations() {
        let d = Duration::new(-1, -500_000_000);
        assert_eq!(text_of(&Value::Duration(d)), "-1.500000000", "negative duration");
        assert_eq!(
            text_of(&Value::Duration(Duration::nanoseconds(-5))),
            "-0.000000005",
            "sub-second negative"
        );

        assert_eq!(duration("-1.5").expect("valid"), d, "short fraction is padded");
        assert_eq!(duration("2").expect("valid"), Duration::seconds(2), "no fraction");
        assert!(duration("1.").is_ok(), "empty fraction is accepted");
        assert!(duration("1.0000000001").is_err(), "too many digits");
        assert!(duration("abc").is_err(), "not a number");
    }

    #[test]
    fn colors_and_blobs() {
        assert_eq!(
            text_of(&Value::Color(Color::rgba(0x12, 0xAB, 0, 0xFF))),
            "#12ab00ff",
            "color format"
        );
        assert_eq!(color("#12ab00").expect("valid"), Color::rgb(0x12, 0xAB, 0), "rgb");
        assert_eq!(text_of(&Value::Blob(vec![0, 0xFE])), "00fe", "blob hex");
        assert_eq!(hex("00fE").expect("valid"), [0, 0xFE], "hex parse");
        assert!(hex("abc").is_err(), "odd length");
    }

    #[test]
    fn arrays() {
        assert_eq!(
            text_of(&Value::StrArray(vec!["a\"b".to_owned(), String::new()])),
            r#""a\"b","""#,
            "string array"
        );
        assert!(
            matches!(
                parse_value(Some(Kind::I32Array), &[bare("")]),
                Ok(Value::I32Array(v)) if v.is_empty()
            ),
            "empty array"
        );
        assert!(
            matches!(
                parse_value(Some(Kind::StrArray), &[quoted("")]),
                Ok(Value::StrArray(v)) if v == [""]
            ),
            "one empty string"
        );
    }

    #[test]
    fn floats_are_rounded() {
        assert_eq!(text_of(&Value::F64(1.0 / 3.0)), "0.333333", "six decimals");
        assert_eq!(
            text_of(&Value::PointF(PointF::new(1.0, -2.5))),
            "1.000000,-2.500000",
            "point"
        );
    }
}
