// tests of whole trees going through the binary codec. the text codec has its
// own tests in `text::tests`.

use time::macros::datetime;
use time::{Duration, OffsetDateTime};

use super::*;
use crate::geom::{Color, Point, PointF, Rect, Size};

/// Builds `depth + 1` empty unnamed nodes as raw bytes, each the only child
/// of the one before.
pub(crate) fn nested_bytes(depth: usize) -> Vec<u8> {
    // content sizes, innermost last
    let mut sizes = vec![0u64; depth + 1];
    let mut inner = 0;
    for (level, size) in sizes.iter_mut().enumerate().rev() {
        *size = 9 + if level == depth { 0 } else { dyn_len::encoded_len(inner) + inner };
        inner = *size;
    }

    let mut buf = Vec::new();
    for (level, &size) in sizes.iter().enumerate() {
        let child_count = u8::from(level != depth);
        dyn_len::write(&mut buf, size).expect("vec write must work");
        buf.extend([0, 0, 0, 0, 0, 0, 0, child_count, 0]);
    }
    buf
}

/// One value of every known kind.
///
/// Floats only use values the text format represents exactly.
pub(crate) fn every_kind() -> Vec<Value> {
    let values = vec![
        Value::I8(i8::MIN),
        Value::I16(-12345),
        Value::I32(i32::MAX),
        Value::I64(-9_876_543_210),
        Value::U8(200),
        Value::U16(u16::MAX),
        Value::U32(3_000_000_000),
        Value::U64(u64::MAX),
        Value::Bool(true),
        Value::Char('ü'),
        Value::F32(-2.5),
        Value::F64(1234.125),
        Value::Str("with \"quotes\", commas] and \\".to_owned()),
        Value::TaggedStr {
            encoding: "shift-jis".to_owned(),
            text: "テキスト".to_owned(),
        },
        Value::Duration(Duration::new(90, 123_456_789)),
        Value::Instant(datetime!(1999-12-31 23:59:59.999999999 UTC)),
        Value::Point(Point::new(i32::MIN, 0)),
        Value::PointF(PointF::new(-0.5, 0.75)),
        Value::Size(Size::new(1920, 1080)),
        Value::Rect(Rect::new(-5, 5, 10, 20)),
        Value::Color(Color::rgba(1, 2, 3, 4)),
        Value::Blob((0..=255).collect()),
        Value::I16Array(vec![i16::MIN, 0, i16::MAX]),
        Value::I32Array(vec![1, 2, 3]),
        Value::I64Array(vec![i64::MIN]),
        Value::U32Array(vec![]),
        Value::U64Array(vec![0, u64::MAX]),
        Value::F64Array(vec![0.5, -1.0]),
        Value::BoolArray(vec![false, true, true]),
        Value::StrArray(vec!["a".to_owned(), String::new(), "c,d".to_owned()]),
        Value::DurationArray(vec![Duration::ZERO, Duration::seconds(-3)]),
        Value::InstantArray(vec![OffsetDateTime::UNIX_EPOCH]),
    ];

    assert_eq!(values.len(), Kind::ALL.len(), "one value per known kind");
    values
}

fn round_trip(node: &Node) -> Vec<u8> {
    let buf = to_vec(node).expect("encoding must work");
    assert_eq!(buf.len() as u64, node.total_size(), "size must match encoding");

    let rev = from_slice(&buf).expect("decoding must work");
    assert_eq!(*node, rev, "encoding messed up data");
    buf
}

#[test]
fn every_kind_is_distinct() {
    let kinds: Vec<_> = every_kind().iter().filter_map(Value::kind).collect();
    for kind in Kind::ALL {
        assert!(kinds.contains(kind), "missing a value of {kind:?}");
    }
}

#[test]
fn round_trip_every_kind() {
    let mut node = Node::new("all kinds");
    for (i, value) in every_kind().into_iter().enumerate() {
        node.add_attribute(Attribute::new(format!("v{i}"), value));
    }

    round_trip(&node);
}

#[test]
fn round_trip_nested() {
    let mut root = Node::new("root").attr("version", 2u16);
    let level = root.add_child(Node::new("level 1").attr("a", "x"));
    level
        .add_child(Node::new("level 2"))
        .add_child(Node::new("level 3").attr("b", vec![1i64, 2]));
    root.add_child(Node::new("sibling"));

    round_trip(&root);
    round_trip(&Node::new(""));
}

#[test]
fn round_trip_large() {
    // forces the wider length encodings on nodes and attributes
    let big = "x".repeat(70_000);
    let node = Node::new("big")
        .attr("text", big.as_str())
        .child_node(Node::new("inner").attr("blob", vec![7u8; 300]));

    let buf = round_trip(&node);
    assert_eq!(buf[0], 254, "root length must use the u32 marker");
}

#[test]
fn unknown_kind_is_preserved() {
    let raw = vec![0xDE, 0xAD, 0xBE, 0xEF, 0x00];
    let tag = Tag::from_bytes(*b"zq99");
    let mut node = Node::new("n").attr("before", 1i32);
    node.add_attribute(Attribute::new(
        "future",
        Value::Unknown {
            tag,
            raw: raw.clone(),
        },
    ));
    node.add_attribute(Attribute::new("after", true));

    let buf = to_vec(&node).expect("encoding must work");
    let rev = from_slice(&buf).expect("unknown kinds must not fail decoding");

    let attr = rev.attribute("future").expect("attribute must exist");
    assert_eq!(attr.tag(), tag, "tag must be kept");
    assert_eq!(
        attr.value(),
        &Value::Unknown { tag, raw },
        "raw bytes must be kept"
    );
    assert!(rev.get::<bool>("after").expect("exists"), "later attributes still decode");

    // and it encodes back to the same bytes
    assert_eq!(to_vec(&rev).expect("encoding must work"), buf, "bytes must match");
}

#[test]
fn known_kind_with_extra_payload() {
    // a newer producer appended 2 bytes to a vs16 payload
    let buf = [
        21, // node length
        0, 0, 0, 1, // attribute count
        0, 0, 0, 0, // child count
        1, b'n', // name
        10, // attribute length
        b'v', b's', b'1', b'6', // tag
        1, b'a', // name
        0x01, 0x02, // payload
        0xFF, 0xFF, // appended
    ];

    let node = from_slice(&buf).expect("extra payload is ignored");
    assert_eq!(node.get::<i16>("a").expect("exists"), 0x0102, "payload must decode");
}

#[test]
fn merge_example() {
    let mut target = Node::new("a")
        .attr("x", 1i32)
        .child_node(Node::new("c").attr("y", 2i32));
    let source = Node::new("")
        .attr("x", 9i32)
        .attr("z", 3i32)
        .child_node(Node::new("c").attr("y", 5i32));

    target.update_from(&source);

    assert_eq!(target.name(), "a", "empty source name keeps the name");
    assert_eq!(target.get::<i32>("x").expect("exists"), 9, "x overwritten");
    assert_eq!(target.get::<i32>("z").expect("exists"), 3, "z appended");
    assert_eq!(target.children().len(), 1, "no new sibling for c");
    assert_eq!(
        target.at_path("c").and_then(|c| c.get::<i32>("y").ok()),
        Some(5),
        "c.y updated"
    );
}

#[test]
fn adopt_then_encode() {
    let mut parent = Node::new("parent").attr("p", 1u8);
    let mut donor = Node::new("donor")
        .attr("d", 2u8)
        .child_node(Node::new("kid"));

    parent.adopt_from(&mut donor);

    let expected = Node::new("parent")
        .attr("p", 1u8)
        .attr("d", 2u8)
        .child_node(Node::new("kid"));
    assert_eq!(parent, expected, "parent holds the union");
    assert_eq!(donor, Node::new("donor"), "donor is empty");

    round_trip(&parent);
}

#[test]
fn write_to_read_from() {
    let node = Node::new("io").attr("s", "value");
    let mut buf = Vec::new();
    node.write_to(&mut buf).expect("writing must work");
    buf.extend_from_slice(b"rest");

    let mut reader = buf.as_slice();
    let rev = Node::read_from(&mut reader).expect("reading must work");
    assert_eq!(rev, node, "tree must match");
    assert_eq!(reader, b"rest", "data after the tree is left unread");
}
