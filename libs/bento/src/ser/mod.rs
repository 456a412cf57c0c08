//! Exposes the binary encoder and encoding helper functions.

use std::io;

use crate::attr::Attribute;
use crate::de::check_depth;
use crate::dyn_len;
use crate::error::Result;
use crate::node::Node;
use crate::value::write_count;

/// Encodes a tree to a [`Vec<u8>`].
///
/// The resulting buffer will have exactly the length required.
///
/// # Errors
///
/// Returns [`Error::Range`](crate::Error::Range) if a node or array has more
/// than [`i32::MAX`] elements, and [`Error::InvalidData`](crate::Error::InvalidData)
/// if nodes nest deeper than [`MAX_DEPTH`](crate::de::MAX_DEPTH) or a [`Value::Unknown`](crate::Value::Unknown)
/// carries the tag of a known kind.
pub fn to_vec(node: &Node) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    to_writer(&mut buf, node)?;
    Ok(buf)
}

/// Encodes a tree to a [`io::Write`].
///
/// # Errors
///
/// Same as [`to_vec`], and additionally fails if the writer fails. The writer
/// may have received partial data in that case.
pub fn to_writer<W: io::Write>(writer: W, node: &Node) -> Result<()> {
    let mut ser = Serializer::new(writer, node);
    ser.write_node(node, 0)
}

/// Encodes a single attribute, including its length prefix.
///
/// # Errors
///
/// Returns an error if the value can't be encoded or the writer fails.
pub fn encode_attribute<W: io::Write>(mut writer: W, attr: &Attribute) -> Result<()> {
    dyn_len::write(&mut writer, attr.content_size())?;
    writer.write_all(attr.tag().as_bytes())?;
    dyn_len::write_str(&mut writer, attr.name())?;
    attr.value().write_payload(writer)
}

/// Binary encoder for one tree.
///
/// Node content sizes are computed for the whole tree up front, in a single
/// post-order pass, and are then consumed in pre-order while writing.
#[derive(Debug)]
struct Serializer<W> {
    writer: W,
    sizes: Vec<u64>,
    next: usize,
}

impl<W: io::Write> Serializer<W> {
    fn new(writer: W, root: &Node) -> Self {
        let mut sizes = Vec::new();
        collect_sizes(root, &mut sizes);
        Self {
            writer,
            sizes,
            next: 0,
        }
    }

    fn write_node(&mut self, node: &Node, depth: usize) -> Result<()> {
        // anything deeper couldn't be decoded again
        check_depth(depth)?;

        // the table is built from the same tree, so the slot always exists
        let size = self.sizes.get(self.next).copied().unwrap_or_default();
        self.next += 1;

        log::trace!("writing node `{}` with {size} content bytes", node.name());

        let w = &mut self.writer;
        dyn_len::write(&mut *w, size)?;
        write_count(&mut *w, node.attributes().len())?;
        write_count(&mut *w, node.children().len())?;
        dyn_len::write_str(&mut *w, node.name())?;

        for attr in node.attributes() {
            encode_attribute(&mut *w, attr)?;
        }

        for child in node.children() {
            self.write_node(child, depth + 1)?;
        }

        Ok(())
    }
}

/// Fills `table` with the content size of every node, indexed in pre-order,
/// and returns the content size of `node`.
fn collect_sizes(node: &Node, table: &mut Vec<u64>) -> u64 {
    let slot = table.len();
    table.push(0);

    let mut size = 4 + 4 + dyn_len::prefixed_size(node.name().len());
    size += node
        .attributes()
        .iter()
        .map(Attribute::total_size)
        .sum::<u64>();

    for child in node.children() {
        let child_size = collect_sizes(child, table);
        size += dyn_len::encoded_len(child_size) + child_size;
    }

    table[slot] = size;
    size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::de::MAX_DEPTH;

    #[test]
    fn empty_node_layout() {
        let buf = to_vec(&Node::new("n")).expect("encoding must work");
        assert_eq!(
            buf,
            [10, 0, 0, 0, 0, 0, 0, 0, 0, 1, b'n'],
            "prefix, counts, and name"
        );
    }

    #[test]
    fn size_table_matches_sizes() {
        let node = Node::new("root")
            .attr("a", 1i32)
            .child_node(Node::new("x").child_node(Node::new("y").attr("s", "text")))
            .child_node(Node::new("z"));

        let mut table = Vec::new();
        let root = collect_sizes(&node, &mut table);
        assert_eq!(root, node.content_size(), "root size must match");
        assert_eq!(table.len(), 4, "one slot per node");
        assert_eq!(
            table[2],
            node.at_path("x/y").map_or(0, Node::content_size),
            "slots must be in pre-order"
        );

        let buf = to_vec(&node).expect("encoding must work");
        assert_eq!(buf.len() as u64, node.total_size(), "encoded length must match");
    }

    #[test]
    fn attribute_layout() {
        let mut buf = Vec::new();
        encode_attribute(&mut buf, &Attribute::new("k", true)).expect("encoding must work");
        assert_eq!(
            buf,
            [7, b'b', b'o', b'o', b'l', 1, b'k', 1],
            "prefix, tag, name, payload"
        );
    }

    #[test]
    fn nesting_depth_is_limited() {
        let mut node = Node::new("leaf");
        for _ in 0..MAX_DEPTH {
            node = Node::new("n").child_node(node);
        }
        let buf = to_vec(&node).expect("limit is allowed");
        assert_eq!(crate::from_slice(&buf).ok(), Some(node.clone()), "must decode again");

        let node = Node::new("n").child_node(node);
        let res = to_vec(&node);
        assert!(matches!(res, Err(Error::InvalidData(_))), "too deep: {res:?}");
    }

    #[test]
    fn unknown_with_known_tag_is_rejected() {
        let value = crate::Value::Unknown {
            tag: crate::Kind::I32.tag(),
            raw: vec![1, 2],
        };
        let res = to_vec(&Node::new("n").attr("x", value));
        assert!(matches!(res, Err(Error::InvalidData(_))), "known tag: {res:?}");
    }
}
