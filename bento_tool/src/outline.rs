//! Prints the shape of a tree: node names, attribute names, and kinds.
//!
//! Neither variant builds the tree. Binary input goes through the callback
//! reader, which skips every payload; text input goes through the event
//! parser.

use std::io;

use bento::callback::{AttributeHeader, CallbackReader, NodeHeader, Visitor};
use bento::text::{Event, Parser};

struct BinaryOutline<W> {
    out: W,
}

impl<W: io::Write> Visitor for BinaryOutline<W> {
    fn node_header_complete(&mut self, depth: usize, header: &NodeHeader) -> bento::Result<()> {
        writeln!(
            self.out,
            "{:indent$}{:?} ({} attributes, {} children)",
            "",
            header.name,
            header.attribute_count,
            header.child_count,
            indent = depth * 2,
        )?;
        Ok(())
    }

    fn attribute_header_complete(&mut self, depth: usize, header: &AttributeHeader) -> bento::Result<()> {
        writeln!(
            self.out,
            "{:indent$}- {:?}: {}",
            "",
            header.name,
            header.tag,
            indent = depth * 2 + 2,
        )?;
        Ok(())
    }
}

/// Writes the outline of a binary tree.
///
/// # Errors
///
/// Returns an error if the data is malformed or writing fails.
pub fn binary<W: io::Write>(buf: &[u8], out: W) -> anyhow::Result<()> {
    let mut reader = CallbackReader::from_slice(buf);
    reader.process(&mut BinaryOutline { out })?;

    let rest = reader.into_inner().remainder().len();
    if rest != 0 {
        log::warn!("{rest} trailing bytes after the root node");
    }

    Ok(())
}

/// Writes the outline of a text tree.
///
/// # Errors
///
/// Returns an error if the text is malformed or writing fails.
pub fn text<W: io::Write>(input: &str, mut out: W) -> anyhow::Result<()> {
    let mut depth = 0usize;
    for event in Parser::new(input) {
        match event? {
            Event::OpenNode(name) => {
                writeln!(out, "{:indent$}{name:?}", "", indent = depth * 2)?;
                depth += 1;
            },
            Event::Attribute(attr) => writeln!(
                out,
                "{:indent$}- {:?}: {}",
                "",
                attr.name(),
                attr.tag(),
                indent = depth * 2,
            )?,
            Event::CloseNode => depth = depth.saturating_sub(1),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use bento::Node;

    fn sample() -> Node {
        Node::new("root")
            .attr("a", 1i32)
            .child_node(Node::new("c").attr("b", true))
    }

    fn output(f: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).expect("outline must work");
        String::from_utf8(out).expect("outline must be utf-8")
    }

    #[test]
    fn binary_outline() {
        let buf = bento::to_vec(&sample()).expect("encoding must work");
        let text = output(|out| super::binary(&buf, out));

        assert_eq!(
            text,
            concat!(
                "\"root\" (1 attributes, 1 children)\n",
                "  - \"a\": vs32\n",
                "  \"c\" (1 attributes, 0 children)\n",
                "    - \"b\": bool\n",
            ),
            "binary outline"
        );
    }

    #[test]
    fn text_outline() {
        let input = bento::text::to_string(&sample()).expect("writing must work");
        let text = output(|out| super::text(&input, out));

        assert_eq!(
            text,
            concat!(
                "\"root\"\n",
                "  - \"a\": vs32\n",
                "  \"c\"\n",
                "    - \"b\": bool\n",
            ),
            "text outline"
        );
    }

    #[test]
    fn malformed_binary_fails() {
        let buf = bento::to_vec(&sample()).expect("encoding must work");
        let res = super::binary(&buf[..buf.len() - 1], Vec::new());
        assert!(res.is_err(), "truncated input must fail");
    }
}
