//! Exposes the binary decoder and decoding helper functions.

use std::borrow::Cow;
use std::io;

use crate::attr::Attribute;
use crate::dyn_len;
use crate::error::{Error, Result};
use crate::kind::Tag;
use crate::node::Node;
use crate::value::{Value, read_count};

mod read;

pub use read::{IoRead, Read, SliceRead};

/// How deep nodes may nest below the root before decoding fails.
///
/// Every level recurses once, so this keeps hostile data from exhausting the
/// stack. The root is at depth 0.
pub const MAX_DEPTH: usize = 128;

/// Decodes a tree from a byte slice.
///
/// In addition to other decoding errors, this returns
/// [`Error::TrailingBytes`] if the slice isn't fully consumed. If you want to
/// use the rest of the slice instead, refer to [`Deserializer::from_slice`].
///
/// # Errors
///
/// Returns an error if the data is truncated or structurally invalid.
pub fn from_slice(buf: &[u8]) -> Result<Node> {
    let mut de = Deserializer::from_slice(buf);
    let node = de.read_node()?;

    if !de.remainder().is_empty() {
        return Err(Error::TrailingBytes);
    }

    Ok(node)
}

/// Decodes a tree from a [`io::Read`].
///
/// The reader may still have bytes available when this function returns
/// successfully.
///
/// # Errors
///
/// Returns an error if the data is truncated or structurally invalid, or the
/// reader fails.
pub fn from_reader<R: io::Read>(reader: R) -> Result<Node> {
    Deserializer::from_reader(reader).read_node()
}

/// Decodes a single attribute, including its length prefix.
///
/// The whole content block is consumed, even if a known kind's payload ends
/// before it. Unknown kinds are kept as [`Value::Unknown`].
///
/// # Errors
///
/// Returns an error if the data is truncated or the payload is invalid.
pub fn decode_attribute<'de, R: Read<'de>>(mut reader: R) -> Result<Attribute> {
    let len = dyn_len::read_usize(&mut reader)?;
    let content = match reader.try_read_bytes_borrow(len) {
        Some(bytes) => Cow::Borrowed(bytes?),
        None => Cow::Owned(reader.read_byte_vec(len)?),
    };

    let mut content = SliceRead::new(&content);
    let tag = Tag::from_bytes(content.read_bytes()?);
    let name = dyn_len::read_string(&mut content)?;

    if tag.kind().is_none() {
        log::debug!("keeping attribute `{name}` of unknown kind `{tag}` as raw bytes");
    }

    let value = Value::from_payload(tag, content.remainder())?;
    Ok(Attribute::new(name, value))
}

/// Skips ahead to `end`, the end of a length-prefixed block.
///
/// # Errors
///
/// Returns [`Error::InvalidData`] if the reader is already past `end`.
pub(crate) fn skip_to_end<'de, R: Read<'de>>(mut reader: R, end: u64, name: &str) -> Result<()> {
    let pos = reader.position();
    if pos > end {
        return Err(Error::InvalidData("content overran its length prefix"));
    }

    if pos < end {
        log::debug!("skipping {} unread bytes at the end of `{name}`", end - pos);
        reader.skip(end - pos)?;
    }

    Ok(())
}

pub(crate) fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::InvalidData("nesting too deep"));
    }

    Ok(())
}

/// A binary decoder over a [`Read`].
#[derive(Debug)]
pub struct Deserializer<R> {
    reader: R,
}

impl<'de, R: Read<'de>> Deserializer<R> {
    /// Creates a new deserializer that reads from a [`Read`].
    ///
    /// When reading from a slice, using [`Self::from_slice`] may be clearer.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Reads one node and its whole subtree.
    ///
    /// If the node's content is shorter than its length prefix claims, the
    /// rest is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] if a count is negative, the content
    /// runs past the length prefix, or nodes nest deeper than [`MAX_DEPTH`].
    /// Returns [`Error::Truncated`] if the data ends early.
    pub fn read_node(&mut self) -> Result<Node> {
        self.read_node_at(0)
    }

    fn read_node_at(&mut self, depth: usize) -> Result<Node> {
        check_depth(depth)?;

        let len = dyn_len::read(&mut self.reader)?;
        let end = self
            .reader
            .position()
            .checked_add(len)
            .ok_or(Error::InvalidData("node length overflows"))?;

        let attr_count = read_count(&mut self.reader)?;
        let child_count = read_count(&mut self.reader)?;
        let name = dyn_len::read_string(&mut self.reader)?;

        log::trace!("reading node `{name}`: {attr_count} attributes, {child_count} children");

        // counts come from the data, so don't trust them for allocations
        let mut attributes = Vec::with_capacity(attr_count.min(0x100));
        for _ in 0..attr_count {
            attributes.push(decode_attribute(&mut self.reader)?);
        }

        let mut children = Vec::with_capacity(child_count.min(0x100));
        for _ in 0..child_count {
            children.push(self.read_node_at(depth + 1)?);
        }

        skip_to_end(&mut self.reader, end, &name)?;
        Ok(Node::from_parts(name, attributes, children))
    }

    /// Reads one attribute.
    ///
    /// # Errors
    ///
    /// See [`decode_attribute`].
    pub fn read_attribute(&mut self) -> Result<Attribute> {
        decode_attribute(&mut self.reader)
    }

    /// Unwraps the deserializer into its inner reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<'de> Deserializer<SliceRead<'de>> {
    /// Creates a new deserializer that reads from a slice.
    ///
    /// This is useful over [`from_slice`] when you want the remainder of the
    /// slice instead of an error, f.e. to read several trees back to back.
    pub fn from_slice(buf: &'de [u8]) -> Self {
        Self::new(SliceRead::new(buf))
    }

    /// Gets the remaining unread part of the slice.
    pub fn remainder(&self) -> &'de [u8] {
        self.reader.remainder()
    }
}

impl<R: io::Read> Deserializer<IoRead<R>> {
    /// Creates a new deserializer that reads from a [`io::Read`].
    ///
    /// If you're working with a byte slice, it is more efficient to use
    /// [`from_slice`].
    pub fn from_reader(reader: R) -> Self {
        Self::new(IoRead::new(reader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ser::to_vec;
    use crate::tests::nested_bytes;

    #[test]
    fn rejects_trailing_bytes() {
        let mut buf = to_vec(&Node::new("n")).expect("encoding must work");
        buf.push(0);
        let res = from_slice(&buf);
        assert!(matches!(res, Err(Error::TrailingBytes)), "trailing: {res:?}");
    }

    #[test]
    fn reads_back_to_back() {
        let mut buf = to_vec(&Node::new("a")).expect("encoding must work");
        buf.extend(to_vec(&Node::new("b")).expect("encoding must work"));

        let mut de = Deserializer::from_slice(&buf);
        let a = de.read_node().expect("first node");
        let b = de.read_node().expect("second node");
        assert_eq!((a.name(), b.name()), ("a", "b"), "both nodes in order");
        assert!(de.remainder().is_empty(), "all consumed");
    }

    #[test]
    fn negative_count() {
        let buf = [9, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0, 0];
        let res = from_slice(&buf);
        assert!(matches!(res, Err(Error::InvalidData(_))), "negative count: {res:?}");
    }

    #[test]
    fn skips_unread_node_tail() {
        // node claims 2 more content bytes than it uses
        let buf = [12, 0, 0, 0, 0, 0, 0, 0, 0, 1, b'n', 0xAA, 0xBB];
        let node = from_slice(&buf).expect("extra content is skipped");
        assert_eq!(node, Node::new("n"), "node must decode");
    }

    #[test]
    fn overrun_is_invalid() {
        // node claims 9 content bytes but uses 10
        let buf = [9, 0, 0, 0, 0, 0, 0, 0, 0, 1, b'n'];
        let res = from_slice(&buf);
        assert!(matches!(res, Err(Error::InvalidData(_))), "overrun: {res:?}");
    }

    #[test]
    fn truncated() {
        let buf = to_vec(&Node::new("name").attr("a", 5i64)).expect("encoding must work");
        let res = from_slice(&buf[..buf.len() - 3]);
        assert!(matches!(res, Err(Error::Truncated)), "truncated: {res:?}");

        let res = from_reader(&buf[..buf.len() - 3]);
        assert!(matches!(res, Err(Error::Truncated)), "truncated reader: {res:?}");
    }

    #[test]
    fn nesting_up_to_limit() {
        let node = from_slice(&nested_bytes(MAX_DEPTH)).expect("limit is allowed");

        let mut depth = 0;
        let mut node = &node;
        while let [child] = node.children() {
            node = child;
            depth += 1;
        }
        assert_eq!(depth, MAX_DEPTH, "every level must decode");
    }

    #[test]
    fn nesting_too_deep() {
        let res = from_slice(&nested_bytes(MAX_DEPTH + 1));
        assert!(matches!(res, Err(Error::InvalidData(_))), "past limit: {res:?}");

        // would overflow the stack without the limit
        let buf = nested_bytes(200_000);
        let res = from_slice(&buf);
        assert!(matches!(res, Err(Error::InvalidData(_))), "hostile: {res:?}");

        let res = from_reader(buf.as_slice());
        assert!(matches!(res, Err(Error::InvalidData(_))), "hostile reader: {res:?}");
    }

    #[test]
    fn io_reader_matches_slice() {
        let node = Node::new("root")
            .attr("s", "a string long enough to matter")
            .child_node(Node::new("c").attr("b", vec![1u8, 2, 3]));
        let buf = to_vec(&node).expect("encoding must work");
        let rev = from_reader(buf.as_slice()).expect("decoding must work");
        assert_eq!(rev, node, "io reader must decode the same tree");
    }
}
