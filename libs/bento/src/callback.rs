//! Streaming reader that walks a binary tree without building it.
//!
//! The [`CallbackReader`] reads the same data as [`from_reader`](crate::from_reader),
//! but instead of returning a [`Node`](crate::Node) it reports every node and
//! attribute to a [`Visitor`] as it goes. Attribute payloads are only
//! available to [`Visitor::read_attribute_data`]; by default they are skipped.
//!
//! ```
//! use bento::callback::{AttributeHeader, CallbackReader, Visitor};
//! use bento::{Node, Result};
//!
//! #[derive(Default)]
//! struct CountAttributes(usize);
//!
//! impl Visitor for CountAttributes {
//!     fn attribute_header_complete(&mut self, _depth: usize, _header: &AttributeHeader) -> Result<()> {
//!         self.0 += 1;
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let tree = Node::new("root").attr("a", 1i32).child_node(Node::new("c").attr("b", true));
//! let buf = bento::to_vec(&tree)?;
//!
//! let mut counter = CountAttributes::default();
//! CallbackReader::from_slice(&buf).process(&mut counter)?;
//! assert_eq!(counter.0, 2);
//! # Ok(())
//! # }
//! ```

use std::io;

use crate::de::{IoRead, Read, SliceRead, check_depth, skip_to_end};
use crate::dyn_len;
use crate::error::{Error, Result};
use crate::kind::Tag;
use crate::value::read_count;

/// The header of a node, reported before its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHeader {
    pub name: String,
    pub attribute_count: usize,
    pub child_count: usize,
}

/// The header of an attribute, reported before its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeHeader {
    pub name: String,
    pub tag: Tag,
}

/// Hooks invoked by the [`CallbackReader`].
///
/// Every hook has a default that does nothing, so implementors only override
/// what they need. Returning an error from any hook aborts processing.
///
/// `depth` is 0 for the root node. Attribute hooks receive the depth of the
/// node that holds the attribute.
#[allow(unused_variables)]
pub trait Visitor {
    /// Called once a node's counts and name are known.
    ///
    /// # Errors
    ///
    /// Any error aborts processing.
    fn node_header_complete(&mut self, depth: usize, header: &NodeHeader) -> Result<()> {
        Ok(())
    }

    /// Called after the last attribute of a node, before its children.
    ///
    /// # Errors
    ///
    /// Any error aborts processing.
    fn node_attributes_complete(&mut self, depth: usize, header: &NodeHeader) -> Result<()> {
        Ok(())
    }

    /// Called after the last child of a node.
    ///
    /// # Errors
    ///
    /// Any error aborts processing.
    fn node_complete(&mut self, depth: usize, header: &NodeHeader) -> Result<()> {
        Ok(())
    }

    /// Called once an attribute's tag and name are known.
    ///
    /// # Errors
    ///
    /// Any error aborts processing.
    fn attribute_header_complete(&mut self, depth: usize, header: &AttributeHeader) -> Result<()> {
        Ok(())
    }

    /// Reads the payload of an attribute, which is `data_len` bytes long.
    ///
    /// Bytes left unread are skipped afterwards. By default, nothing is read.
    /// Use [`Value::from_payload`](crate::Value::from_payload) to decode the
    /// payload.
    ///
    /// # Errors
    ///
    /// Any error aborts processing. Reading more than `data_len` bytes makes
    /// the reader fail with [`Error::InvalidData`].
    fn read_attribute_data<'de, R: Read<'de>>(
        &mut self,
        depth: usize,
        header: &AttributeHeader,
        reader: &mut R,
        data_len: u64,
    ) -> Result<()> {
        Ok(())
    }

    /// Called after an attribute's payload.
    ///
    /// # Errors
    ///
    /// Any error aborts processing.
    fn attribute_complete(&mut self, depth: usize, header: &AttributeHeader) -> Result<()> {
        Ok(())
    }
}

/// Walks a binary-encoded tree, reporting it to a [`Visitor`].
#[derive(Debug)]
pub struct CallbackReader<R> {
    reader: R,
}

impl<'de, R: Read<'de>> CallbackReader<R> {
    /// Creates a callback reader over a [`Read`].
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Processes one whole tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is truncated or structurally invalid, or
    /// a hook fails.
    pub fn process<V: Visitor>(&mut self, visitor: &mut V) -> Result<()> {
        self.process_node(0, visitor)
    }

    /// Processes one node at `depth` and its whole subtree.
    ///
    /// # Errors
    ///
    /// Same as [`Self::process`]. Also returns [`Error::InvalidData`] once
    /// nodes nest deeper than [`MAX_DEPTH`](crate::de::MAX_DEPTH).
    pub fn process_node<V: Visitor>(&mut self, depth: usize, visitor: &mut V) -> Result<()> {
        check_depth(depth)?;

        let len = dyn_len::read(&mut self.reader)?;
        let end = self
            .reader
            .position()
            .checked_add(len)
            .ok_or(Error::InvalidData("node length overflows"))?;

        let attribute_count = read_count(&mut self.reader)?;
        let child_count = read_count(&mut self.reader)?;
        let name = dyn_len::read_string(&mut self.reader)?;
        let header = NodeHeader {
            name,
            attribute_count,
            child_count,
        };

        visitor.node_header_complete(depth, &header)?;

        for _ in 0..attribute_count {
            self.process_attribute(depth, visitor)?;
        }

        visitor.node_attributes_complete(depth, &header)?;

        for _ in 0..child_count {
            self.process_node(depth + 1, visitor)?;
        }

        skip_to_end(&mut self.reader, end, &header.name)?;
        visitor.node_complete(depth, &header)
    }

    /// Processes one attribute of a node at `depth`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::process`].
    pub fn process_attribute<V: Visitor>(&mut self, depth: usize, visitor: &mut V) -> Result<()> {
        let len = dyn_len::read(&mut self.reader)?;
        let start = self.reader.position();
        let end = start
            .checked_add(len)
            .ok_or(Error::InvalidData("attribute length overflows"))?;

        let tag = Tag::from_bytes(self.reader.read_bytes()?);
        let name = dyn_len::read_string(&mut self.reader)?;
        let header = AttributeHeader { name, tag };

        let data_len = end
            .checked_sub(self.reader.position())
            .ok_or(Error::InvalidData("attribute header overran its length prefix"))?;

        visitor.attribute_header_complete(depth, &header)?;
        visitor.read_attribute_data(depth, &header, &mut self.reader, data_len)?;

        skip_to_end(&mut self.reader, end, &header.name)?;
        visitor.attribute_complete(depth, &header)
    }

    /// Unwraps the callback reader into its inner reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<'de> CallbackReader<SliceRead<'de>> {
    /// Creates a callback reader over a slice.
    pub fn from_slice(buf: &'de [u8]) -> Self {
        Self::new(SliceRead::new(buf))
    }
}

impl<R: io::Read> CallbackReader<IoRead<R>> {
    /// Creates a callback reader over a [`io::Read`].
    pub fn from_reader(reader: R) -> Self {
        Self::new(IoRead::new(reader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::de::MAX_DEPTH;
    use crate::tests::nested_bytes;
    use crate::{Node, to_vec};

    #[derive(Default)]
    struct Events(Vec<String>);

    impl Visitor for Events {
        fn node_header_complete(&mut self, depth: usize, header: &NodeHeader) -> Result<()> {
            self.0.push(format!("{depth} open {}", header.name));
            Ok(())
        }

        fn node_attributes_complete(&mut self, depth: usize, header: &NodeHeader) -> Result<()> {
            self.0.push(format!("{depth} attrs {}", header.name));
            Ok(())
        }

        fn node_complete(&mut self, depth: usize, header: &NodeHeader) -> Result<()> {
            self.0.push(format!("{depth} close {}", header.name));
            Ok(())
        }

        fn attribute_complete(&mut self, depth: usize, header: &AttributeHeader) -> Result<()> {
            self.0.push(format!("{depth} attr {} {}", header.name, header.tag));
            Ok(())
        }
    }

    #[test]
    fn hook_order() {
        let tree = Node::new("r")
            .attr("a", 1i32)
            .child_node(Node::new("c").attr("b", "x"));
        let buf = to_vec(&tree).expect("encoding must work");

        let mut events = Events::default();
        CallbackReader::from_slice(&buf)
            .process(&mut events)
            .expect("processing must work");

        assert_eq!(
            events.0,
            [
                "0 open r",
                "0 attr a vs32",
                "0 attrs r",
                "1 open c",
                "1 attr b strg",
                "1 attrs c",
                "1 close c",
                "0 close r",
            ],
            "hooks must fire in document order"
        );
    }

    struct Overread;

    impl Visitor for Overread {
        fn read_attribute_data<'de, R: Read<'de>>(
            &mut self,
            _depth: usize,
            _header: &AttributeHeader,
            reader: &mut R,
            data_len: u64,
        ) -> Result<()> {
            reader.skip(data_len + 1)
        }
    }

    #[test]
    fn overreading_is_invalid() {
        let tree = Node::new("r").attr("a", 1i32).attr("b", 2i32);
        let buf = to_vec(&tree).expect("encoding must work");

        let res = CallbackReader::from_slice(&buf).process(&mut Overread);
        assert!(matches!(res, Err(Error::InvalidData(_))), "overread: {res:?}");
    }

    struct Abort;

    impl Visitor for Abort {
        fn node_header_complete(&mut self, _depth: usize, header: &NodeHeader) -> Result<()> {
            Err(Error::NotFound(header.name.clone()))
        }
    }

    #[test]
    fn hooks_can_abort() {
        let buf = to_vec(&Node::new("r")).expect("encoding must work");
        let res = CallbackReader::from_slice(&buf).process(&mut Abort);
        assert!(matches!(res, Err(Error::NotFound(_))), "abort: {res:?}");
    }

    #[derive(Default)]
    struct Deepest(usize);

    impl Visitor for Deepest {
        fn node_header_complete(&mut self, depth: usize, _header: &NodeHeader) -> Result<()> {
            self.0 = self.0.max(depth);
            Ok(())
        }
    }

    #[test]
    fn nesting_depth_is_limited() {
        let mut deepest = Deepest::default();
        CallbackReader::from_slice(&nested_bytes(MAX_DEPTH))
            .process(&mut deepest)
            .expect("limit is allowed");
        assert_eq!(deepest.0, MAX_DEPTH, "every level must be visited");

        let mut deepest = Deepest::default();
        let res = CallbackReader::from_slice(&nested_bytes(200_000)).process(&mut deepest);
        assert!(matches!(res, Err(Error::InvalidData(_))), "too deep: {res:?}");
        assert_eq!(deepest.0, MAX_DEPTH, "must stop right past the limit");
    }
}
