//! The human-readable text format.
//!
//! A tree is written as nested braces, with attributes in brackets:
//!
//! ```text
//! {"config"
//!   [name="main"]
//!   [count=5]
//!   [ratio(fl64)=0.500000]
//!   [tags(astr)="a","b"]
//!   {"child"}
//! }
//! ```
//!
//! A node's attributes come before its children. Strings, booleans, and
//! 32-bit integers don't need a `(type)` tag; every other kind does. Quoted text supports the escapes `\"` and `\\`.
//!
//! Floating point values are written with 6 decimals and so don't round-trip
//! exactly. Use the binary format where that matters.

use std::io;

use crate::error::{Error, Result};
use crate::node::Node;

mod parser;
mod value;
mod writer;


pub use parser::{Event, Parser};
pub(crate) use value::write_value;
pub use writer::Writer;

/// Parses a tree from text.
///
/// # Errors
///
/// Returns [`Error::Syntax`] if the text is malformed, and [`Error::Range`] if
/// a literal doesn't fit its kind.
pub fn from_str(input: &str) -> Result<Node> {
    let mut stack: Vec<Node> = Vec::new();
    let mut root = None;

    for event in Parser::new(input) {
        match event? {
            Event::OpenNode(name) => stack.push(Node::new(name)),
            Event::Attribute(attr) => {
                if let Some(top) = stack.last_mut() {
                    top.add_attribute(attr);
                }
            },
            Event::CloseNode => {
                let Some(node) = stack.pop() else { continue };
                match stack.last_mut() {
                    Some(parent) => _ = parent.add_child(node),
                    None => root = Some(node),
                }
            },
        }
    }

    // the parser only ends cleanly after the root node closed
    root.ok_or_else(|| Error::Syntax {
        line: 1,
        column: 1,
        message: "expected a node".to_owned(),
    })
}

/// Reads and parses a tree from a [`io::Read`].
///
/// # Errors
///
/// Same as [`from_str`], and additionally fails if the input can't be read or
/// isn't UTF-8.
pub fn from_reader<R: io::Read>(mut reader: R) -> Result<Node> {
    let mut input = String::new();
    reader.read_to_string(&mut input).map_err(|e| {
        if e.kind() == io::ErrorKind::InvalidData {
            Error::InvalidUtf8
        } else {
            Error::from(e)
        }
    })?;
    from_str(&input)
}

/// Writes a tree as text with the default [`Writer`] settings.
///
/// # Errors
///
/// See [`Writer::to_string`].
pub fn to_string(node: &Node) -> Result<String> {
    Writer::new().to_string(node)
}

/// Writes a tree as text with the default [`Writer`] settings.
///
/// # Errors
///
/// See [`Writer::to_writer`].
pub fn to_writer<W: io::Write>(writer: W, node: &Node) -> Result<()> {
    Writer::new().to_writer(writer, node)
}
