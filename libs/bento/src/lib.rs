//! # Bento
//!
//! A self-describing format for trees of named, typed values, with a compact
//! binary encoding and a human-readable [text encoding](text).
//!
//! A tree is made of [`Node`]s. Each node has a name, an ordered list of
//! [`Attribute`]s, and an ordered list of child nodes. Each attribute has a
//! name and a [`Value`] of one of the known [`Kind`]s.
//!
//! The binary layout is big-endian throughout, and every node, attribute, and
//! string is prefixed with its length in the [dynamic-length](dyn_len)
//! encoding:
//!
//! - node: `[len][i32 attribute count][i32 child count][name][attributes][children]`
//! - attribute: `[len][4-byte kind tag][name][payload]`
//!
//! Decoders stay compatible with newer producers: attributes with tags they
//! don't know are kept as [`Value::Unknown`], and bytes appended past the
//! known end of a node or attribute are skipped. To walk a large tree without
//! building it in memory, use the [`callback`] reader.
//!
//! ```
//! use bento::Node;
//!
//! # fn main() -> bento::Result<()> {
//! let tree = Node::new("config")
//!     .attr("name", "main")
//!     .attr("retries", 3i32)
//!     .child_node(Node::new("window").attr("scale", 1.5f64));
//!
//! let buf = bento::to_vec(&tree)?;
//! assert_eq!(bento::from_slice(&buf)?, tree);
//!
//! let text = bento::text::to_string(&tree)?;
//! assert_eq!(bento::text::from_str(&text)?, tree);
//! # Ok(())
//! # }
//! ```

// for benchmarks
#[cfg(test)]
use criterion as _;

mod attr;
pub mod callback;
pub mod de;
pub mod dyn_len;
mod error;
pub mod geom;
mod kind;
mod node;
pub mod ser;
pub mod text;
mod value;
pub mod xml;

#[cfg(test)]
mod tests;

pub use attr::Attribute;
pub use de::{decode_attribute, from_reader, from_slice};
pub use error::{Error, Result};
pub use kind::{Kind, Tag};
pub use node::Node;
pub use ser::{encode_attribute, to_vec, to_writer};
pub use value::{FromValue, Value};
