//! The node tree.

use std::io;

use crate::attr::Attribute;
use crate::de::IoRead;
use crate::dyn_len;
use crate::error::{Error, Result};
use crate::value::{FromValue, Value};

mod merge;

/// A named container of [`Attribute`]s and child nodes.
///
/// Both collections keep insertion order. Names don't have to be unique;
/// lookups by name return the first match.
///
/// A node owns its whole subtree. There is no link back to the parent, so
/// operations that need one walk down from the root instead, such as
/// [`Node::at_path`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Node {
    name: String,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Node {
    /// Creates an empty node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The attributes, in insertion order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// The child nodes, in insertion order.
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// The child nodes, mutably.
    pub fn children_mut(&mut self) -> &mut [Self] {
        &mut self.children
    }

    /// Appends an attribute and returns `self`, for building trees inline.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Appends a child node and returns `self`, for building trees inline.
    #[must_use]
    pub fn child_node(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Appends an attribute, even if one of the same name exists.
    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    /// Appends a child node and returns a reference to it.
    pub fn add_child(&mut self, child: Self) -> &mut Self {
        let index = self.children.len();
        self.children.push(child);
        &mut self.children[index]
    }

    /// Sets the value of the first attribute named `name`, or appends a new
    /// attribute if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KindMismatch`] if the existing attribute has a
    /// different kind.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        match self.attribute_mut(name) {
            Some(attr) => attr.set_value(value),
            None => {
                self.attributes.push(Attribute::new(name, value));
                Ok(())
            },
        }
    }

    /// Finds the first attribute named `name`.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    /// Finds the first attribute named `name`, mutably.
    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.name() == name)
    }

    /// Finds the first child named `name`.
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Finds the first child named `name`, mutably.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Self> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Walks down a `/`-separated path of child names.
    ///
    /// Empty segments are ignored, so `""` and `"/"` resolve to `self`.
    pub fn at_path(&self, path: &str) -> Option<&Self> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |node, segment| node.child(segment))
    }

    /// Like [`Node::at_path`], but mutably.
    pub fn at_path_mut(&mut self, path: &str) -> Option<&mut Self> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |node, segment| node.child_mut(segment))
    }

    /// Gets the typed value of the first attribute named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such attribute, and
    /// [`Error::KindMismatch`] if it doesn't hold a `T`.
    pub fn get<T: FromValue>(&self, name: &str) -> Result<T> {
        let attr = self
            .attribute(name)
            .ok_or_else(|| Error::NotFound(name.to_owned()))?;

        T::from_value(attr.value()).ok_or_else(|| Error::KindMismatch {
            expected: T::KIND.tag(),
            found: attr.tag(),
        })
    }

    /// Gets the typed value of the first attribute named `name`, or `default`
    /// if it is missing or holds a different kind.
    pub fn get_or<T: FromValue>(&self, name: &str, default: T) -> T {
        self.get(name).unwrap_or(default)
    }

    /// Removes the first attribute named `name` and returns it.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        let index = self.attributes.iter().position(|a| a.name() == name)?;
        Some(self.attributes.remove(index))
    }

    /// Removes all attributes and children. The name is kept.
    pub fn clear(&mut self) {
        self.attributes.clear();
        self.children.clear();
    }

    /// Size of the content after the node's own length prefix.
    ///
    /// This walks the whole subtree.
    pub fn content_size(&self) -> u64 {
        let attrs: u64 = self.attributes.iter().map(Attribute::total_size).sum();
        let children: u64 = self.children.iter().map(Self::total_size).sum();
        4 + 4 + dyn_len::prefixed_size(self.name.len()) + attrs + children
    }

    /// Size of the node including its length prefix.
    pub fn total_size(&self) -> u64 {
        let content = self.content_size();
        dyn_len::encoded_len(content) + content
    }

    /// Writes the binary encoding of this tree.
    ///
    /// # Errors
    ///
    /// See [`crate::to_writer`].
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<()> {
        crate::ser::to_writer(writer, self)
    }

    /// Reads one binary-encoded tree.
    ///
    /// Data after the tree is left unread.
    ///
    /// # Errors
    ///
    /// See [`crate::from_reader`].
    pub fn read_from<R: io::Read>(reader: R) -> Result<Self> {
        crate::de::Deserializer::new(IoRead::new(reader)).read_node()
    }

    pub(crate) fn from_parts(
        name: String,
        attributes: Vec<Attribute>,
        children: Vec<Self>,
    ) -> Self {
        Self {
            name,
            attributes,
            children,
        }
    }
}
