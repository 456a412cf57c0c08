use crate::dyn_len;
use crate::error::{Error, Result};
use crate::kind::Tag;
use crate::value::Value;

/// A named, typed leaf value in a [`Node`](crate::Node).
///
/// The kind of an attribute is fixed once it is constructed. Only its value
/// may be replaced, and only with one of the same kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    value: Value,
}

impl Attribute {
    /// Creates a new attribute.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The attribute value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The wire tag of the attribute's kind.
    pub fn tag(&self) -> Tag {
        self.value.tag()
    }

    /// Replaces the value, keeping the kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KindMismatch`] if `value` is of a different kind. The
    /// attribute is left unchanged in that case.
    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        if !self.value.same_kind(&value) {
            return Err(Error::KindMismatch {
                expected: self.value.tag(),
                found: value.tag(),
            });
        }

        self.value = value;
        Ok(())
    }

    /// Consumes the attribute, returning its value.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Size of the content after the attribute's own length prefix.
    pub fn content_size(&self) -> u64 {
        4 + dyn_len::prefixed_size(self.name.len()) + self.value.payload_size()
    }

    /// Size of the attribute including its length prefix.
    pub fn total_size(&self) -> u64 {
        let content = self.content_size();
        dyn_len::encoded_len(content) + content
    }
}
