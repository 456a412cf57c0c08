use std::fmt::Write as _;
use std::io;

use super::value::{write_quoted, write_value};
use crate::attr::Attribute;
use crate::error::Result;
use crate::node::Node;
use crate::value::Value;

/// Writes trees in the text format.
///
/// Attributes of kinds the parser can infer (`strg`, `bool`, `vs32`) are
/// written without a `(type)` tag. Attributes of unknown kinds are skipped,
/// since they couldn't be parsed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Writer {
    indent: usize,
}

impl Default for Writer {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

impl Writer {
    /// Creates a writer with the default indentation of 2 spaces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indentation per nesting level. 0 writes everything on a single
    /// line.
    #[must_use]
    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Writes a tree to a [`String`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Range`](crate::Error::Range) if an instant can't be
    /// formatted.
    pub fn to_string(&self, node: &Node) -> Result<String> {
        let mut out = String::new();
        self.write_node(&mut out, node, 0)?;
        if self.indent != 0 {
            out.push('\n');
        }
        Ok(out)
    }

    /// Writes a tree to a [`io::Write`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::to_string`], and additionally fails if the writer
    /// fails.
    pub fn to_writer<W: io::Write>(&self, mut writer: W, node: &Node) -> Result<()> {
        let text = self.to_string(node)?;
        Ok(writer.write_all(text.as_bytes())?)
    }

    fn separator(&self, out: &mut String, depth: usize) {
        if self.indent == 0 {
            out.push(' ');
        } else {
            out.push('\n');
            out.extend(std::iter::repeat_n(' ', self.indent * depth));
        }
    }

    fn write_node(&self, out: &mut String, node: &Node, depth: usize) -> Result<()> {
        out.push('{');
        write_quoted(out, node.name());

        let mut has_body = false;
        for attr in node.attributes() {
            if let Value::Unknown { tag, .. } = attr.value() {
                log::warn!(
                    "skipping attribute `{}` of unknown kind `{tag}` in text output",
                    attr.name()
                );
                continue;
            }

            self.separator(out, depth + 1);
            write_attribute(out, attr)?;
            has_body = true;
        }

        for child in node.children() {
            self.separator(out, depth + 1);
            self.write_node(out, child, depth + 1)?;
            has_body = true;
        }

        if has_body && self.indent != 0 {
            self.separator(out, depth);
        }

        out.push('}');
        Ok(())
    }
}

fn write_attribute(out: &mut String, attr: &Attribute) -> Result<()> {
    out.push('[');
    write_quoted(out, attr.name());

    if let Some(kind) = attr.value().kind()
        && !kind.is_inferred()
    {
        _ = write!(out, "({kind})");
    }

    out.push('=');
    write_value(out, attr.value())?;
    out.push(']');
    Ok(())
}
