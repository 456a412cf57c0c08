//! XML-like rendering of trees, for diagnostics.
//!
//! This is output only. Values use the same text forms as the
//! [text format](crate::text); unknown kinds show their raw bytes as hex.
//!
//! ```text
//! <node name="root">
//!   <attr name="count" type="vs32">5</attr>
//!   <node name="child"/>
//! </node>
//! ```

use crate::error::Result;
use crate::node::Node;
use crate::text::write_value;

/// Renders a tree as indented XML-like text.
///
/// # Errors
///
/// Returns [`Error::Range`](crate::Error::Range) if an instant can't be
/// formatted.
pub fn to_string(node: &Node) -> Result<String> {
    let mut out = String::new();
    let mut scratch = String::new();
    write_node(&mut out, &mut scratch, node, 0)?;
    Ok(out)
}

fn write_node(out: &mut String, scratch: &mut String, node: &Node, depth: usize) -> Result<()> {
    indent(out, depth);
    out.push_str("<node name=\"");
    escape_into(out, node.name());
    out.push('"');

    if node.attributes().is_empty() && node.children().is_empty() {
        out.push_str("/>\n");
        return Ok(());
    }

    out.push_str(">\n");

    for attr in node.attributes() {
        indent(out, depth + 1);
        out.push_str("<attr name=\"");
        escape_into(out, attr.name());
        out.push_str("\" type=\"");
        escape_into(out, &attr.tag().to_string());
        out.push_str("\">");

        scratch.clear();
        write_value(scratch, attr.value())?;
        escape_into(out, scratch);
        out.push_str("</attr>\n");
    }

    for child in node.children() {
        write_node(out, scratch, child, depth + 1)?;
    }

    indent(out, depth);
    out.push_str("</node>\n");
    Ok(())
}

fn indent(out: &mut String, depth: usize) {
    out.extend(std::iter::repeat_n(' ', depth * 2));
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
}
