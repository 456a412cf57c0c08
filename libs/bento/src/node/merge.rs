//! Moving subtrees between nodes and merging trees.

use std::mem;

use super::Node;
use crate::attr::Attribute;

impl Node {
    /// Removes all attributes and hands them to the caller.
    pub fn orphan_attributes(&mut self) -> Vec<Attribute> {
        mem::take(&mut self.attributes)
    }

    /// Removes all children and hands them to the caller.
    pub fn orphan_children(&mut self) -> Vec<Self> {
        mem::take(&mut self.children)
    }

    /// Removes the child at `index`. Returns [`None`] if out of bounds.
    pub fn orphan_child(&mut self, index: usize) -> Option<Self> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    /// Removes the first child named `name`.
    pub fn orphan_child_named(&mut self, name: &str) -> Option<Self> {
        let index = self.children.iter().position(|c| c.name == name)?;
        Some(self.children.remove(index))
    }

    /// Moves every attribute and child of `source` to the end of `self`.
    ///
    /// `source` is left empty, but keeps its name.
    pub fn adopt_from(&mut self, source: &mut Self) {
        self.attributes.append(&mut source.attributes);
        self.children.append(&mut source.children);
    }

    /// Merges `source` into `self`.
    ///
    /// - A non-empty source name replaces the name of `self`.
    /// - A source attribute overwrites the first attribute with the same name
    ///   and kind. Otherwise it is appended.
    /// - A source child is merged recursively into the first child with the
    ///   same name, regardless of its contents. Otherwise it is appended.
    ///
    /// Everything taken from `source` is copied.
    pub fn update_from(&mut self, source: &Self) {
        if !source.name.is_empty() {
            self.name.clone_from(&source.name);
        }

        for attr in &source.attributes {
            let existing = self
                .attributes
                .iter_mut()
                .find(|a| a.name() == attr.name() && a.value().same_kind(attr.value()));

            match existing {
                Some(existing) => *existing = attr.clone(),
                None => self.attributes.push(attr.clone()),
            }
        }

        for child in &source.children {
            match self.child_mut(&child.name) {
                Some(existing) => existing.update_from(child),
                None => self.children.push(child.clone()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn update_example() {
        let mut target = Node::new("cfg")
            .attr("a", 1i32)
            .attr("b", "x")
            .child_node(Node::new("k").attr("z", 0i32));
        let source = Node::new("")
            .attr("a", 2i32)
            .attr("b", 5i32)
            .child_node(Node::new("k").attr("z", 9i32))
            .child_node(Node::new("m"));

        target.update_from(&source);

        let expected = Node::new("cfg")
            .attr("a", 2i32)
            .attr("b", "x")
            .attr("b", 5i32)
            .child_node(Node::new("k").attr("z", 9i32))
            .child_node(Node::new("m"));
        assert_eq!(target, expected, "merge result must match");
    }

    #[test]
    fn update_replaces_name() {
        let mut target = Node::new("old");
        target.update_from(&Node::new("new"));
        assert_eq!(target.name(), "new", "non-empty source name wins");
    }

    #[test]
    fn adopt_moves_everything() {
        let mut dest = Node::new("d").attr("x", 1u8);
        let mut source = Node::new("s")
            .attr("y", 2u8)
            .child_node(Node::new("c1"))
            .child_node(Node::new("c2"));

        dest.adopt_from(&mut source);

        assert_eq!(dest.attributes().len(), 2, "attributes appended");
        assert_eq!(dest.attributes()[1].value(), &Value::U8(2), "in order");
        let names: Vec<_> = dest.children().iter().map(Node::name).collect();
        assert_eq!(names, ["c1", "c2"], "children appended in order");

        assert!(source.attributes().is_empty(), "source has no attributes");
        assert!(source.children().is_empty(), "source has no children");
        assert_eq!(source.name(), "s", "source keeps its name");
    }

    #[test]
    fn orphans() {
        let mut node = Node::new("n")
            .attr("a", true)
            .child_node(Node::new("x"))
            .child_node(Node::new("y"));

        assert!(node.orphan_child(5).is_none(), "out of bounds is a no-op");
        let y = node.orphan_child_named("y").expect("exists");
        assert_eq!(y.name(), "y", "named orphan");
        assert!(node.orphan_child_named("y").is_none(), "already gone");

        let x = node.orphan_child(0).expect("exists");
        assert_eq!(x.name(), "x", "indexed orphan");

        let attrs = node.orphan_attributes();
        assert_eq!(attrs.len(), 1, "attributes handed over");
        assert!(node.attributes().is_empty(), "none left");
        assert!(node.orphan_children().is_empty(), "no children left");
    }
}
