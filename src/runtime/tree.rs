use serde::Serialize;

use crate::buffers::InputBuffer;
use crate::chars;

/// One node of the parse tree, immutable after construction.
///
/// The node covers the input range `[start, end)` and records the value
/// bound at its frame when it was created, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node<V> {
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub children: Vec<Node<V>>,
    pub value: Option<V>,
}

impl<V> Node<V> {
    pub(crate) fn new(
        label: String,
        start: usize,
        end: usize,
        children: Vec<Node<V>>,
        value: Option<V>,
    ) -> Self {
        Self { label, start, end, children, value }
    }

    /// The matched text of this node.
    pub fn text(&self, buffer: &dyn InputBuffer) -> String {
        buffer.extract(self.start, self.end)
    }

    /// Pre-order traversal. `enter` returning false skips the subtree.
    pub fn visit(&self, visitor: &mut dyn NodeVisitor<V>) {
        self.visit_at(visitor, 0);
    }

    fn visit_at(&self, visitor: &mut dyn NodeVisitor<V>, depth: usize) {
        if visitor.enter(self, depth) {
            for child in &self.children {
                child.visit_at(visitor, depth + 1);
            }
        }
        visitor.leave(self, depth);
    }
}

/// Read-only parse tree traversal.
pub trait NodeVisitor<V> {
    /// Called before the node's children; return false to skip them.
    fn enter(&mut self, node: &Node<V>, depth: usize) -> bool;

    fn leave(&mut self, _node: &Node<V>, _depth: usize) {}
}

/// Renders a tree in the `[label] 'text'` indented form, one node per
/// line. Zero-width nodes omit the text part.
pub fn print_node_tree<V>(node: &Node<V>, buffer: &dyn InputBuffer) -> String {
    struct Printer<'b> {
        buffer: &'b dyn InputBuffer,
        out: String,
    }

    impl<V> NodeVisitor<V> for Printer<'_> {
        fn enter(&mut self, node: &Node<V>, depth: usize) -> bool {
            for _ in 0..depth {
                self.out.push_str("  ");
            }
            self.out.push('[');
            self.out.push_str(&node.label);
            self.out.push(']');
            let text = node.text(self.buffer);
            if !text.is_empty() {
                self.out.push_str(" '");
                self.out.push_str(&chars::escape_str(&text));
                self.out.push('\'');
            }
            self.out.push('\n');
            true
        }
    }

    let mut printer = Printer { buffer, out: String::new() };
    node.visit(&mut printer);
    printer.out
}
