//! The matching runtime: per-invocation matcher contexts, the value stack
//! and the parse tree.

mod context;
mod stack;
mod tree;

pub use context::{ActionContext, Frame, MatchHandler, MatcherContext, ParseOutcome};
pub use stack::{StackSnapshot, ValueStack};
pub use tree::{print_node_tree, Node, NodeVisitor};
