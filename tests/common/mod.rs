#![allow(dead_code)]

//! Shared helpers for the integration suites.

use parsley::{BasicParseRunner, Grammar, ParseRunner, ParsingResult, RuleId};

/// Runs a basic parse over a string input, panicking on grammar errors.
pub fn run_basic<V: Clone>(grammar: &Grammar<V>, root: RuleId, input: &str) -> ParsingResult<V> {
    BasicParseRunner::new(grammar, root)
        .run(input)
        .expect("grammar is complete")
}

/// Asserts a successful match whose tree renders exactly as expected.
pub fn assert_tree<V: Clone>(grammar: &Grammar<V>, root: RuleId, input: &str, expected: &str) {
    let result = run_basic(grammar, root, input);
    assert!(result.matched, "expected {input:?} to match");
    assert_eq!(result.print_tree(), expected);
}

/// Asserts that every node's children tile its range with no gaps or
/// overlaps.
pub fn assert_node_coverage<V: Clone>(node: &parsley::Node<V>) {
    let mut at = node.start;
    for child in &node.children {
        assert_eq!(child.start, at, "gap or overlap before [{}]", child.label);
        assert!(child.end >= child.start);
        at = child.end;
        assert_node_coverage(child);
    }
    if !node.children.is_empty() {
        assert_eq!(at, node.end, "children of [{}] do not reach its end", node.label);
    }
}
