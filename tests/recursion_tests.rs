//! Recursive grammars through declare/define.

mod common;

use common::{assert_node_coverage, run_basic};
use parsley::Grammar;

#[test]
fn test_recursive_rule_builds_a_nested_tree() {
    let mut g = Grammar::<()>::new();
    let lots_of_as = g.declare("LotsOfAs");
    let a = g.ignore_case('a');
    let tail = g.optional(lots_of_as);
    let body = g.sequence(&[a, tail]).unwrap();
    g.define(lots_of_as, body).unwrap();

    let result = run_basic(&g, lots_of_as, "AaA");
    assert!(result.matched);
    let expected = [
        "[LotsOfAs] 'AaA'",
        "  ['a/A'] 'A'",
        "  [Optional] 'aA'",
        "    [LotsOfAs] 'aA'",
        "      ['a/A'] 'a'",
        "      [Optional] 'A'",
        "        [LotsOfAs] 'A'",
        "          ['a/A'] 'A'",
        "          [Optional]",
        "",
    ]
    .join("\n");
    assert_eq!(result.print_tree(), expected);
    assert_node_coverage(result.parse_tree_root.as_ref().unwrap());
}

#[test]
fn test_recursive_rule_fails_cleanly_on_non_matching_input() {
    let mut g = Grammar::<()>::new();
    let nested = g.declare("Nested");
    let open = g.ch('(');
    let close = g.ch(')');
    let inner = g.optional(nested);
    let body = g.sequence(&[open, inner, close]).unwrap();
    g.define(nested, body).unwrap();

    assert!(run_basic(&g, nested, "((()))").matched);
    assert!(run_basic(&g, nested, "()").matched);
    assert!(!run_basic(&g, nested, "((").matched);
}
