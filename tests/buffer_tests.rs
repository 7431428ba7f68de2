//! Input buffers as seen through the engine: EOI behavior, line mapping
//! and the indentation preprocessor.

mod common;

use common::run_basic;
use parsley::{
    BasicParseRunner, Grammar, IndentDedentInputBuffer, ParseErrorKind, ParseRunner,
};

#[test]
fn test_eoi_only_matches_through_the_eoi_rule() {
    let mut g = Grammar::<()>::new();
    let a = g.ch('a');
    let eoi = g.eoi();
    let exact = g.sequence(&[a, eoi]).unwrap();

    assert!(run_basic(&g, exact, "a").matched);
    assert!(!run_basic(&g, exact, "ab").matched);

    let any = g.any();
    let loose = g.sequence(&[a, any]).unwrap();
    assert!(!run_basic(&g, loose, "a").matched);
}

#[test]
fn test_eoi_matches_repeatedly_past_the_end() {
    // The buffer is conceptually infinite: every index at or past the
    // length yields EOI.
    let mut g = Grammar::<()>::new();
    let eoi = g.eoi();
    let twice = g.sequence(&[eoi, eoi]).unwrap();
    assert!(run_basic(&g, twice, "").matched);
}

#[test]
fn test_indented_block_grammar() {
    let mut g = Grammar::<()>::new();
    let a = g.ch('a');
    let b = g.ch('b');
    let nl = g.ch('\n');
    let indent = g.indent();
    let dedent = g.dedent();
    let eoi = g.eoi();
    let block = g.sequence(&[a, nl, indent, b, nl, dedent, eoi]).unwrap();

    let buffer = IndentDedentInputBuffer::new("a\n  b\n").unwrap();
    let result = BasicParseRunner::new(&g, block)
        .run_buffer(Box::new(buffer))
        .unwrap();
    assert!(result.matched);
}

#[test]
fn test_nested_indentation_levels() {
    let mut g = Grammar::<()>::new();
    let line = {
        let letter = g.char_range('a', 'z');
        let nl = g.ch('\n');
        g.sequence(&[letter, nl]).unwrap()
    };
    let indent = g.indent();
    let dedent = g.dedent();
    let block = g.declare("Block");
    let nested = g.sequence(&[indent, block, dedent]).unwrap();
    let item = g.first_of(&[line, nested]).unwrap();
    let body = g.one_or_more(item);
    g.define(block, body).unwrap();
    let eoi = g.eoi();
    let unit = g.sequence(&[block, eoi]).unwrap();

    let source = "a\n  b\n  c\nd\n";
    let buffer = IndentDedentInputBuffer::new(source).unwrap();
    let result = BasicParseRunner::new(&g, unit)
        .run_buffer(Box::new(buffer))
        .unwrap();
    assert!(result.matched);
}

#[test]
fn test_mixed_indentation_is_an_error() {
    let err = IndentDedentInputBuffer::new("a\n\t  b\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::IllegalIndentation);
    assert_eq!(err.start, 3);
}

#[test]
fn test_error_positions_map_through_the_indent_buffer() {
    let mut g = Grammar::<()>::new();
    let a = g.ch('a');
    let nl = g.ch('\n');
    let indent = g.indent();
    let b = g.ch('b');
    let block = g.sequence(&[a, nl, indent, b]).unwrap();

    let buffer = IndentDedentInputBuffer::new("a\n  x\n").unwrap();
    let result = parsley::ReportingParseRunner::new(&g, block)
        .run_buffer(Box::new(buffer))
        .unwrap();
    assert!(!result.matched);
    let error = &result.parse_errors[0];
    // The failure is at the converted 'x'; its position resolves to the
    // original line and column.
    let position = result.buffer.position_of(error.start);
    assert_eq!((position.line, position.column), (2, 3));
    assert_eq!(result.buffer.extract_line(2), "  x");
}
