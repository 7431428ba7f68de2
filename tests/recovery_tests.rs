//! The recovering runner: resynchronization, deletion and insertion
//! repairs, the progress requirement and the give-up path.

use parsley::{Grammar, ParseErrorKind, ParseRunner, RecoveringParseRunner, RuleId};

fn abc(g: &mut Grammar<()>) -> RuleId {
    let a = g.ch('a');
    let b = g.ch('b');
    let c = g.ch('c');
    g.sequence(&[a, b, c]).unwrap()
}

#[test]
fn test_clean_input_needs_no_repairs() {
    let mut g = Grammar::<()>::new();
    let rule = abc(&mut g);
    let result = RecoveringParseRunner::new(&g, rule).run("abc").unwrap();
    assert!(result.matched);
    assert!(result.parse_errors.is_empty());
}

#[test]
fn test_single_character_deletion() {
    let mut g = Grammar::<()>::new();
    let rule = abc(&mut g);

    let result = RecoveringParseRunner::new(&g, rule).run("abXc").unwrap();
    assert!(result.matched);
    assert_eq!(result.parse_errors.len(), 1);

    let error = &result.parse_errors[0];
    assert_eq!(error.kind, ParseErrorKind::InvalidInput);
    assert_eq!((error.start, error.end), (2, 3));
    assert_eq!(error.message.as_deref(), Some("Invalid input 'X', deleted"));

    // The tree spans the repaired stream.
    let root = result.parse_tree_root.as_ref().unwrap();
    assert_eq!((root.start, root.end), (0, 3));
    assert_eq!(result.buffer.extract(0, 3), "abc");
}

#[test]
fn test_single_character_insertion() {
    let mut g = Grammar::<()>::new();
    let a = g.ch('a');
    let b = g.ch('b');
    let c = g.ch('c');
    let d = g.ch('d');
    let rule = g.sequence(&[a, b, c, d]).unwrap();

    let result = RecoveringParseRunner::new(&g, rule).run("abd").unwrap();
    assert!(result.matched);
    assert_eq!(result.parse_errors.len(), 1);

    let error = &result.parse_errors[0];
    assert_eq!(error.start, 2);
    assert_eq!(error.message.as_deref(), Some("Expected 'c', inserted"));
    assert_eq!(error.expected, ["'c'"]);
    assert_eq!(result.buffer.extract(0, 4), "abcd");
}

#[test]
fn test_resynchronization_skips_a_junk_run() {
    let mut g = Grammar::<()>::new();
    let x = g.ch('x');
    let eq = g.ch('=');
    let digit = g.char_range('0', '9');
    let semi = g.ch(';');
    let rule = g.sequence(&[x, eq, digit, semi]).unwrap();

    let result = RecoveringParseRunner::new(&g, rule).run("x=##5;").unwrap();
    assert!(result.matched);
    assert_eq!(result.parse_errors.len(), 1);

    let error = &result.parse_errors[0];
    assert_eq!((error.start, error.end), (2, 4));
    assert_eq!(
        error.message.as_deref(),
        Some("Invalid input '##', resynchronized")
    );
    assert_eq!(result.buffer.extract(0, 4), "x=5;");
}

#[test]
fn test_repairs_accumulate_across_multiple_errors() {
    let mut g = Grammar::<()>::new();
    let rule = abc(&mut g);

    let result = RecoveringParseRunner::new(&g, rule).run("aXbXc").unwrap();
    assert!(result.matched);
    assert_eq!(result.parse_errors.len(), 2);
    assert!(result
        .parse_errors
        .iter()
        .all(|e| e.kind == ParseErrorKind::InvalidInput));
}

#[test]
fn test_gives_up_when_no_repair_helps() {
    let mut g = Grammar::<()>::new();
    let never = g.nothing();

    let result = RecoveringParseRunner::new(&g, never).run("x").unwrap();
    assert!(!result.matched);
    assert_eq!(result.parse_errors.len(), 1);
    assert_eq!(result.parse_errors[0].start, 0);
}

#[test]
fn test_repair_budget_bounds_the_loop() {
    let mut g = Grammar::<()>::new();
    let rule = abc(&mut g);

    let result = RecoveringParseRunner::new(&g, rule)
        .with_max_repairs(0)
        .run("abXc")
        .unwrap();
    assert!(!result.matched);
    assert_eq!(result.parse_errors.len(), 1);
    assert_eq!(result.parse_errors[0].expected, ["'c'"]);
}

#[test]
fn test_positions_still_report_against_the_original_text() {
    let mut g = Grammar::<()>::new();
    let rule = abc(&mut g);
    let result = RecoveringParseRunner::new(&g, rule).run("abXc").unwrap();
    // After the deletion the repaired index 2 maps back to the original
    // line and the original column of the surviving 'c'.
    let position = result.buffer.position_of(2);
    assert_eq!((position.line, position.column), (1, 4));
    assert_eq!(result.buffer.extract_line(1), "abXc");
}
