//! The reporting runner: deepest failure location, expected labels and the
//! textual error report.

use parsley::{
    print_parse_error, print_parse_errors, DefaultInputBuffer, Grammar, ParseErrorKind,
    ParseRunner, ReportingParseRunner, RuleId,
};

fn abc(g: &mut Grammar<()>) -> RuleId {
    let a = g.ch('a');
    let b = g.ch('b');
    let c = g.ch('c');
    g.sequence(&[a, b, c]).unwrap()
}

#[test]
fn test_reports_the_deepest_failure_with_its_expected_label() {
    let mut g = Grammar::<()>::new();
    let rule = abc(&mut g);

    let result = ReportingParseRunner::new(&g, rule).run("abX").unwrap();
    assert!(!result.matched);
    assert_eq!(result.parse_errors.len(), 1);

    let error = &result.parse_errors[0];
    assert_eq!(error.kind, ParseErrorKind::InvalidInput);
    assert_eq!((error.start, error.end), (2, 3));
    assert_eq!(error.expected, ["'c'"]);
    assert_eq!(
        error.message.as_deref(),
        Some("Invalid input 'X', expected 'c'")
    );
    let path = error.path.as_ref().unwrap();
    assert_eq!(path.to_string(), "Sequence/'c'");
}

#[test]
fn test_success_reports_no_errors() {
    let mut g = Grammar::<()>::new();
    let rule = abc(&mut g);
    let result = ReportingParseRunner::new(&g, rule).run("abc").unwrap();
    assert!(result.matched);
    assert!(result.parse_errors.is_empty());
    assert!(result.parse_tree_root.is_some());
}

#[test]
fn test_alternatives_merge_into_one_expected_list() {
    let mut g = Grammar::<()>::new();
    let plus = g.ch('+');
    let minus = g.ch('-');
    let op = g.first_of(&[plus, minus]).unwrap();

    let result = ReportingParseRunner::new(&g, op).run("x").unwrap();
    assert!(!result.matched);
    let error = &result.parse_errors[0];
    assert_eq!(error.expected, ["'+'", "'-'"]);
    assert_eq!(
        error.message.as_deref(),
        Some("Invalid input 'x', expected '+' or '-'")
    );
}

#[test]
fn test_custom_label_wins_over_leaf_labels() {
    let mut g = Grammar::<()>::new();
    let plus = g.ch('+');
    let minus = g.ch('-');
    let op = g.first_of(&[plus, minus]).unwrap();
    let op = g.label(op, "Operator");
    let digit = g.char_range('0', '9');
    let digit = g.label(digit, "Digit");
    let eoi = g.eoi();
    let clause = g.sequence(&[digit, op, digit, eoi]).unwrap();

    let result = ReportingParseRunner::new(&g, clause).run("1*5").unwrap();
    assert!(!result.matched);
    let error = &result.parse_errors[0];
    assert_eq!((error.start, error.end), (1, 2));
    // Both alternatives fail at index 1; the deepest custom label whose
    // frame began there covers them both.
    assert_eq!(error.expected, ["Operator"]);
}

#[test]
fn test_failure_at_end_of_input() {
    let mut g = Grammar::<()>::new();
    let a = g.ch('a');
    let b = g.ch('b');
    let rule = g.sequence(&[a, b]).unwrap();

    let result = ReportingParseRunner::new(&g, rule).run("a").unwrap();
    assert!(!result.matched);
    let error = &result.parse_errors[0];
    assert_eq!((error.start, error.end), (1, 2));
    assert_eq!(
        error.message.as_deref(),
        Some("Unexpected end of input, expected 'b'")
    );
}

#[test]
fn test_error_report_format() {
    let mut g = Grammar::<()>::new();
    let rule = abc(&mut g);
    let result = ReportingParseRunner::new(&g, rule).run("abX").unwrap();
    let report = print_parse_error(&result.parse_errors[0], result.buffer.as_ref());
    assert_eq!(report, "Invalid input 'X', expected 'c' (line 1, pos 3):\nabX\n  ^\n");
}

#[test]
fn test_error_report_locates_the_right_line() {
    let mut g = Grammar::<()>::new();
    let a = g.ch('a');
    let nl = g.ch('\n');
    let b = g.ch('b');
    let rule = g.sequence(&[a, nl, b]).unwrap();

    let result = ReportingParseRunner::new(&g, rule).run("a\nX").unwrap();
    let report = print_parse_error(&result.parse_errors[0], result.buffer.as_ref());
    assert_eq!(report, "Invalid input 'X', expected 'b' (line 2, pos 1):\nX\n^\n");
}

#[test]
fn test_multiple_errors_join_with_separators() {
    let mut g = Grammar::<()>::new();
    let rule = abc(&mut g);
    let result = ReportingParseRunner::new(&g, rule).run("abX").unwrap();
    let error = result.parse_errors[0].clone();
    let errors = vec![error.clone(), error];
    let report = print_parse_errors(&errors, result.buffer.as_ref());
    assert_eq!(report.matches("---\n").count(), 1);
    assert_eq!(report.matches("(line 1, pos 3)").count(), 2);
}

#[test]
fn test_diagnostic_conversion_carries_the_span() {
    let source = "abX";
    let buffer = DefaultInputBuffer::new(source);
    let mut g = Grammar::<()>::new();
    let rule = abc(&mut g);
    let result = ReportingParseRunner::new(&g, rule)
        .run_buffer(Box::new(buffer))
        .unwrap();
    let diagnostic = result.parse_errors[0].to_diagnostic("input", source);
    assert_eq!(
        diagnostic.to_string(),
        "Invalid input 'X', expected 'c'"
    );
}
