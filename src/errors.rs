//! Error model: parse errors with matcher paths, construction-time grammar
//! errors, and the textual and miette-based report surfaces.
//!
//! Ordinary match failures are not errors; matchers return false and the
//! engine backtracks. A [`ParseError`] is only produced by the reporting
//! and recovering runners (invalid input, repairs), by a faulting user
//! action, or by the indentation preprocessor. [`GrammarError`] means the
//! matcher graph itself is malformed; it is surfaced synchronously and
//! never enters a `ParsingResult`.

use std::fmt;

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::Serialize;
use thiserror::Error;

use crate::buffers::InputBuffer;
use crate::chars;
use crate::grammar::RuleId;

// ============================================================================
// PARSE ERRORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseErrorKind {
    /// The input did not match at some index.
    InvalidInput,
    /// A user predicate raised a fault.
    ActionException,
    /// The indentation preprocessor found a mixed tab/space prefix.
    IllegalIndentation,
}

/// A diagnostic record attached to a [`crate::runners::ParsingResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub start: usize,
    pub end: usize,
    pub message: Option<String>,
    /// Labels selected for "expected" reporting, in discovery order.
    pub expected: Vec<String>,
    /// The failed matcher path, when one was captured.
    pub path: Option<MatcherPath>,
}

impl ParseError {
    pub fn invalid_input(
        start: usize,
        end: usize,
        message: Option<String>,
        expected: Vec<String>,
        path: Option<MatcherPath>,
    ) -> Self {
        Self { kind: ParseErrorKind::InvalidInput, start, end, message, expected, path }
    }

    pub fn action_exception(index: usize, message: String, path: MatcherPath) -> Self {
        Self {
            kind: ParseErrorKind::ActionException,
            start: index,
            end: index,
            message: Some(message),
            expected: Vec::new(),
            path: Some(path),
        }
    }

    pub fn illegal_indentation(index: usize) -> Self {
        Self {
            kind: ParseErrorKind::IllegalIndentation,
            start: index,
            end: index + 1,
            message: Some("illegal indentation, mixed tabs and spaces".to_string()),
            expected: Vec::new(),
            path: None,
        }
    }

    fn message_or_default(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => match self.kind {
                ParseErrorKind::InvalidInput => "invalid input".to_string(),
                ParseErrorKind::ActionException => "parser action failed".to_string(),
                ParseErrorKind::IllegalIndentation => "illegal indentation".to_string(),
            },
        }
    }

    /// Adapts the error to a miette diagnostic over the given source text.
    pub fn to_diagnostic(&self, source_name: &str, source: &str) -> ParseDiagnostic {
        let message = self.message_or_default();
        let src = NamedSource::new(source_name, source.to_string());
        let span = char_span(source, self.start, self.end);
        match self.kind {
            ParseErrorKind::InvalidInput => ParseDiagnostic::InvalidInput { message, src, span },
            ParseErrorKind::ActionException => {
                ParseDiagnostic::ActionException { message, src, span }
            }
            ParseErrorKind::IllegalIndentation => {
                ParseDiagnostic::IllegalIndentation { message, src, span }
            }
        }
    }
}

/// Maps a char-index range onto the byte-offset span miette expects.
fn char_span(source: &str, start: usize, end: usize) -> SourceSpan {
    let byte_at = |index: usize| {
        source
            .char_indices()
            .nth(index)
            .map(|(b, _)| b)
            .unwrap_or(source.len())
    };
    let from = byte_at(start);
    let to = byte_at(end.max(start));
    (from..to.max(from)).into()
}

/// Rich diagnostic form of a [`ParseError`] for terminal reporting.
#[derive(Debug, Error, Diagnostic)]
pub enum ParseDiagnostic {
    #[error("{message}")]
    #[diagnostic(code(parsley::invalid_input))]
    InvalidInput {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("unexpected input here")]
        span: SourceSpan,
    },
    #[error("{message}")]
    #[diagnostic(code(parsley::action_exception))]
    ActionException {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("action raised here")]
        span: SourceSpan,
    },
    #[error("{message}")]
    #[diagnostic(code(parsley::illegal_indentation))]
    IllegalIndentation {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("mixed indentation here")]
        span: SourceSpan,
    },
}

// ============================================================================
// MATCHER PATHS
// ============================================================================

/// Root-to-leaf chain of `(matcher, start index)` describing where a match
/// or failure occurred.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatcherPath {
    pub elements: Vec<PathElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathElement {
    pub rule: RuleId,
    pub label: String,
    pub custom_label: bool,
    pub start: usize,
}

impl MatcherPath {
    pub fn leaf(&self) -> Option<&PathElement> {
        self.elements.last()
    }

    /// The deepest custom-labelled matcher on the path whose frame began
    /// exactly at the error index. A pure function of the path.
    pub fn find_proper_label_matcher(&self, error_index: usize) -> Option<&PathElement> {
        self.elements
            .iter()
            .filter(|e| e.custom_label && e.start == error_index)
            .last()
    }

    /// The label to present in "expected" messages: the proper label
    /// matcher if any, the leaf matcher's own label otherwise.
    pub fn expected_label(&self, error_index: usize) -> Option<&str> {
        self.find_proper_label_matcher(error_index)
            .or_else(|| self.leaf())
            .map(|e| e.label.as_str())
    }
}

impl fmt::Display for MatcherPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(&element.label)?;
        }
        Ok(())
    }
}

// ============================================================================
// GRAMMAR AND ACTION ERRORS
// ============================================================================

/// The matcher graph itself is malformed. Fatal: aborts construction or
/// the run, and never appears in `parse_errors`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum GrammarError {
    #[error("a sequence requires at least one subrule")]
    #[diagnostic(code(parsley::grammar::empty_sequence))]
    EmptySequence,
    #[error("a choice requires at least one alternative")]
    #[diagnostic(code(parsley::grammar::empty_choice))]
    EmptyChoice,
    #[error("a character class requires at least one character")]
    #[diagnostic(code(parsley::grammar::empty_char_set))]
    EmptyCharSet,
    #[error("a string rule requires at least one character")]
    #[diagnostic(code(parsley::grammar::empty_string))]
    EmptyString,
    #[error("rule '{0}' was declared but never defined")]
    #[diagnostic(code(parsley::grammar::undefined_rule))]
    UndefinedRule(String),
    #[error("rule '{0}' is already defined")]
    #[diagnostic(code(parsley::grammar::redefined_rule))]
    RedefinedRule(String),
}

/// Fault raised by a user action. Converted to an
/// [`ParseErrorKind::ActionException`] at the frame boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ActionError {
    pub message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

// ============================================================================
// REPORT FORMATTING
// ============================================================================

/// Builds the message of an invalid-input error: the offending character
/// plus the expected labels.
pub(crate) fn invalid_input_message(
    buffer: &dyn InputBuffer,
    error_index: usize,
    expected: &[String],
) -> String {
    let offending = buffer.char_at(error_index);
    let mut message = if offending == chars::EOI {
        "Unexpected end of input".to_string()
    } else {
        format!("Invalid input '{}'", chars::escape(offending))
    };
    match expected {
        [] => {}
        [label] => {
            message.push_str(", expected ");
            message.push_str(label);
        }
        [init @ .., last] => {
            message.push_str(", expected ");
            message.push_str(&init.join(", "));
            message.push_str(" or ");
            message.push_str(last);
        }
    }
    message
}

/// Assembles the invalid-input error for the deepest failure, selecting
/// one expected label per failed path.
pub(crate) fn create_invalid_input_error(
    buffer: &dyn InputBuffer,
    error_index: usize,
    failed: &[MatcherPath],
) -> ParseError {
    let mut expected: Vec<String> = Vec::new();
    for path in failed {
        if let Some(label) = path.expected_label(error_index) {
            if !expected.iter().any(|e| e == label) {
                expected.push(label.to_string());
            }
        }
    }
    let message = invalid_input_message(buffer, error_index, &expected);
    ParseError::invalid_input(
        error_index,
        error_index + 1,
        Some(message),
        expected,
        failed.first().cloned(),
    )
}

/// Pretty prints one parse error with its location in the buffer:
///
/// ```text
/// <message> (line L, pos C):
/// <line text>
/// <C-1 spaces><carets>
/// ```
pub fn print_parse_error(error: &ParseError, buffer: &dyn InputBuffer) -> String {
    let position = buffer.position_of(error.start);
    let line = buffer.extract_line(position.line);
    let line_len = line.chars().count();
    let caret_count = (error.end - error.start).min((line_len + 2).saturating_sub(position.column));
    format!(
        "{} (line {}, pos {}):\n{}\n{}{}\n",
        error.message_or_default(),
        position.line,
        position.column,
        line,
        " ".repeat(position.column - 1),
        "^".repeat(caret_count),
    )
}

/// Pretty prints all errors, separated by `---` lines.
pub fn print_parse_errors(errors: &[ParseError], buffer: &dyn InputBuffer) -> String {
    let mut out = String::new();
    for error in errors {
        if !out.is_empty() {
            out.push_str("---\n");
        }
        out.push_str(&print_parse_error(error, buffer));
    }
    out
}
