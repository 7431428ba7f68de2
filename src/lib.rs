//! parsley - a runtime Parsing Expression Grammar engine.
//!
//! Grammars are composed in-process from primitive matchers and executed
//! against a character input by recursive descent with backtracking,
//! producing a parse tree, a success flag and diagnostic errors.
//!
//! ```
//! use parsley::{BasicParseRunner, Grammar, ParseRunner};
//!
//! let mut g = Grammar::<()>::new();
//! let digit = g.char_range('0', '9');
//! let number = g.one_or_more(digit);
//! let number = g.label(number, "Number");
//!
//! let result = BasicParseRunner::new(&g, number).run("42").unwrap();
//! assert!(result.matched);
//! ```

pub mod buffers;
pub mod chars;
pub mod errors;
pub mod grammar;
pub mod runners;
pub mod runtime;

pub use buffers::{DefaultInputBuffer, IndentDedentInputBuffer, InputBuffer, Position};
pub use errors::{
    print_parse_error, print_parse_errors, ActionError, GrammarError, MatcherPath, ParseDiagnostic,
    ParseError, ParseErrorKind, PathElement,
};
pub use grammar::{CharSet, Grammar, Label, MatchKind, Matcher, NodeFlags, RuleId};
pub use runners::{
    BasicParseRunner, ParseRunner, ParsingResult, RecoveringParseRunner, ReportingParseRunner,
    TraceEvent, TraceLog, TracePhase, TraceSink, TracingParseRunner, WriterSink,
};
pub use runtime::{print_node_tree, ActionContext, Node, NodeVisitor, ValueStack};
