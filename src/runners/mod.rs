//! Parse runners.
//!
//! All runners wrap the same matching core and differ only in how they
//! react to a root-level failure: the basic runner reports nothing, the
//! reporting runner locates the deepest failure, the recovering runner
//! additionally repairs it, and the tracing runner narrates every frame.

use crate::buffers::{DefaultInputBuffer, InputBuffer};
use crate::errors::{print_parse_errors, GrammarError, ParseError};
use crate::grammar::{Grammar, RuleId};
use crate::runtime::{print_node_tree, MatchHandler, MatcherContext, Node, ParseOutcome, ValueStack};

mod basic;
mod recovering;
mod reporting;
mod tracing;

pub use basic::BasicParseRunner;
pub use recovering::{RecoveringParseRunner, DEFAULT_MAX_REPAIRS};
pub use reporting::ReportingParseRunner;
pub use tracing::{TraceEvent, TraceLog, TracePhase, TraceSink, TracingParseRunner, WriterSink};

/// Everything a parse produces.
#[derive(Debug)]
pub struct ParsingResult<V: Clone> {
    pub matched: bool,
    /// The top of the value stack after the parse, if any.
    pub result_value: Option<V>,
    /// The parse tree of a successful match.
    pub parse_tree_root: Option<Node<V>>,
    pub value_stack: ValueStack<V>,
    pub parse_errors: Vec<ParseError>,
    /// The buffer the parse actually ran against. The recovering runner
    /// substitutes its repaired buffer here.
    pub buffer: Box<dyn InputBuffer>,
}

impl<V: Clone> ParsingResult<V> {
    pub(crate) fn from_outcome(
        matched: bool,
        outcome: ParseOutcome<V>,
        buffer: Box<dyn InputBuffer>,
    ) -> Self {
        Self {
            matched,
            result_value: outcome.stack.peek().cloned(),
            parse_tree_root: if matched { outcome.tree } else { None },
            value_stack: outcome.stack,
            parse_errors: outcome.errors,
            buffer,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.parse_errors.is_empty()
    }

    /// The `[label] 'text'` rendering of the parse tree, or the empty
    /// string when there is none.
    pub fn print_tree(&self) -> String {
        self.parse_tree_root
            .as_ref()
            .map(|root| print_node_tree(root, self.buffer.as_ref()))
            .unwrap_or_default()
    }

    /// The textual report of all parse errors.
    pub fn print_errors(&self) -> String {
        print_parse_errors(&self.parse_errors, self.buffer.as_ref())
    }
}

/// Common runner surface: parse a string or a prepared buffer.
pub trait ParseRunner<V: Clone> {
    fn run_buffer(&mut self, buffer: Box<dyn InputBuffer>) -> Result<ParsingResult<V>, GrammarError>;

    fn run(&mut self, input: &str) -> Result<ParsingResult<V>, GrammarError> {
        self.run_buffer(Box::new(DefaultInputBuffer::new(input)))
    }
}

/// Runs one full pass over the buffer with the given handler.
pub(crate) fn run_with_handler<V: Clone>(
    grammar: &Grammar<V>,
    root: RuleId,
    buffer: &dyn InputBuffer,
    handler: &mut dyn MatchHandler<V>,
) -> (bool, ParseOutcome<V>) {
    let mut ctx = MatcherContext::new(grammar, buffer);
    let matched = ctx.run_rule(root, handler);
    (matched, ctx.into_outcome())
}
