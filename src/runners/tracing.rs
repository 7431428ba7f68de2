use std::io::Write;

use crate::buffers::InputBuffer;
use crate::errors::GrammarError;
use crate::grammar::{Grammar, RuleId};
use crate::runtime::{MatchHandler, MatcherContext};

use super::{run_with_handler, ParseRunner, ParsingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracePhase {
    Enter,
    Matched,
    Mismatched,
}

/// One frame transition of a traced parse.
#[derive(Debug, Clone, Copy)]
pub struct TraceEvent<'a> {
    pub phase: TracePhase,
    pub label: &'a str,
    /// Frame depth, root at zero.
    pub depth: usize,
    /// Where the frame began.
    pub start: usize,
    /// The cursor at the time of the event.
    pub index: usize,
}

impl TraceEvent<'_> {
    /// The default one-line rendering used by the bundled sinks.
    pub fn render(&self) -> String {
        let pad = "  ".repeat(self.depth);
        match self.phase {
            TracePhase::Enter => format!("{}{}: try at {}", pad, self.label, self.start),
            TracePhase::Matched => {
                format!("{}{}: matched [{}..{})", pad, self.label, self.start, self.index)
            }
            TracePhase::Mismatched => {
                format!("{}{}: failed at {}", pad, self.label, self.index)
            }
        }
    }
}

/// Receives the per-frame events of a tracing run.
pub trait TraceSink {
    fn emit(&mut self, event: &TraceEvent<'_>);
}

/// Sink that collects rendered events in memory.
#[derive(Debug, Default)]
pub struct TraceLog {
    pub lines: Vec<String>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_text(&self) -> String {
        self.lines.join("\n")
    }
}

impl TraceSink for TraceLog {
    fn emit(&mut self, event: &TraceEvent<'_>) {
        self.lines.push(event.render());
    }
}

/// Sink that streams rendered events to a writer, best effort.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> TraceSink for WriterSink<W> {
    fn emit(&mut self, event: &TraceEvent<'_>) {
        let _ = writeln!(self.writer, "{}", event.render());
    }
}

/// Runner with basic semantics that additionally narrates every frame
/// through its sink.
pub struct TracingParseRunner<'g, V: Clone, S: TraceSink> {
    grammar: &'g Grammar<V>,
    root: RuleId,
    sink: S,
}

impl<'g, V: Clone, S: TraceSink> TracingParseRunner<'g, V, S> {
    pub fn new(grammar: &'g Grammar<V>, root: RuleId, sink: S) -> Self {
        Self { grammar, root, sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<V: Clone, S: TraceSink> ParseRunner<V> for TracingParseRunner<'_, V, S> {
    fn run_buffer(
        &mut self,
        buffer: Box<dyn InputBuffer>,
    ) -> Result<ParsingResult<V>, GrammarError> {
        self.grammar.ensure_complete()?;
        let mut handler = TracingMatchHandler { sink: &mut self.sink };
        let (matched, outcome) =
            run_with_handler(self.grammar, self.root, buffer.as_ref(), &mut handler);
        Ok(ParsingResult::from_outcome(matched, outcome, buffer))
    }
}

struct TracingMatchHandler<'s> {
    sink: &'s mut dyn TraceSink,
}

impl<V: Clone> MatchHandler<V> for TracingMatchHandler<'_> {
    fn match_frame(&mut self, ctx: &mut MatcherContext<'_, V>) -> bool {
        let grammar = ctx.grammar();
        let (rule, start) = {
            let frame = ctx.top();
            (frame.rule, frame.start)
        };
        let label = grammar.matcher(rule).label.text.as_str();
        let depth = ctx.depth() - 1;
        self.sink.emit(&TraceEvent {
            phase: TracePhase::Enter,
            label,
            depth,
            start,
            index: start,
        });
        let matched = ctx.execute(self);
        self.sink.emit(&TraceEvent {
            phase: if matched { TracePhase::Matched } else { TracePhase::Mismatched },
            label,
            depth,
            start,
            index: ctx.top().current,
        });
        matched
    }
}
