use crate::buffers::InputBuffer;
use crate::errors::{create_invalid_input_error, GrammarError, MatcherPath};
use crate::grammar::{Grammar, RuleId};
use crate::runtime::{MatchHandler, MatcherContext};

use super::{run_with_handler, ParseRunner, ParsingResult};

/// Two-pass runner. The first pass records the farthest failure index; on
/// failure a second pass collects the matcher paths failing there and the
/// result carries a single invalid-input error with the selected expected
/// labels.
pub struct ReportingParseRunner<'g, V: Clone> {
    grammar: &'g Grammar<V>,
    root: RuleId,
}

impl<'g, V: Clone> ReportingParseRunner<'g, V> {
    pub fn new(grammar: &'g Grammar<V>, root: RuleId) -> Self {
        Self { grammar, root }
    }
}

impl<V: Clone> ParseRunner<V> for ReportingParseRunner<'_, V> {
    fn run_buffer(
        &mut self,
        buffer: Box<dyn InputBuffer>,
    ) -> Result<ParsingResult<V>, GrammarError> {
        self.grammar.ensure_complete()?;

        let mut recorder = RecordingMatchHandler::new();
        let (matched, outcome) =
            run_with_handler(self.grammar, self.root, buffer.as_ref(), &mut recorder);
        if matched {
            return Ok(ParsingResult::from_outcome(true, outcome, buffer));
        }

        let error_index = recorder.farthest.unwrap_or(0);
        let mut reporter = ReportingMatchHandler::new(error_index);
        let (_, mut outcome) =
            run_with_handler(self.grammar, self.root, buffer.as_ref(), &mut reporter);
        outcome.errors.push(create_invalid_input_error(
            buffer.as_ref(),
            error_index,
            &reporter.failed,
        ));
        Ok(ParsingResult::from_outcome(false, outcome, buffer))
    }
}

/// First pass: notes the farthest input index any failed frame reached.
pub(crate) struct RecordingMatchHandler {
    pub farthest: Option<usize>,
}

impl RecordingMatchHandler {
    pub fn new() -> Self {
        Self { farthest: None }
    }
}

impl<V: Clone> MatchHandler<V> for RecordingMatchHandler {
    fn match_frame(&mut self, ctx: &mut MatcherContext<'_, V>) -> bool {
        let matched = ctx.execute(self);
        if !matched {
            let reached = ctx.top().current;
            self.farthest = Some(self.farthest.map_or(reached, |f| f.max(reached)));
        }
        matched
    }
}

/// Second pass: collects the distinct paths of terminal matchers that
/// failed at the known error index.
pub(crate) struct ReportingMatchHandler {
    error_index: usize,
    pub failed: Vec<MatcherPath>,
}

impl ReportingMatchHandler {
    pub fn new(error_index: usize) -> Self {
        Self { error_index, failed: Vec::new() }
    }
}

impl<V: Clone> MatchHandler<V> for ReportingMatchHandler {
    fn match_frame(&mut self, ctx: &mut MatcherContext<'_, V>) -> bool {
        let matched = ctx.execute(self);
        if !matched
            && ctx.top().start == self.error_index
            && ctx.grammar().matcher(ctx.top().rule).kind.is_terminal()
        {
            let path = ctx.path();
            if !self.failed.contains(&path) {
                self.failed.push(path);
            }
        }
        matched
    }
}
