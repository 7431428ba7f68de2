use crate::buffers::InputBuffer;
use crate::errors::GrammarError;
use crate::grammar::{Grammar, RuleId};
use crate::runtime::{MatchHandler, MatcherContext};

use super::{run_with_handler, ParseRunner, ParsingResult};

/// One-pass runner. Returns success or failure with no diagnostics beyond
/// any action faults that occurred.
pub struct BasicParseRunner<'g, V: Clone> {
    grammar: &'g Grammar<V>,
    root: RuleId,
}

impl<'g, V: Clone> BasicParseRunner<'g, V> {
    pub fn new(grammar: &'g Grammar<V>, root: RuleId) -> Self {
        Self { grammar, root }
    }
}

impl<V: Clone> ParseRunner<V> for BasicParseRunner<'_, V> {
    fn run_buffer(
        &mut self,
        buffer: Box<dyn InputBuffer>,
    ) -> Result<ParsingResult<V>, GrammarError> {
        self.grammar.ensure_complete()?;
        let (matched, outcome) =
            run_with_handler(self.grammar, self.root, buffer.as_ref(), &mut BasicMatchHandler);
        Ok(ParsingResult::from_outcome(matched, outcome, buffer))
    }
}

/// Plain execution with no observation.
pub(crate) struct BasicMatchHandler;

impl<V: Clone> MatchHandler<V> for BasicMatchHandler {
    fn match_frame(&mut self, ctx: &mut MatcherContext<'_, V>) -> bool {
        ctx.execute(self)
    }
}
