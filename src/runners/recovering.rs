//! Error recovery.
//!
//! The recovering runner locates the deepest failure with the reporting
//! machinery, then tries local repairs at the error index in a fixed
//! order: resynchronize to a follow character of an enclosing sequence,
//! delete the offending character, insert the expected character. A repair
//! is kept only when a re-run consumes strictly more input than the
//! failing baseline; every kept repair is recorded as a parse error and
//! the loop continues on the repaired buffer.
//!
//! Repairs are edits on a provenance-tracking buffer: the final result is
//! positioned on the repaired character stream while line and column
//! lookups still resolve against the original text.

use crate::buffers::{DefaultInputBuffer, InputBuffer, Position};
use crate::chars;
use crate::errors::{
    create_invalid_input_error, GrammarError, MatcherPath, ParseError, ParseErrorKind,
};
use crate::grammar::{Grammar, MatchKind, RuleId};

use super::reporting::{RecordingMatchHandler, ReportingMatchHandler};
use super::{run_with_handler, ParseRunner, ParsingResult};

/// Default bound on the number of repairs attempted before giving up.
pub const DEFAULT_MAX_REPAIRS: usize = 10;

/// Runner that repairs syntax errors and keeps parsing.
///
/// `matched` in the result reflects whether the repairs sufficed; the
/// errors of every applied repair survive into `parse_errors`.
pub struct RecoveringParseRunner<'g, V: Clone> {
    grammar: &'g Grammar<V>,
    root: RuleId,
    max_repairs: usize,
}

impl<'g, V: Clone> RecoveringParseRunner<'g, V> {
    pub fn new(grammar: &'g Grammar<V>, root: RuleId) -> Self {
        Self { grammar, root, max_repairs: DEFAULT_MAX_REPAIRS }
    }

    /// Overrides the repair budget.
    pub fn with_max_repairs(mut self, max_repairs: usize) -> Self {
        self.max_repairs = max_repairs;
        self
    }

    /// True when a re-run over the candidate buffer gets strictly past the
    /// baseline error index.
    fn progressed(&self, candidate: &RecoveryBuffer, baseline: usize) -> bool {
        let mut recorder = RecordingMatchHandler::new();
        let (matched, _) = run_with_handler(self.grammar, self.root, candidate, &mut recorder);
        matched || recorder.farthest.map_or(false, |f| f > baseline)
    }

    /// Repair 1: skip input up to the first character some follow matcher
    /// of an enclosing sequence can start with.
    fn try_resync(
        &self,
        work: &RecoveryBuffer,
        index: usize,
        failed: &[MatcherPath],
    ) -> Option<(RecoveryBuffer, ParseError)> {
        let followers = self.follow_matchers(failed);
        if followers.is_empty() {
            return None;
        }
        let mut skip = 0;
        loop {
            let c = work.char_at(index + skip);
            if c == chars::EOI {
                return None;
            }
            if followers.iter().any(|&r| self.grammar.can_start_with(r, c)) {
                break;
            }
            skip += 1;
        }
        if skip < 2 {
            // Zero or one character of junk is deletion's job.
            return None;
        }
        let skipped = work.extract(index, index + skip);
        let mut candidate = work.clone();
        candidate.delete(index, skip);
        if !self.progressed(&candidate, index) {
            return None;
        }
        let error = ParseError {
            kind: ParseErrorKind::InvalidInput,
            start: index,
            end: index + skip,
            message: Some(format!(
                "Invalid input '{}', resynchronized",
                chars::escape_str(&skipped)
            )),
            expected: Vec::new(),
            path: failed.first().cloned(),
        };
        Some((candidate, error))
    }

    /// Repair 2: drop the single character at the error index.
    fn try_delete(
        &self,
        work: &RecoveryBuffer,
        index: usize,
    ) -> Option<(RecoveryBuffer, ParseError)> {
        if index >= work.length() {
            return None;
        }
        let removed = work.char_at(index);
        let mut candidate = work.clone();
        candidate.delete(index, 1);
        if !self.progressed(&candidate, index) {
            return None;
        }
        let error = ParseError {
            kind: ParseErrorKind::InvalidInput,
            start: index,
            end: index + 1,
            message: Some(format!("Invalid input '{}', deleted", chars::escape(removed))),
            expected: Vec::new(),
            path: None,
        };
        Some((candidate, error))
    }

    /// Repair 3: virtually insert the character the expected-label matcher
    /// wants. `EOI` is never inserted.
    fn try_insert(
        &self,
        work: &RecoveryBuffer,
        index: usize,
        located: &ParseError,
    ) -> Option<(RecoveryBuffer, ParseError)> {
        let leaf = located.path.as_ref()?.leaf()?;
        let wanted = self.grammar.starter_char(leaf.rule)?;
        if wanted == chars::EOI {
            return None;
        }
        let mut candidate = work.clone();
        candidate.insert(index, wanted);
        if !self.progressed(&candidate, index) {
            return None;
        }
        let error = ParseError {
            kind: ParseErrorKind::InvalidInput,
            start: index,
            end: index + 1,
            message: Some(format!("Expected '{}', inserted", chars::escape(wanted))),
            expected: located.expected.clone(),
            path: located.path.clone(),
        };
        Some((candidate, error))
    }

    /// The matchers a resynchronization may skip to: the failed leaf
    /// itself (junk before the expected input) plus, for every enclosing
    /// sequence on a failed path, everything after the on-path child.
    fn follow_matchers(&self, failed: &[MatcherPath]) -> Vec<RuleId> {
        let mut followers = Vec::new();
        for path in failed {
            if let Some(leaf) = path.leaf() {
                if !followers.contains(&leaf.rule) {
                    followers.push(leaf.rule);
                }
            }
            for window in path.elements.windows(2) {
                let (element, next) = (&window[0], &window[1]);
                if let MatchKind::Sequence(children) = &self.grammar.matcher(element.rule).kind {
                    for (i, &child) in children.iter().enumerate() {
                        if child == next.rule {
                            for &follower in &children[i + 1..] {
                                if !followers.contains(&follower) {
                                    followers.push(follower);
                                }
                            }
                        }
                    }
                }
            }
        }
        followers
    }
}

impl<V: Clone> ParseRunner<V> for RecoveringParseRunner<'_, V> {
    fn run_buffer(
        &mut self,
        buffer: Box<dyn InputBuffer>,
    ) -> Result<ParsingResult<V>, GrammarError> {
        self.grammar.ensure_complete()?;

        let mut work = RecoveryBuffer::new(buffer.as_ref());
        let mut repair_errors: Vec<ParseError> = Vec::new();
        let mut repairs = 0;

        loop {
            let mut recorder = RecordingMatchHandler::new();
            let (matched, mut outcome) =
                run_with_handler(self.grammar, self.root, &work, &mut recorder);
            if matched {
                let mut parse_errors = repair_errors;
                parse_errors.append(&mut outcome.errors);
                return Ok(ParsingResult {
                    matched: true,
                    result_value: outcome.stack.peek().cloned(),
                    parse_tree_root: outcome.tree,
                    value_stack: outcome.stack,
                    parse_errors,
                    buffer: Box::new(work),
                });
            }

            // Locate the failure and collect its paths.
            let error_index = recorder.farthest.unwrap_or(0);
            let mut reporter = ReportingMatchHandler::new(error_index);
            let (_, mut outcome) = run_with_handler(self.grammar, self.root, &work, &mut reporter);
            let located = create_invalid_input_error(&work, error_index, &reporter.failed);

            let repair = if repairs < self.max_repairs {
                self.try_resync(&work, error_index, &reporter.failed)
                    .or_else(|| self.try_delete(&work, error_index))
                    .or_else(|| self.try_insert(&work, error_index, &located))
            } else {
                None
            };

            match repair {
                Some((repaired, error)) => {
                    work = repaired;
                    repair_errors.push(error);
                    repairs += 1;
                }
                None => {
                    // All repairs exhausted: give up with a fatal error.
                    let mut parse_errors = repair_errors;
                    parse_errors.push(located);
                    parse_errors.append(&mut outcome.errors);
                    return Ok(ParsingResult {
                        matched: false,
                        result_value: outcome.stack.peek().cloned(),
                        parse_tree_root: None,
                        value_stack: outcome.stack,
                        parse_errors,
                        buffer: Box::new(work),
                    });
                }
            }
        }
    }
}

/// Editable character buffer that remembers, for every character, the
/// original index it came from. Inserted characters borrow the index of
/// their insertion point.
#[derive(Clone, Debug)]
struct RecoveryBuffer {
    chars: Vec<char>,
    origins: Vec<usize>,
    inner: DefaultInputBuffer,
}

impl RecoveryBuffer {
    fn new(buffer: &dyn InputBuffer) -> Self {
        let len = buffer.length();
        Self {
            chars: (0..len).map(|i| buffer.char_at(i)).collect(),
            origins: (0..len).collect(),
            inner: DefaultInputBuffer::new(&buffer.extract(0, len)),
        }
    }

    fn origin_of(&self, index: usize) -> usize {
        self.origins
            .get(index)
            .copied()
            .unwrap_or(self.inner.length())
    }

    fn delete(&mut self, start: usize, count: usize) {
        let end = (start + count).min(self.chars.len());
        self.chars.drain(start..end);
        self.origins.drain(start..end);
    }

    fn insert(&mut self, index: usize, c: char) {
        let origin = self.origin_of(index);
        self.chars.insert(index, c);
        self.origins.insert(index, origin);
    }
}

impl InputBuffer for RecoveryBuffer {
    fn char_at(&self, index: usize) -> char {
        self.chars.get(index).copied().unwrap_or(chars::EOI)
    }

    fn length(&self) -> usize {
        self.chars.len()
    }

    fn extract(&self, start: usize, end: usize) -> String {
        let start = start.min(self.chars.len());
        let end = end.clamp(start, self.chars.len());
        self.chars[start..end].iter().collect()
    }

    fn extract_line(&self, line: usize) -> String {
        self.inner.extract_line(line)
    }

    fn position_of(&self, index: usize) -> Position {
        self.inner.position_of(self.origin_of(index))
    }

    fn line_count(&self) -> usize {
        self.inner.line_count()
    }
}
