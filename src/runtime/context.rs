//! The match protocol.
//!
//! [`MatcherContext`] owns the frame stack of one parse. The universal
//! contract lives in [`MatcherContext::run_rule`]: push a frame at the
//! parent cursor, snapshot the value stack, delegate to the handler, and
//! either attach the frame's result to the parent or roll everything back.
//! Backtracking therefore costs one discarded frame and one snapshot
//! restore, never an explicit undo per matcher.
//!
//! Handlers wrap the per-variant execution in [`MatcherContext::execute`];
//! the runners differ only in what their handler observes around it.

use crate::buffers::InputBuffer;
use crate::chars;
use crate::errors::{MatcherPath, ParseError, PathElement};
use crate::grammar::{Grammar, MatchKind, RuleId};

use super::stack::ValueStack;
use super::tree::Node;

/// Per-invocation record of one matcher's execution.
#[derive(Debug)]
pub struct Frame<V> {
    pub rule: RuleId,
    /// Input cursor when the frame began.
    pub start: usize,
    /// Live cursor, advanced by child successes.
    pub current: usize,
    /// Tree nodes emitted by successful children, in order.
    pub sub_nodes: Vec<Node<V>>,
    /// Semantic value bound to the frame, set by actions.
    pub value: Option<V>,
    /// Scratch counter; repetition matchers keep their iteration count here.
    pub int_tag: usize,
    /// Inherited node suppression for this frame's subtree.
    pub node_suppressed: bool,
}

/// Drives the match of each frame. Runners install handlers to observe
/// successes and failures around the plain execution.
pub trait MatchHandler<V: Clone> {
    fn match_frame(&mut self, ctx: &mut MatcherContext<'_, V>) -> bool;
}

/// Everything a parse owns while running: the frame stack, the value
/// stack, the accumulated errors and the finished root nodes.
pub struct MatcherContext<'a, V: Clone> {
    grammar: &'a Grammar<V>,
    buffer: &'a dyn InputBuffer,
    stack: ValueStack<V>,
    frames: Vec<Frame<V>>,
    predicate_depth: usize,
    errors: Vec<ParseError>,
    root_nodes: Vec<Node<V>>,
    end_index: usize,
}

/// What is left of a context once its parse has finished.
pub struct ParseOutcome<V: Clone> {
    pub tree: Option<Node<V>>,
    pub stack: ValueStack<V>,
    pub errors: Vec<ParseError>,
    pub end_index: usize,
}

impl<'a, V: Clone> MatcherContext<'a, V> {
    pub fn new(grammar: &'a Grammar<V>, buffer: &'a dyn InputBuffer) -> Self {
        Self {
            grammar,
            buffer,
            stack: ValueStack::new(),
            frames: Vec::new(),
            predicate_depth: 0,
            errors: Vec::new(),
            root_nodes: Vec::new(),
            end_index: 0,
        }
    }

    pub fn grammar(&self) -> &'a Grammar<V> {
        self.grammar
    }

    pub fn buffer(&self) -> &'a dyn InputBuffer {
        self.buffer
    }

    /// The currently executing frame. Only valid while a handler runs.
    pub fn top(&self) -> &Frame<V> {
        self.frames.last().expect("active frame") // handlers only run under run_rule
    }

    fn top_mut(&mut self) -> &mut Frame<V> {
        self.frames.last_mut().expect("active frame")
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Root-to-leaf path of the active frames.
    pub fn path(&self) -> MatcherPath {
        MatcherPath {
            elements: self
                .frames
                .iter()
                .map(|f| {
                    let matcher = self.grammar.matcher(f.rule);
                    PathElement {
                        rule: f.rule,
                        label: matcher.label.text.clone(),
                        custom_label: matcher.label.custom,
                        start: f.start,
                    }
                })
                .collect(),
        }
    }

    /// Runs one rule as a child of the current frame (or as the root),
    /// applying the universal frame contract.
    pub fn run_rule(&mut self, rule: RuleId, handler: &mut dyn MatchHandler<V>) -> bool {
        let grammar = self.grammar;
        let matcher = grammar.matcher(rule);
        let in_predicate = self.predicate_depth > 0;
        let (start, node_suppressed) = match self.frames.last() {
            Some(parent) => (
                parent.current,
                parent.node_suppressed
                    || grammar.matcher(parent.rule).flags.suppress_subnodes
                    || matcher.flags.suppress_node
                    || (in_predicate && matcher.flags.node_suppressed_in_predicate),
            ),
            None => (
                0,
                matcher.flags.suppress_node
                    || (in_predicate && matcher.flags.node_suppressed_in_predicate),
            ),
        };
        self.frames.push(Frame {
            rule,
            start,
            current: start,
            sub_nodes: Vec::new(),
            value: None,
            int_tag: 0,
            node_suppressed,
        });
        let snapshot = self.stack.snapshot();
        let matched = handler.match_frame(self);
        let frame = self.frames.pop().expect("frame pushed above");
        if matched {
            self.finish_frame(frame);
        } else {
            self.stack.restore(snapshot);
        }
        matched
    }

    /// Executes the variant-specific logic of the top frame's matcher.
    pub fn execute(&mut self, handler: &mut dyn MatchHandler<V>) -> bool {
        let grammar = self.grammar;
        let buffer = self.buffer;
        let matcher = grammar.matcher(self.top().rule);
        match &matcher.kind {
            MatchKind::Char(c) => self.match_char(|ch| ch == *c),
            MatchKind::CharIgnoreCase { low, up } => self.match_char(|ch| ch == *low || ch == *up),
            MatchKind::CharRange { low, high } => {
                self.match_char(|ch| (*low..=*high).contains(&ch))
            }
            MatchKind::AnyOf(set) => self.match_char(|ch| set.contains(ch)),
            MatchKind::Any => self.match_char(|ch| ch != chars::EOI),
            MatchKind::Empty => true,
            MatchKind::Nothing => false,
            MatchKind::Sequence(children) => {
                for &child in children {
                    if !self.run_rule(child, handler) {
                        return false;
                    }
                }
                true
            }
            MatchKind::FirstOf(children) => {
                for &child in children {
                    if self.run_rule(child, handler) {
                        return true;
                    }
                }
                false
            }
            MatchKind::Optional(child) => {
                self.run_rule(*child, handler);
                true
            }
            MatchKind::ZeroOrMore(child) => {
                let child = *child;
                loop {
                    let before = self.top().current;
                    if !self.run_rule(child, handler) {
                        break;
                    }
                    self.top_mut().int_tag += 1;
                    // Zero-width iteration guard for nullable bodies.
                    if self.top().current == before {
                        break;
                    }
                }
                true
            }
            MatchKind::OneOrMore(child) => {
                let child = *child;
                let mut before = self.top().current;
                if !self.run_rule(child, handler) {
                    return false;
                }
                self.top_mut().int_tag = 1;
                while self.top().current != before {
                    before = self.top().current;
                    if !self.run_rule(child, handler) {
                        break;
                    }
                    self.top_mut().int_tag += 1;
                }
                true
            }
            MatchKind::Test(child) => {
                let child = *child;
                self.predicate_depth += 1;
                let matched = self.run_rule(child, handler);
                self.predicate_depth -= 1;
                self.reset_predicate_frame();
                matched
            }
            MatchKind::TestNot(child) => {
                let child = *child;
                self.predicate_depth += 1;
                let matched = self.run_rule(child, handler);
                self.predicate_depth -= 1;
                self.reset_predicate_frame();
                !matched
            }
            MatchKind::String(cs) => {
                let frame = self.top_mut();
                let mut index = frame.current;
                for &c in cs {
                    if buffer.char_at(index) != c {
                        return false;
                    }
                    index += 1;
                }
                frame.current = index;
                true
            }
            MatchKind::FirstOfStrings(trie) => match trie.match_at(buffer, self.top().current) {
                Some(len) => {
                    self.top_mut().current += len;
                    true
                }
                None => false,
            },
            MatchKind::Action(action) => {
                let result = {
                    let mut view = ActionContext {
                        buffer,
                        frames: &mut self.frames,
                        stack: &mut self.stack,
                    };
                    action(&mut view)
                };
                match result {
                    Ok(matched) => matched,
                    Err(fault) => {
                        let index = self.top().current;
                        let path = self.path();
                        self.errors
                            .push(ParseError::action_exception(index, fault.message, path));
                        false
                    }
                }
            }
            // Undefined rules are rejected by the runners before a parse
            // begins.
            MatchKind::Forward => false,
        }
    }

    fn match_char(&mut self, accepts: impl Fn(char) -> bool) -> bool {
        let buffer = self.buffer;
        let frame = self.top_mut();
        if accepts(buffer.char_at(frame.current)) {
            frame.current += 1;
            true
        } else {
            false
        }
    }

    /// A predicate frame never moves the cursor and never keeps nodes,
    /// regardless of what its subrule did.
    fn reset_predicate_frame(&mut self) {
        let frame = self.top_mut();
        frame.current = frame.start;
        frame.sub_nodes.clear();
    }

    /// Attaches a successful frame to its parent: cursor advance plus node
    /// emission per the matcher's flags.
    fn finish_frame(&mut self, frame: Frame<V>) {
        let matcher = self.grammar.matcher(frame.rule);
        let end = frame.current;
        let emitted: Vec<Node<V>> = if frame.node_suppressed {
            Vec::new()
        } else if matcher.flags.skip_node {
            frame.sub_nodes
        } else {
            let children = if matcher.flags.suppress_subnodes {
                Vec::new()
            } else {
                frame.sub_nodes
            };
            let value = frame.value.or_else(|| self.stack.peek().cloned());
            vec![Node::new(matcher.label.text.clone(), frame.start, end, children, value)]
        };
        match self.frames.last_mut() {
            Some(parent) => {
                parent.current = end;
                parent.sub_nodes.extend(emitted);
            }
            None => {
                self.end_index = end;
                self.root_nodes = emitted;
            }
        }
    }

    pub fn into_outcome(mut self) -> ParseOutcome<V> {
        let tree = if self.root_nodes.is_empty() {
            None
        } else {
            Some(self.root_nodes.remove(0))
        };
        ParseOutcome {
            tree,
            stack: self.stack,
            errors: self.errors,
            end_index: self.end_index,
        }
    }
}

/// Read-mostly view handed to user actions.
///
/// An action sees the cursor, the ancestor frames, the sibling nodes
/// already built in its enclosing frame, the raw input, and the mutable
/// value stack.
pub struct ActionContext<'c, V: Clone> {
    buffer: &'c dyn InputBuffer,
    frames: &'c mut Vec<Frame<V>>,
    stack: &'c mut ValueStack<V>,
}

impl<V: Clone> ActionContext<'_, V> {
    /// The current input cursor.
    pub fn current_index(&self) -> usize {
        self.frames.last().map_or(0, |f| f.current)
    }

    /// Start index of the enclosing rule's frame.
    pub fn frame_start(&self) -> usize {
        self.frames
            .len()
            .checked_sub(2)
            .map(|i| self.frames[i].start)
            .unwrap_or_else(|| self.current_index())
    }

    /// Start indices of every ancestor frame, root first.
    pub fn ancestor_starts(&self) -> Vec<usize> {
        let upper = self.frames.len().saturating_sub(1);
        self.frames[..upper].iter().map(|f| f.start).collect()
    }

    pub fn buffer(&self) -> &dyn InputBuffer {
        self.buffer
    }

    pub fn stack(&mut self) -> &mut ValueStack<V> {
        self.stack
    }

    /// Sibling nodes already built in the enclosing frame.
    pub fn prev_nodes(&self) -> &[Node<V>] {
        self.frames
            .len()
            .checked_sub(2)
            .map(|i| self.frames[i].sub_nodes.as_slice())
            .unwrap_or(&[])
    }

    /// The text matched so far by the enclosing frame.
    pub fn prev_text(&self) -> String {
        self.buffer.extract(self.frame_start(), self.current_index())
    }

    pub fn extract(&self, start: usize, end: usize) -> String {
        self.buffer.extract(start, end)
    }

    /// Binds a semantic value to the enclosing frame; it becomes the value
    /// of that frame's tree node.
    pub fn set_frame_value(&mut self, value: V) {
        if let Some(i) = self.frames.len().checked_sub(2) {
            self.frames[i].value = Some(value);
        }
    }
}
