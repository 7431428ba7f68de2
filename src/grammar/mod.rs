//! The matcher algebra.
//!
//! A grammar is an append-only arena of matchers; rules refer to their
//! subrules through [`RuleId`] indices, which keeps recursive grammars
//! finite and makes identity comparison a valid cycle check. Matchers are
//! built through the caching combinators in [`builder`] and are immutable
//! once a runner borrows the grammar, so the combinator cache is frozen
//! before the first parse by construction.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::chars;
use crate::errors::{ActionError, GrammarError};
use crate::runtime::ActionContext;

mod builder;
mod trie;

pub use trie::StringTrie;

pub(crate) use builder::CacheKey;

/// Index of a matcher inside its grammar's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RuleId(pub(crate) u32);

impl RuleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A user-defined predicate driven by the value stack.
///
/// Returning `Ok(false)` is an ordinary match failure; returning `Err`
/// records an action fault and fails the frame.
pub type ActionFn<V> =
    Arc<dyn Fn(&mut ActionContext<'_, V>) -> Result<bool, ActionError> + Send + Sync>;

/// A matcher label, used in error messages and parse tree nodes.
///
/// Labels derived from the combinator kind are not `custom`; only labels
/// assigned through [`Grammar::label`] or [`Grammar::declare`] (and the
/// named constant rules) take part in expected-label selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Label {
    pub text: String,
    pub custom: bool,
}

impl Label {
    pub(crate) fn derived(text: impl Into<String>) -> Self {
        Self { text: text.into(), custom: false }
    }

    pub(crate) fn custom(text: impl Into<String>) -> Self {
        Self { text: text.into(), custom: true }
    }
}

/// Parse tree construction flags carried by every matcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeFlags {
    /// Never emit a tree node for this matcher or its subrules.
    pub suppress_node: bool,
    /// Emit this matcher's node but none of its descendants.
    pub suppress_subnodes: bool,
    /// Splice this matcher's child nodes directly into the parent.
    pub skip_node: bool,
    /// Suppress the node only while matching inside `Test`/`TestNot`.
    pub node_suppressed_in_predicate: bool,
}

/// A character set, either inclusive of its characters or the complement.
///
/// Subtractive sets never match `EOI`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharSet {
    chars: Vec<char>,
    subtractive: bool,
}

impl CharSet {
    pub fn of(chars: impl IntoIterator<Item = char>) -> Self {
        Self::build(chars, false)
    }

    pub fn none_of(chars: impl IntoIterator<Item = char>) -> Self {
        Self::build(chars, true)
    }

    fn build(chars: impl IntoIterator<Item = char>, subtractive: bool) -> Self {
        let mut chars: Vec<char> = chars.into_iter().collect();
        chars.sort_unstable();
        chars.dedup();
        Self { chars, subtractive }
    }

    pub fn contains(&self, c: char) -> bool {
        let listed = self.chars.binary_search(&c).is_ok();
        if self.subtractive {
            !listed && c != chars::EOI
        } else {
            listed
        }
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn is_subtractive(&self) -> bool {
        self.subtractive
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub(crate) fn label_text(&self) -> String {
        let listed: String = self.chars.iter().map(|&c| chars::escape(c)).collect();
        if self.subtractive {
            format!("![{listed}]")
        } else {
            format!("[{listed}]")
        }
    }
}

/// The closed set of matcher variants.
#[derive(Clone)]
pub enum MatchKind<V: Clone> {
    Char(char),
    CharIgnoreCase { low: char, up: char },
    CharRange { low: char, high: char },
    AnyOf(CharSet),
    Any,
    Empty,
    Nothing,
    Sequence(Vec<RuleId>),
    FirstOf(Vec<RuleId>),
    Optional(RuleId),
    ZeroOrMore(RuleId),
    OneOrMore(RuleId),
    Test(RuleId),
    TestNot(RuleId),
    String(Vec<char>),
    FirstOfStrings(StringTrie),
    Action(ActionFn<V>),
    /// Declared but not yet defined; must be resolved before any parse.
    Forward,
}

impl<V: Clone> MatchKind<V> {
    /// True for matchers that inspect input directly instead of delegating
    /// to subrules. Failure paths are collected at terminal frames.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MatchKind::Char(_)
                | MatchKind::CharIgnoreCase { .. }
                | MatchKind::CharRange { .. }
                | MatchKind::AnyOf(_)
                | MatchKind::Any
                | MatchKind::Nothing
                | MatchKind::String(_)
                | MatchKind::FirstOfStrings(_)
                | MatchKind::Action(_)
        )
    }

    fn name(&self) -> &'static str {
        match self {
            MatchKind::Char(_) => "Char",
            MatchKind::CharIgnoreCase { .. } => "CharIgnoreCase",
            MatchKind::CharRange { .. } => "CharRange",
            MatchKind::AnyOf(_) => "AnyOf",
            MatchKind::Any => "Any",
            MatchKind::Empty => "Empty",
            MatchKind::Nothing => "Nothing",
            MatchKind::Sequence(_) => "Sequence",
            MatchKind::FirstOf(_) => "FirstOf",
            MatchKind::Optional(_) => "Optional",
            MatchKind::ZeroOrMore(_) => "ZeroOrMore",
            MatchKind::OneOrMore(_) => "OneOrMore",
            MatchKind::Test(_) => "Test",
            MatchKind::TestNot(_) => "TestNot",
            MatchKind::String(_) => "String",
            MatchKind::FirstOfStrings(_) => "FirstOfStrings",
            MatchKind::Action(_) => "Action",
            MatchKind::Forward => "Forward",
        }
    }
}

impl<V: Clone> fmt::Debug for MatchKind<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One matcher node of the grammar arena.
#[derive(Debug, Clone)]
pub struct Matcher<V: Clone> {
    pub kind: MatchKind<V>,
    pub label: Label,
    pub flags: NodeFlags,
}

impl<V: Clone> Matcher<V> {
    pub(crate) fn new(kind: MatchKind<V>, label: Label) -> Self {
        Self { kind, label, flags: NodeFlags::default() }
    }

    pub(crate) fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// An arena of matchers plus the combinator cache.
///
/// `V` is the semantic value type carried by the value stack and parse
/// tree nodes.
pub struct Grammar<V: Clone> {
    matchers: Vec<Matcher<V>>,
    cache: HashMap<CacheKey, RuleId>,
}

impl<V: Clone> Grammar<V> {
    pub fn new() -> Self {
        Self { matchers: Vec::new(), cache: HashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn matcher(&self, id: RuleId) -> &Matcher<V> {
        &self.matchers[id.index()]
    }

    pub fn label_of(&self, id: RuleId) -> &str {
        &self.matcher(id).label.text
    }

    /// The subrules of a matcher, in match order.
    pub fn children(&self, id: RuleId) -> &[RuleId] {
        match &self.matcher(id).kind {
            MatchKind::Sequence(children) | MatchKind::FirstOf(children) => children,
            MatchKind::Optional(child)
            | MatchKind::ZeroOrMore(child)
            | MatchKind::OneOrMore(child)
            | MatchKind::Test(child)
            | MatchKind::TestNot(child) => std::slice::from_ref(child),
            _ => &[],
        }
    }

    /// Walks every matcher reachable from the root, left to right,
    /// visiting each one once. Rule identity makes the cycle check exact
    /// even for recursive grammars.
    pub fn visit(&self, root: RuleId, visit: &mut impl FnMut(RuleId, &Matcher<V>)) {
        let mut seen = HashSet::new();
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                continue;
            }
            visit(id, self.matcher(id));
            for &child in self.children(id).iter().rev() {
                pending.push(child);
            }
        }
    }

    /// Fails if any declared rule reachable in the arena is still undefined.
    pub fn ensure_complete(&self) -> Result<(), GrammarError> {
        for matcher in &self.matchers {
            if matches!(matcher.kind, MatchKind::Forward) {
                return Err(GrammarError::UndefinedRule(matcher.label.text.clone()));
            }
        }
        Ok(())
    }

    /// Whether the rule can succeed without consuming input. Conservative
    /// on cycles: a recursive reference counts as consuming.
    pub fn is_nullable(&self, id: RuleId) -> bool {
        self.nullable_inner(id, &mut HashSet::new())
    }

    fn nullable_inner(&self, id: RuleId, visited: &mut HashSet<RuleId>) -> bool {
        if !visited.insert(id) {
            return false;
        }
        match &self.matcher(id).kind {
            MatchKind::Char(_)
            | MatchKind::CharIgnoreCase { .. }
            | MatchKind::CharRange { .. }
            | MatchKind::AnyOf(_)
            | MatchKind::Any
            | MatchKind::Nothing
            | MatchKind::String(_)
            | MatchKind::FirstOfStrings(_)
            | MatchKind::Forward => false,
            MatchKind::Empty
            | MatchKind::Optional(_)
            | MatchKind::ZeroOrMore(_)
            | MatchKind::Test(_)
            | MatchKind::TestNot(_)
            | MatchKind::Action(_) => true,
            MatchKind::Sequence(children) => {
                children.iter().all(|&c| self.nullable_inner(c, visited))
            }
            MatchKind::FirstOf(children) => {
                children.iter().any(|&c| self.nullable_inner(c, visited))
            }
            MatchKind::OneOrMore(child) => self.nullable_inner(*child, visited),
        }
    }

    /// Whether the rule can begin a match with the given character. Used to
    /// test resynchronization follow sets during error recovery.
    pub fn can_start_with(&self, id: RuleId, c: char) -> bool {
        self.first_inner(id, c, &mut HashSet::new())
    }

    fn first_inner(&self, id: RuleId, c: char, visited: &mut HashSet<RuleId>) -> bool {
        if !visited.insert(id) {
            return false;
        }
        match &self.matcher(id).kind {
            MatchKind::Char(ch) => *ch == c,
            MatchKind::CharIgnoreCase { low, up } => c == *low || c == *up,
            MatchKind::CharRange { low, high } => (*low..=*high).contains(&c),
            MatchKind::AnyOf(set) => set.contains(c),
            MatchKind::Any => c != chars::EOI,
            MatchKind::Empty
            | MatchKind::Nothing
            | MatchKind::Test(_)
            | MatchKind::TestNot(_)
            | MatchKind::Action(_)
            | MatchKind::Forward => false,
            MatchKind::String(cs) => cs.first() == Some(&c),
            MatchKind::FirstOfStrings(trie) => trie.starts_with(c),
            MatchKind::Sequence(children) => {
                for &child in children {
                    if self.first_inner(child, c, visited) {
                        return true;
                    }
                    if !self.is_nullable(child) {
                        break;
                    }
                }
                false
            }
            MatchKind::FirstOf(children) => {
                children.iter().any(|&child| self.first_inner(child, c, visited))
            }
            MatchKind::Optional(child)
            | MatchKind::ZeroOrMore(child)
            | MatchKind::OneOrMore(child) => self.first_inner(*child, c, visited),
        }
    }

    /// A character that would satisfy the matcher, for insertion repair.
    pub(crate) fn starter_char(&self, id: RuleId) -> Option<char> {
        match &self.matcher(id).kind {
            MatchKind::Char(c) => Some(*c),
            MatchKind::CharIgnoreCase { low, .. } => Some(*low),
            MatchKind::CharRange { low, .. } => Some(*low),
            MatchKind::AnyOf(set) if !set.is_subtractive() => set.chars().first().copied(),
            MatchKind::String(cs) => cs.first().copied(),
            MatchKind::FirstOfStrings(trie) => trie.first_edge(),
            _ => None,
        }
    }

    pub(crate) fn add(&mut self, matcher: Matcher<V>) -> RuleId {
        let id = RuleId(self.matchers.len() as u32);
        self.matchers.push(matcher);
        id
    }

    pub(crate) fn intern(
        &mut self,
        key: CacheKey,
        build: impl FnOnce(&mut Self) -> Matcher<V>,
    ) -> RuleId {
        if let Some(&id) = self.cache.get(&key) {
            return id;
        }
        let matcher = build(self);
        let id = self.add(matcher);
        self.cache.insert(key, id);
        id
    }
}

impl<V: Clone> Default for Grammar<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> fmt::Debug for Grammar<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("matchers", &self.matchers.len())
            .finish()
    }
}
