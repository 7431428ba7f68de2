//! Rule-creating combinators.
//!
//! Every combinator caches: two calls with structurally identical
//! arguments return the same [`RuleId`]. Child arguments are compared by
//! id, which is sound because children went through the same cache.
//! Actions are the one exception, they have no structural identity and a
//! fresh matcher is created per registration.

use std::sync::Arc;

use crate::chars;
use crate::errors::{ActionError, GrammarError};
use crate::runtime::ActionContext;

use super::{
    trie::StringTrie, CharSet, Grammar, Label, MatchKind, Matcher, NodeFlags, RuleId,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum CacheKey {
    Char(char),
    IgnoreCase(char),
    CharRange(char, char),
    AnyOf(Vec<char>, bool),
    Str(Vec<char>),
    IgnoreCaseStr(Vec<char>),
    Sequence(Vec<RuleId>),
    FirstOf(Vec<RuleId>),
    Optional(RuleId),
    ZeroOrMore(RuleId),
    OneOrMore(RuleId),
    Test(RuleId),
    TestNot(RuleId),
    Labeled(RuleId, String),
    SuppressNode(RuleId),
    SuppressSubnodes(RuleId),
    SkipNode(RuleId),
    Any,
    Empty,
    Nothing,
    Eoi,
    Indent,
    Dedent,
}

/// The single-char case pair of a character, when it has exactly one.
fn case_pair(c: char) -> Option<(char, char)> {
    let mut lows = c.to_lowercase();
    let mut ups = c.to_uppercase();
    match (lows.next(), lows.next(), ups.next(), ups.next()) {
        (Some(low), None, Some(up), None) if low != up => Some((low, up)),
        _ => None,
    }
}

impl<V: Clone> Grammar<V> {
    /// Matches exactly the given character.
    pub fn ch(&mut self, c: char) -> RuleId {
        self.intern(CacheKey::Char(c), |_| {
            Matcher::new(
                MatchKind::Char(c),
                Label::derived(format!("'{}'", chars::escape(c))),
            )
        })
    }

    /// Matches the given character independently of its case. Folds to
    /// [`Grammar::ch`] when the character has no case distinction.
    pub fn ignore_case(&mut self, c: char) -> RuleId {
        let Some((low, up)) = case_pair(c) else {
            return self.ch(c);
        };
        self.intern(CacheKey::IgnoreCase(low), |_| {
            Matcher::new(
                MatchKind::CharIgnoreCase { low, up },
                Label::derived(format!("'{}/{}'", chars::escape(low), chars::escape(up))),
            )
        })
    }

    /// Matches any character in `[low, high]` inclusive. Folds to
    /// [`Grammar::ch`] for a single-character range.
    pub fn char_range(&mut self, low: char, high: char) -> RuleId {
        if low == high {
            return self.ch(low);
        }
        self.intern(CacheKey::CharRange(low, high), |_| {
            Matcher::new(
                MatchKind::CharRange { low, high },
                Label::derived(format!("{}..{}", chars::escape(low), chars::escape(high))),
            )
        })
    }

    /// Matches any character of the given set. A singleton inclusive set
    /// folds to [`Grammar::ch`].
    pub fn char_set(&mut self, set: CharSet) -> Result<RuleId, GrammarError> {
        if set.is_empty() {
            return Err(GrammarError::EmptyCharSet);
        }
        if !set.is_subtractive() && set.chars().len() == 1 {
            return Ok(self.ch(set.chars()[0]));
        }
        let key = CacheKey::AnyOf(set.chars().to_vec(), set.is_subtractive());
        Ok(self.intern(key, |_| {
            let label = Label::derived(set.label_text());
            Matcher::new(MatchKind::AnyOf(set), label)
        }))
    }

    /// Matches any of the characters in the given string.
    pub fn any_of(&mut self, characters: &str) -> Result<RuleId, GrammarError> {
        self.char_set(CharSet::of(characters.chars()))
    }

    /// Matches any character not in the given string, excluding `EOI`.
    pub fn none_of(&mut self, characters: &str) -> Result<RuleId, GrammarError> {
        self.char_set(CharSet::none_of(characters.chars()))
    }

    /// Matches the given string. Folds to [`Grammar::ch`] for one-char
    /// strings; longer strings suppress their subnodes.
    pub fn string(&mut self, string: &str) -> Result<RuleId, GrammarError> {
        let cs: Vec<char> = string.chars().collect();
        match cs.as_slice() {
            [] => Err(GrammarError::EmptyString),
            [c] => Ok(self.ch(*c)),
            _ => Ok(self.intern(CacheKey::Str(cs.clone()), |_| {
                Matcher::new(
                    MatchKind::String(cs),
                    Label::derived(format!("\"{}\"", chars::escape_str(string))),
                )
                .with_flags(NodeFlags { suppress_subnodes: true, ..NodeFlags::default() })
            })),
        }
    }

    /// Matches the given string independently of case, as a sequence of
    /// case-insensitive characters.
    pub fn ignore_case_string(&mut self, string: &str) -> Result<RuleId, GrammarError> {
        let cs: Vec<char> = string.chars().collect();
        match cs.as_slice() {
            [] => Err(GrammarError::EmptyString),
            [c] => Ok(self.ignore_case(*c)),
            _ => {
                let children: Vec<RuleId> = cs.iter().map(|&c| self.ignore_case(c)).collect();
                Ok(self.intern(CacheKey::IgnoreCaseStr(cs), |_| {
                    Matcher::new(
                        MatchKind::Sequence(children),
                        Label::derived(format!("\"{}\"", chars::escape_str(string))),
                    )
                    .with_flags(NodeFlags { suppress_subnodes: true, ..NodeFlags::default() })
                }))
            }
        }
    }

    /// Succeeds iff all subrules succeed in order. A single-rule sequence
    /// is that rule.
    pub fn sequence(&mut self, rules: &[RuleId]) -> Result<RuleId, GrammarError> {
        match rules {
            [] => Err(GrammarError::EmptySequence),
            [rule] => Ok(*rule),
            _ => Ok(self.intern(CacheKey::Sequence(rules.to_vec()), |_| {
                Matcher::new(MatchKind::Sequence(rules.to_vec()), Label::derived("Sequence"))
            })),
        }
    }

    /// Tries the subrules left to right and commits to the first success.
    /// A choice of string literals folds to a shared-trie matcher.
    pub fn first_of(&mut self, rules: &[RuleId]) -> Result<RuleId, GrammarError> {
        match rules {
            [] => Err(GrammarError::EmptyChoice),
            [rule] => Ok(*rule),
            _ => {
                let strings: Option<Vec<Vec<char>>> = rules
                    .iter()
                    .map(|&r| match &self.matcher(r).kind {
                        MatchKind::String(cs) => Some(cs.clone()),
                        _ => None,
                    })
                    .collect();
                Ok(self.intern(CacheKey::FirstOf(rules.to_vec()), |_| {
                    let kind = match strings {
                        Some(alternatives) => {
                            MatchKind::FirstOfStrings(StringTrie::build(&alternatives))
                        }
                        None => MatchKind::FirstOf(rules.to_vec()),
                    };
                    Matcher::new(kind, Label::derived("FirstOf"))
                }))
            }
        }
    }

    /// Tries the subrule and succeeds either way.
    pub fn optional(&mut self, rule: RuleId) -> RuleId {
        self.intern(CacheKey::Optional(rule), |_| {
            Matcher::new(MatchKind::Optional(rule), Label::derived("Optional"))
        })
    }

    /// Greedy star. Always succeeds.
    pub fn zero_or_more(&mut self, rule: RuleId) -> RuleId {
        self.intern(CacheKey::ZeroOrMore(rule), |_| {
            Matcher::new(MatchKind::ZeroOrMore(rule), Label::derived("ZeroOrMore"))
        })
    }

    /// Greedy plus. Fails iff the first iteration fails.
    pub fn one_or_more(&mut self, rule: RuleId) -> RuleId {
        self.intern(CacheKey::OneOrMore(rule), |_| {
            Matcher::new(MatchKind::OneOrMore(rule), Label::derived("OneOrMore"))
        })
    }

    /// Zero-width positive lookahead. Never consumes, never emits nodes.
    pub fn test(&mut self, rule: RuleId) -> RuleId {
        self.intern(CacheKey::Test(rule), |g| {
            Matcher::new(
                MatchKind::Test(rule),
                Label::derived(format!("&({})", g.label_of(rule))),
            )
            .with_flags(NodeFlags { suppress_node: true, ..NodeFlags::default() })
        })
    }

    /// Zero-width negative lookahead.
    pub fn test_not(&mut self, rule: RuleId) -> RuleId {
        self.intern(CacheKey::TestNot(rule), |g| {
            Matcher::new(
                MatchKind::TestNot(rule),
                Label::derived(format!("!({})", g.label_of(rule))),
            )
            .with_flags(NodeFlags { suppress_node: true, ..NodeFlags::default() })
        })
    }

    /// Registers a user predicate. Actions consume no input, emit no tree
    /// nodes and are not cached.
    pub fn action(
        &mut self,
        name: &str,
        f: impl Fn(&mut ActionContext<'_, V>) -> Result<bool, ActionError> + Send + Sync + 'static,
    ) -> RuleId {
        self.add(
            Matcher::new(MatchKind::Action(Arc::new(f)), Label::derived(name)).with_flags(
                NodeFlags {
                    suppress_node: true,
                    node_suppressed_in_predicate: true,
                    ..NodeFlags::default()
                },
            ),
        )
    }

    /// Matches any character except `EOI`.
    pub fn any(&mut self) -> RuleId {
        self.intern(CacheKey::Any, |_| {
            Matcher::new(MatchKind::Any, Label::custom("ANY"))
        })
    }

    /// Consumes nothing and always succeeds.
    pub fn empty(&mut self) -> RuleId {
        self.intern(CacheKey::Empty, |_| {
            Matcher::new(MatchKind::Empty, Label::custom("EMPTY"))
        })
    }

    /// Always fails.
    pub fn nothing(&mut self) -> RuleId {
        self.intern(CacheKey::Nothing, |_| {
            Matcher::new(MatchKind::Nothing, Label::custom("NOTHING"))
        })
    }

    /// Matches the virtual end-of-input character.
    pub fn eoi(&mut self) -> RuleId {
        self.intern(CacheKey::Eoi, |_| {
            Matcher::new(MatchKind::Char(chars::EOI), Label::custom("EOI"))
        })
    }

    /// Matches the `INDENT` sentinel emitted by the indentation buffer.
    pub fn indent(&mut self) -> RuleId {
        self.intern(CacheKey::Indent, |_| {
            Matcher::new(MatchKind::Char(chars::INDENT), Label::custom("INDENT"))
        })
    }

    /// Matches the `DEDENT` sentinel emitted by the indentation buffer.
    pub fn dedent(&mut self) -> RuleId {
        self.intern(CacheKey::Dedent, |_| {
            Matcher::new(MatchKind::Char(chars::DEDENT), Label::custom("DEDENT"))
        })
    }

    /// A copy of the rule carrying a custom label. Custom labels drive the
    /// expected-label selection in error messages.
    pub fn label(&mut self, rule: RuleId, name: &str) -> RuleId {
        self.intern(CacheKey::Labeled(rule, name.to_string()), |g| {
            let mut matcher = g.matcher(rule).clone();
            matcher.label = Label::custom(name);
            matcher
        })
    }

    /// A copy of the rule that emits no tree nodes for itself or its
    /// subrules.
    pub fn suppress_node(&mut self, rule: RuleId) -> RuleId {
        self.intern(CacheKey::SuppressNode(rule), |g| {
            let mut matcher = g.matcher(rule).clone();
            matcher.flags.suppress_node = true;
            matcher
        })
    }

    /// A copy of the rule that emits its own node but no descendants.
    pub fn suppress_subnodes(&mut self, rule: RuleId) -> RuleId {
        self.intern(CacheKey::SuppressSubnodes(rule), |g| {
            let mut matcher = g.matcher(rule).clone();
            matcher.flags.suppress_subnodes = true;
            matcher
        })
    }

    /// A copy of the rule whose children are spliced into its parent.
    pub fn skip_node(&mut self, rule: RuleId) -> RuleId {
        self.intern(CacheKey::SkipNode(rule), |g| {
            let mut matcher = g.matcher(rule).clone();
            matcher.flags.skip_node = true;
            matcher
        })
    }

    /// Reserves a named rule so recursive grammars can refer to it before
    /// its body exists. Must be completed with [`Grammar::define`] before
    /// any parse.
    pub fn declare(&mut self, name: &str) -> RuleId {
        self.add(Matcher::new(MatchKind::Forward, Label::custom(name)))
    }

    /// Fills a declared rule with the given body. The declaration keeps
    /// its name; the body's kind and flags are copied in.
    pub fn define(&mut self, declared: RuleId, body: RuleId) -> Result<(), GrammarError> {
        if !matches!(self.matcher(declared).kind, MatchKind::Forward) {
            return Err(GrammarError::RedefinedRule(
                self.matcher(declared).label.text.clone(),
            ));
        }
        let template = self.matcher(body).clone();
        let slot = &mut self.matchers[declared.index()];
        slot.kind = template.kind;
        slot.flags = template.flags;
        Ok(())
    }
}
