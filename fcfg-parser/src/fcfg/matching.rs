//! Matcher
//!
//!     A top-down matcher with full backtracking, written in continuation passing
//!     style: every rule match receives the rest of its parent's work as a
//!     continuation and calls it once per way the rule can match. Returning `true`
//!     from a continuation stops the whole search; returning `false` asks for the
//!     next candidate. This is what lets a child's later alternatives be retried
//!     when the remainder of the parent fails.
//!
//!     Search order is fixed: entries and alternatives in file order, synthetic
//!     alternatives from a completion resolver last. The first derivation covering
//!     the whole input wins, so results are deterministic.
//!
//! Recursion
//!
//!     Left recursion is rejected when compiling. What remains is bounded by
//!     `max_depth`, which also covers cycles a resolver might introduce.
//!
//! Suggestions
//!
//!     The same search drives next-word suggestions: in suggesting mode every
//!     terminal reached exactly at the end of the input is recorded instead of
//!     failing, and the search runs to exhaustion.

use crate::fcfg::completion::{any_resolver, resolve_first, CompletionRegistry, ResolveContext};
use crate::fcfg::error::MatchError;
use crate::fcfg::grammar::{Conjunct, Grammar};
use crate::fcfg::template::{Bindings, Template};
use serde_json::Value;
use std::cell::{Cell, RefCell};

/// Default recursion ceiling for a single match
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Knobs for a matching run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Compare terminals exactly instead of by lowercase form
    pub case_sensitive: bool,
    /// Maximum nesting of rule references before a branch is abandoned.
    ///
    /// Right-recursive rules nest once per repetition, so this also bounds the
    /// length of lists like `L -> x | x and L`.
    pub max_depth: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A successful match of the root rule
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    pub value: Value,
    /// Number of input tokens consumed; always the whole input at the root
    pub consumed: usize,
}

type Continuation<'k, T> = &'k mut dyn FnMut(T, usize) -> bool;

struct Matcher<'a> {
    grammar: &'a Grammar,
    registries: &'a [&'a CompletionRegistry],
    options: MatchOptions,
    tokens: &'a [&'a str],
    suggesting: bool,
    furthest: Cell<usize>,
    depth_exceeded: Cell<bool>,
    fault: RefCell<Option<MatchError>>,
    suggestions: RefCell<Vec<String>>,
}

impl<'a> Matcher<'a> {
    fn new(
        grammar: &'a Grammar,
        registries: &'a [&'a CompletionRegistry],
        options: MatchOptions,
        tokens: &'a [&'a str],
        suggesting: bool,
    ) -> Self {
        Self {
            grammar,
            registries,
            options,
            tokens,
            suggesting,
            furthest: Cell::new(0),
            depth_exceeded: Cell::new(false),
            fault: RefCell::new(None),
            suggestions: RefCell::new(Vec::new()),
        }
    }

    /// Try every way `name` can match starting at `pos`, feeding each to `k`.
    fn match_rule(&self, name: &str, pos: usize, depth: usize, k: Continuation<'_, Value>) -> bool {
        if depth > self.options.max_depth {
            if !self.depth_exceeded.replace(true) {
                tracing::warn!(rule = name, max_depth = self.options.max_depth, "recursion depth ceiling reached");
            }
            self.note_failure(pos);
            return false;
        }

        let entries = self.grammar.entries(name);
        if !entries.is_empty() {
            for entry in entries {
                for (i, alternative) in entry.alternatives.iter().enumerate() {
                    tracing::trace!(rule = name, alternative = i, position = pos, "trying alternative");
                    if self.match_alternative(entry.template.as_ref(), &alternative.conjuncts, pos, depth, k) {
                        return true;
                    }
                }
            }
            return false;
        }

        let remaining = self.tokens.get(pos..).unwrap_or_default();
        let Some(alternatives) = resolve_first(self.registries, name, &ResolveContext::Input(remaining)) else {
            tracing::trace!(rule = name, "no entries and no resolver");
            self.note_failure(pos);
            return false;
        };
        if alternatives.is_empty() {
            self.note_failure(pos);
            return false;
        }
        for (i, alternative) in alternatives.iter().enumerate() {
            tracing::trace!(rule = name, alternative = i, position = pos, "trying resolved alternative");
            if self.match_alternative(None, &alternative.conjuncts, pos, depth, k) {
                return true;
            }
        }
        false
    }

    /// Match one alternative with a fresh scope and produce the entry's value.
    fn match_alternative(
        &self,
        template: Option<&Template>,
        conjuncts: &[Conjunct],
        start: usize,
        depth: usize,
        k: Continuation<'_, Value>,
    ) -> bool {
        self.match_conjuncts(conjuncts, start, Bindings::new(), depth, &mut |scope, end| {
            let value = match template {
                Some(template) => match template.evaluate(&scope) {
                    Ok(value) => value,
                    Err(error) => {
                        self.fault.replace(Some(error.into()));
                        return true;
                    }
                },
                None => Value::String(self.tokens[start..end].join(" ")),
            };
            k(value, end)
        })
    }

    fn match_conjuncts(
        &self,
        conjuncts: &[Conjunct],
        pos: usize,
        scope: Bindings,
        depth: usize,
        k: Continuation<'_, Bindings>,
    ) -> bool {
        let Some((first, rest)) = conjuncts.split_first() else {
            return k(scope, pos);
        };

        match first {
            Conjunct::Terminal(word) => match self.tokens.get(pos) {
                Some(token) if self.terminal_matches(word, token) => {
                    self.match_conjuncts(rest, pos + 1, scope, depth, k)
                }
                Some(_) => {
                    self.note_failure(pos);
                    false
                }
                None => {
                    self.note_failure(pos);
                    if self.suggesting {
                        self.suggest(word);
                    }
                    false
                }
            },
            Conjunct::Reference { name, pattern } => {
                // Every alternative consumes a token, so nothing can match at the end
                if pos >= self.tokens.len() && !self.suggesting {
                    self.note_failure(pos);
                    return false;
                }
                self.match_rule(name, pos, depth + 1, &mut |value, end| {
                    let mut scope = scope.clone();
                    if let Some(pattern) = pattern {
                        if !pattern.bind(&value, &mut scope) {
                            return false;
                        }
                    }
                    self.match_conjuncts(rest, end, scope, depth, k)
                })
            }
        }
    }

    fn terminal_matches(&self, word: &str, token: &str) -> bool {
        if self.options.case_sensitive {
            word == token
        } else {
            word == token || word.to_lowercase() == token.to_lowercase()
        }
    }

    fn note_failure(&self, pos: usize) {
        if pos > self.furthest.get() {
            self.furthest.set(pos);
        }
    }

    fn suggest(&self, word: &str) {
        let mut suggestions = self.suggestions.borrow_mut();
        if !suggestions.iter().any(|s| s == word) {
            suggestions.push(word.to_string());
        }
    }

    fn no_derivation(&self) -> MatchError {
        let furthest = self.furthest.get();
        MatchError::NoDerivation {
            furthest,
            token: self.tokens.get(furthest).map(|t| t.to_string()),
        }
    }
}

fn check_root(grammar: &Grammar, registries: &[&CompletionRegistry], root: &str) -> Result<(), MatchError> {
    if grammar.contains(root) || any_resolver(registries, root) {
        Ok(())
    } else {
        Err(MatchError::UndefinedRule(root.to_string()))
    }
}

/// Match the whole of `tokens` against `root`.
///
/// `registries` are consulted in order for names without entries.
pub fn match_tokens(
    grammar: &Grammar,
    registries: &[&CompletionRegistry],
    options: MatchOptions,
    root: &str,
    tokens: &[&str],
) -> Result<Derivation, MatchError> {
    check_root(grammar, registries, root)?;
    tracing::debug!(root, tokens = tokens.len(), "matching");

    let matcher = Matcher::new(grammar, registries, options, tokens, false);
    let mut found = None;
    matcher.match_rule(root, 0, 0, &mut |value, end| {
        if end == tokens.len() {
            found = Some(Derivation { value, consumed: end });
            true
        } else {
            // Partial match: the root must cover the whole input
            matcher.note_failure(end);
            false
        }
    });

    if let Some(fault) = matcher.fault.take() {
        return Err(fault);
    }
    match found {
        Some(derivation) => {
            tracing::debug!(root, value = %derivation.value, "matched");
            Ok(derivation)
        }
        None => {
            let error = matcher.no_derivation();
            tracing::debug!(root, %error, "no derivation");
            Err(error)
        }
    }
}

/// Words that may follow `prefix` in some sentence of `root`, in search order.
///
/// An empty result means the prefix cannot be continued (it may already be complete).
pub fn suggest_next(
    grammar: &Grammar,
    registries: &[&CompletionRegistry],
    options: MatchOptions,
    root: &str,
    prefix: &[&str],
) -> Result<Vec<String>, MatchError> {
    check_root(grammar, registries, root)?;

    let matcher = Matcher::new(grammar, registries, options, prefix, true);
    matcher.match_rule(root, 0, 0, &mut |_, _| false);

    if let Some(fault) = matcher.fault.take() {
        return Err(fault);
    }
    let suggestions = matcher.suggestions.take();
    tracing::debug!(root, prefix = prefix.len(), suggestions = suggestions.len(), "suggested");
    Ok(suggestions)
}
