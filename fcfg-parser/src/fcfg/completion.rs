//! Completion Registry
//!
//!     Some nonterminals cannot be written down statically: object names known to a
//!     world model, people the robot has met, and so on. These "open classes" are
//!     served at match time by a [`CompletionResolver`] registered under the
//!     nonterminal's name. The resolver returns synthetic alternatives which the
//!     matcher treats as one untemplated rule entry.
//!
//!     Resolvers are only consulted for names without static entries. A registry
//!     passed to a single call is consulted before the parser's own one.

use crate::fcfg::error::ResolveError;
use crate::fcfg::grammar::Alternative;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// What a resolver is being asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveContext<'a> {
    /// Matching or suggesting: the tokens not consumed yet, starting at the open class
    Input(&'a [&'a str]),
    /// Enumeration: no input, every option is wanted
    Enumeration,
}

impl<'a> ResolveContext<'a> {
    /// The remaining input, empty during enumeration
    pub fn remaining(&self) -> &'a [&'a str] {
        match *self {
            ResolveContext::Input(tokens) => tokens,
            ResolveContext::Enumeration => &[],
        }
    }
}

/// Supplies alternatives for an open-class nonterminal.
///
/// Implementations must be thread safe; they may block (e.g. query a world model).
pub trait CompletionResolver: Send + Sync {
    fn resolve(&self, name: &str, context: &ResolveContext<'_>) -> Result<Vec<Alternative>, ResolveError>;
}

impl<F> CompletionResolver for F
where
    F: Fn(&str, &ResolveContext<'_>) -> Result<Vec<Alternative>, ResolveError> + Send + Sync,
{
    fn resolve(&self, name: &str, context: &ResolveContext<'_>) -> Result<Vec<Alternative>, ResolveError> {
        self(name, context)
    }
}

/// Resolvers keyed by nonterminal name
#[derive(Clone, Default)]
pub struct CompletionRegistry {
    resolvers: HashMap<String, Arc<dyn CompletionResolver>>,
}

impl CompletionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `resolver` for `name`, returning the resolver it replaces.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        resolver: impl CompletionResolver + 'static,
    ) -> Option<Arc<dyn CompletionResolver>> {
        self.resolvers.insert(name.into(), Arc::new(resolver))
    }

    /// Register a closure; its signature is inferred from this bound.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, resolver: F) -> Option<Arc<dyn CompletionResolver>>
    where
        F: Fn(&str, &ResolveContext<'_>) -> Result<Vec<Alternative>, ResolveError> + Send + Sync + 'static,
    {
        self.register(name, resolver)
    }

    /// Register a fixed list of single-phrase options, e.g. known object names.
    pub fn register_words<I, S>(&mut self, name: impl Into<String>, phrases: I) -> Option<Arc<dyn CompletionResolver>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives: Vec<Alternative> = phrases
            .into_iter()
            .map(|phrase| Alternative::from_words(phrase.as_ref()))
            .collect();
        self.register_fn(name, move |_: &str, _: &ResolveContext<'_>| Ok(alternatives.clone()))
    }

    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn CompletionResolver>> {
        self.resolvers.remove(name)
    }

    pub fn has_resolver(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Ask the resolver for `name`.
    ///
    /// Returns `None` when no resolver is registered. A failing resolver is logged
    /// and yields no options; empty alternatives are dropped.
    pub fn resolve(&self, name: &str, context: &ResolveContext<'_>) -> Option<Vec<Alternative>> {
        let resolver = self.resolvers.get(name)?;
        let alternatives = match resolver.resolve(name, context) {
            Ok(alternatives) => alternatives,
            Err(error) => {
                tracing::warn!(rule = name, %error, "completion resolver failed");
                return Some(Vec::new());
            }
        };

        let total = alternatives.len();
        let alternatives: Vec<Alternative> = alternatives.into_iter().filter(|a| !a.is_empty()).collect();
        if alternatives.len() < total {
            tracing::warn!(
                rule = name,
                dropped = total - alternatives.len(),
                "completion resolver returned empty alternatives"
            );
        }
        if alternatives.is_empty() {
            tracing::warn!(rule = name, "completion resolver offered no options");
        }
        Some(alternatives)
    }
}

impl fmt::Debug for CompletionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.resolvers.keys().collect();
        names.sort();
        f.debug_struct("CompletionRegistry")
            .field("resolvers", &names)
            .finish()
    }
}

/// Consult registries in order, the first one with a resolver for `name` wins.
pub(crate) fn resolve_first(
    registries: &[&CompletionRegistry],
    name: &str,
    context: &ResolveContext<'_>,
) -> Option<Vec<Alternative>> {
    registries
        .iter()
        .find(|registry| registry.has_resolver(name))
        .and_then(|registry| registry.resolve(name, context))
}

pub(crate) fn any_resolver(registries: &[&CompletionRegistry], name: &str) -> bool {
    registries.iter().any(|registry| registry.has_resolver(name))
}
