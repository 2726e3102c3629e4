//! Parser facade
//!
//! This module provides `Parser` - a compiled grammar together with the completion
//! resolvers and match options it is used with. It is the entry point used by the
//! command line tool and by tests.
//!
//! # Example
//!
//! ```rust
//! use fcfg_parser::Parser;
//!
//! let mut parser: Parser = "T[{\"who\": W}] -> greet $person[W]".parse().unwrap();
//! parser.registry_mut().register_words("person", ["rein", "loy"]);
//! let value = parser.parse("T", "greet loy").unwrap();
//! ```
//!
//! A `Parser` is immutable while matching and can be shared across threads; every
//! call owns its own scopes and cursors.

use crate::fcfg::compiling::compile;
use crate::fcfg::completion::{CompletionRegistry, CompletionResolver};
use crate::fcfg::enumeration::Enumeration;
use crate::fcfg::error::{GenerateError, GrammarSyntaxError, LoadError, MatchError};
use crate::fcfg::generation::random_sentence;
use crate::fcfg::grammar::Grammar;
use crate::fcfg::matching::{match_tokens, suggest_next, Derivation, MatchOptions};
use rand::Rng;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Compiled grammar plus resolvers and options
#[derive(Debug, Clone)]
pub struct Parser {
    grammar: Arc<Grammar>,
    registry: CompletionRegistry,
    options: MatchOptions,
}

impl Parser {
    pub fn new(grammar: Grammar) -> Self {
        Self {
            grammar: Arc::new(grammar),
            registry: CompletionRegistry::new(),
            options: MatchOptions::default(),
        }
    }

    /// Compile the grammar file at `path`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loading grammar");
        Ok(source.parse::<Parser>()?)
    }

    pub fn with_options(mut self, options: MatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_registry(mut self, registry: CompletionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn options(&self) -> MatchOptions {
        self.options
    }

    pub fn registry(&self) -> &CompletionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CompletionRegistry {
        &mut self.registry
    }

    /// Register a resolver on the parser's own registry, returning the one it replaces.
    pub fn register_resolver(
        &mut self,
        name: impl Into<String>,
        resolver: impl CompletionResolver + 'static,
    ) -> Option<Arc<dyn CompletionResolver>> {
        self.registry.register(name, resolver)
    }

    pub fn has_resolver(&self, name: &str) -> bool {
        self.registry.has_resolver(name)
    }

    /// Parse whitespace separated `input` as a `root`.
    pub fn parse(&self, root: &str, input: &str) -> Result<Value, MatchError> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        self.parse_tokens(root, &tokens)
    }

    pub fn parse_tokens(&self, root: &str, tokens: &[&str]) -> Result<Value, MatchError> {
        self.derive(root, tokens, None).map(|d| d.value)
    }

    /// Parse with an extra registry consulted before the parser's own.
    pub fn parse_with(&self, root: &str, input: &str, registry: &CompletionRegistry) -> Result<Value, MatchError> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        self.derive(root, &tokens, Some(registry)).map(|d| d.value)
    }

    /// Full derivation, including the number of tokens consumed.
    pub fn derive(
        &self,
        root: &str,
        tokens: &[&str],
        registry: Option<&CompletionRegistry>,
    ) -> Result<Derivation, MatchError> {
        match registry {
            Some(call) => match_tokens(&self.grammar, &[call, &self.registry], self.options, root, tokens),
            None => match_tokens(&self.grammar, &[&self.registry], self.options, root, tokens),
        }
    }

    /// Words that can follow `prefix` in a sentence of `root`.
    pub fn suggest(&self, root: &str, prefix: &str) -> Result<Vec<String>, MatchError> {
        let tokens: Vec<&str> = prefix.split_whitespace().collect();
        suggest_next(&self.grammar, &[&self.registry], self.options, root, &tokens)
    }

    /// Expansion trees of `root` up to `depth` nested rule expansions.
    pub fn enumerate(&self, root: &str, depth: usize) -> Enumeration<'_> {
        Enumeration::new(&self.grammar, root, depth).with_registry(&self.registry)
    }

    /// A random sentence of `root`, nesting bounded by the `max_depth` option.
    pub fn random_sentence<R: Rng + ?Sized>(&self, root: &str, rng: &mut R) -> Result<String, GenerateError> {
        random_sentence(&self.grammar, Some(&self.registry), root, self.options.max_depth, rng)
    }

    /// Referenced names with neither entries nor a resolver on this parser.
    pub fn unresolved_references(&self) -> Vec<&str> {
        self.grammar
            .undefined_references()
            .into_iter()
            .filter(|name| !self.registry.has_resolver(name))
            .collect()
    }

    /// Check that `root` (or every rule) only references resolvable names.
    pub fn verify(&self, root: Option<&str>) -> bool {
        if let Some(root) = root {
            if !self.grammar.contains(root) && !self.registry.has_resolver(root) {
                return false;
            }
        }
        self.unresolved_references().is_empty()
    }
}

impl FromStr for Parser {
    type Err = GrammarSyntaxError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Ok(Parser::new(compile(source)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_parser_is_shareable() {
        assert_send_sync::<Parser>();
        assert_send_sync::<Grammar>();
    }

    #[test]
    fn test_parse_with_prefers_call_registry() {
        let mut parser: Parser = "T[{\"who\": W}] -> greet $person[W]".parse().unwrap();
        parser.registry_mut().register_words("person", ["rein"]);

        let mut call = CompletionRegistry::new();
        call.register_words("person", ["loy"]);

        assert_eq!(parser.parse("T", "greet rein"), Ok(json!({"who": "rein"})));
        assert!(parser.parse("T", "greet loy").is_err());
        assert_eq!(parser.parse_with("T", "greet loy", &call), Ok(json!({"who": "loy"})));
        assert!(parser.parse_with("T", "greet rein", &call).is_err());
    }

    struct People;

    impl CompletionResolver for People {
        fn resolve(
            &self,
            _name: &str,
            _context: &crate::fcfg::completion::ResolveContext<'_>,
        ) -> Result<Vec<crate::fcfg::grammar::Alternative>, crate::fcfg::error::ResolveError> {
            Ok(vec![crate::fcfg::grammar::Alternative::from_words("rein")])
        }
    }

    #[test]
    fn test_verify() {
        let mut parser: Parser = "T -> greet $person\nU -> bye".parse().unwrap();
        assert_eq!(parser.unresolved_references(), vec!["person"]);
        assert!(!parser.verify(None));

        assert!(parser.register_resolver("person", People).is_none());
        assert!(parser.has_resolver("person"));
        assert!(parser.verify(Some("T")));
        assert!(!parser.verify(Some("MISSING")));
        assert_eq!(parser.parse("T", "greet rein"), Ok(json!("greet rein")));
    }

    #[test]
    fn test_from_file_missing() {
        let error = Parser::from_file("/nonexistent/robot.fcfg").unwrap_err();
        assert!(matches!(error, LoadError::Io { .. }));
    }

    #[test]
    fn test_derive_reports_consumed_tokens() {
        let parser: Parser = "G -> hello world".parse().unwrap();
        let derivation = parser.derive("G", &["hello", "world"], None).unwrap();
        assert_eq!(derivation.consumed, 2);
        assert_eq!(derivation.value, json!("hello world"));
    }
}
