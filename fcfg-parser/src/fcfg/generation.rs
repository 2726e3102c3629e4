//! Random sentence generation
//!
//! Expands a rule by picking alternatives uniformly at random until only
//! terminals are left. Useful for smoke-testing a grammar: every generated
//! sentence must parse back with the same root.

use crate::fcfg::completion::{CompletionRegistry, ResolveContext};
use crate::fcfg::error::GenerateError;
use crate::fcfg::grammar::{Alternative, Conjunct, Grammar};
use rand::seq::SliceRandom;
use rand::Rng;

/// Generate a random sentence of `root`.
///
/// Open classes are resolved through `registry` with [`ResolveContext::Enumeration`].
/// Fails when a reference cannot be expanded or nesting goes beyond `max_depth`.
pub fn random_sentence<R: Rng + ?Sized>(
    grammar: &Grammar,
    registry: Option<&CompletionRegistry>,
    root: &str,
    max_depth: usize,
    rng: &mut R,
) -> Result<String, GenerateError> {
    let mut words = Vec::new();
    let generator = Generator {
        grammar,
        registry,
        max_depth,
    };
    generator.expand(root, 0, rng, &mut words)?;
    let sentence = words.join(" ");
    tracing::debug!(root, %sentence, "generated sentence");
    Ok(sentence)
}

struct Generator<'g> {
    grammar: &'g Grammar,
    registry: Option<&'g CompletionRegistry>,
    max_depth: usize,
}

impl Generator<'_> {
    fn expand<R: Rng + ?Sized>(
        &self,
        name: &str,
        depth: usize,
        rng: &mut R,
        words: &mut Vec<String>,
    ) -> Result<(), GenerateError> {
        if depth > self.max_depth {
            return Err(GenerateError::DepthExceeded(self.max_depth));
        }

        let alternatives = self.alternatives(name);
        let alternative = alternatives
            .choose(rng)
            .ok_or_else(|| GenerateError::UndefinedRule(name.to_string()))?;

        for conjunct in &alternative.conjuncts {
            match conjunct {
                Conjunct::Terminal(word) => words.push(word.clone()),
                Conjunct::Reference { name, .. } => self.expand(name, depth + 1, rng, words)?,
            }
        }
        Ok(())
    }

    fn alternatives(&self, name: &str) -> Vec<Alternative> {
        let entries = self.grammar.entries(name);
        if !entries.is_empty() {
            return entries
                .iter()
                .flat_map(|entry| entry.alternatives.iter().cloned())
                .collect();
        }
        self.registry
            .and_then(|registry| registry.resolve(name, &ResolveContext::Enumeration))
            .unwrap_or_default()
    }
}
