//! Derivation Enumerator
//!
//!     Lists every expansion tree of a rule up to a depth bound, one tree per
//!     combination of alternative choices. The enumeration is lazy: trees are built
//!     one at a time while iterating, and an [`Enumeration`] can be iterated again
//!     from the start as often as needed.
//!
//! Order
//!
//!     Trees come out in depth-first order, like an odometer over the choices made
//!     while building a tree: the last choice point turns fastest. When a choice
//!     changes, everything built after it is rebuilt, so later choice points may
//!     differ from one tree to the next.
//!
//! Opaque leaves
//!
//!     References below the depth bound, and names with no entries and no
//!     resolver, are kept as [`Expansion::Reference`] leaves. Open classes are
//!     resolved once per pass with [`ResolveContext::Enumeration`].

use crate::fcfg::completion::{CompletionRegistry, ResolveContext};
use crate::fcfg::grammar::{Alternative, Conjunct, Grammar};
use std::collections::HashMap;
use std::rc::Rc;

/// One node of an expansion tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    Terminal(String),
    /// A reference left unexpanded
    Reference(String),
    /// A rule expanded through one of its alternatives
    Rule {
        name: String,
        /// Index into the rule's alternatives across all of its entries
        option: usize,
        children: Vec<Expansion>,
    },
}

impl Expansion {
    /// Leaves in order; unexpanded references appear as their name
    pub fn leaves(&self) -> Vec<&str> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'e>(&'e self, leaves: &mut Vec<&'e str>) {
        match self {
            Expansion::Terminal(word) | Expansion::Reference(word) => leaves.push(word),
            Expansion::Rule { children, .. } => {
                for child in children {
                    child.collect_leaves(leaves);
                }
            }
        }
    }

    pub fn sentence(&self) -> String {
        self.leaves().join(" ")
    }

    /// Whether every leaf is a terminal
    pub fn is_complete(&self) -> bool {
        match self {
            Expansion::Terminal(_) => true,
            Expansion::Reference(_) => false,
            Expansion::Rule { children, .. } => children.iter().all(Expansion::is_complete),
        }
    }
}

/// A restartable, finite sequence of expansion trees
#[derive(Debug, Clone)]
pub struct Enumeration<'g> {
    grammar: &'g Grammar,
    registry: Option<&'g CompletionRegistry>,
    root: String,
    depth: usize,
}

impl<'g> Enumeration<'g> {
    pub fn new(grammar: &'g Grammar, root: impl Into<String>, depth: usize) -> Self {
        Self {
            grammar,
            registry: None,
            root: root.into(),
            depth,
        }
    }

    pub fn with_registry(mut self, registry: &'g CompletionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Start a fresh pass over the trees
    pub fn iter(&self) -> Expansions<'g> {
        tracing::debug!(root = %self.root, depth = self.depth, "enumerating");
        Expansions {
            grammar: self.grammar,
            registry: self.registry,
            root: self.root.clone(),
            depth: self.depth,
            choices: Choices::default(),
            alternatives: HashMap::new(),
            done: false,
        }
    }
}

impl<'a, 'g> IntoIterator for &'a Enumeration<'g> {
    type Item = Expansion;
    type IntoIter = Expansions<'g>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Choice points met while building one tree: (chosen, available)
#[derive(Debug, Default)]
struct Choices {
    trail: Vec<(usize, usize)>,
    cursor: usize,
}

impl Choices {
    fn choose(&mut self, available: usize) -> usize {
        let chosen = match self.trail.get(self.cursor) {
            Some(&(chosen, _)) => chosen,
            None => {
                self.trail.push((0, available));
                0
            }
        };
        self.cursor += 1;
        chosen
    }

    /// Turn the odometer; false once every combination was produced.
    fn advance(&mut self) -> bool {
        self.trail.truncate(self.cursor);
        self.cursor = 0;
        while let Some((chosen, available)) = self.trail.pop() {
            if chosen + 1 < available {
                self.trail.push((chosen + 1, available));
                return true;
            }
        }
        false
    }
}

/// Iterator over the trees of one enumeration pass
pub struct Expansions<'g> {
    grammar: &'g Grammar,
    registry: Option<&'g CompletionRegistry>,
    root: String,
    depth: usize,
    choices: Choices,
    alternatives: HashMap<String, Option<Rc<[Alternative]>>>,
    done: bool,
}

impl<'g> Expansions<'g> {
    /// All alternatives of `name` in match order, or `None` for an opaque name
    fn alternatives(&mut self, name: &str) -> Option<Rc<[Alternative]>> {
        if let Some(cached) = self.alternatives.get(name) {
            return cached.clone();
        }

        let entries = self.grammar.entries(name);
        let alternatives: Option<Rc<[Alternative]>> = if !entries.is_empty() {
            Some(
                entries
                    .iter()
                    .flat_map(|entry| entry.alternatives.iter().cloned())
                    .collect(),
            )
        } else {
            self.registry
                .and_then(|registry| registry.resolve(name, &ResolveContext::Enumeration))
                .filter(|alternatives| !alternatives.is_empty())
                .map(Rc::from)
        };

        self.alternatives.insert(name.to_string(), alternatives.clone());
        alternatives
    }

    fn expand(&mut self, name: &str, depth: usize) -> Expansion {
        if depth == 0 {
            return Expansion::Reference(name.to_string());
        }
        let Some(alternatives) = self.alternatives(name) else {
            return Expansion::Reference(name.to_string());
        };

        let option = self.choices.choose(alternatives.len());
        let children = alternatives[option]
            .conjuncts
            .iter()
            .map(|conjunct| match conjunct {
                Conjunct::Terminal(word) => Expansion::Terminal(word.clone()),
                Conjunct::Reference { name, .. } => self.expand(name, depth - 1),
            })
            .collect();

        Expansion::Rule {
            name: name.to_string(),
            option,
            children,
        }
    }
}

impl Iterator for Expansions<'_> {
    type Item = Expansion;

    fn next(&mut self) -> Option<Expansion> {
        if self.done {
            return None;
        }
        let root = self.root.clone();
        let tree = self.expand(&root, self.depth);
        self.done = !self.choices.advance();
        Some(tree)
    }
}
