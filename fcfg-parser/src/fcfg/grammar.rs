//! Compiled grammar representation
//!
//! A [`Grammar`] maps nonterminal names to the rule entries declared for them, in
//! file order. Every statement in the source becomes one [`RuleEntry`]; statements
//! sharing a name accumulate, and the matcher tries all of their alternatives in
//! the order they were written.

use crate::fcfg::template::Template;
use indexmap::IndexMap;
use std::fmt;

/// One element of an alternative
#[derive(Debug, Clone, PartialEq)]
pub enum Conjunct {
    /// A literal word matched against one input token
    Terminal(String),
    /// A reference to another nonterminal, optionally destructuring its value
    Reference {
        name: String,
        pattern: Option<Template>,
    },
}

impl Conjunct {
    pub fn terminal(word: impl Into<String>) -> Self {
        Conjunct::Terminal(word.into())
    }

    /// A reference binding the child's value to `variable`, if given
    pub fn reference(name: impl Into<String>, variable: Option<&str>) -> Self {
        Conjunct::Reference {
            name: name.into(),
            pattern: variable.map(Template::variable),
        }
    }

    /// Variables this conjunct binds in its alternative's scope
    pub fn bound_variables(&self) -> Vec<&str> {
        match self {
            Conjunct::Terminal(_) => Vec::new(),
            Conjunct::Reference { pattern, .. } => {
                pattern.as_ref().map(Template::variables).unwrap_or_default()
            }
        }
    }

    pub fn reference_name(&self) -> Option<&str> {
        match self {
            Conjunct::Terminal(_) => None,
            Conjunct::Reference { name, .. } => Some(name.as_str()),
        }
    }
}

/// One alternative production: conjuncts matched left to right
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Alternative {
    pub conjuncts: Vec<Conjunct>,
}

impl Alternative {
    pub fn new(conjuncts: Vec<Conjunct>) -> Self {
        Self { conjuncts }
    }

    /// An alternative made of terminals only, one per whitespace-separated word.
    pub fn from_words(words: &str) -> Self {
        Self::new(words.split_whitespace().map(Conjunct::terminal).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.conjuncts.is_empty()
    }

    /// Variables bound anywhere in this alternative
    pub fn bound_variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for conjunct in &self.conjuncts {
            for name in conjunct.bound_variables() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

/// A rule statement: optional head template plus its alternatives
#[derive(Debug, Clone, PartialEq)]
pub struct RuleEntry {
    pub name: String,
    pub template: Option<Template>,
    pub alternatives: Vec<Alternative>,
    /// 1-based source line, 0 for entries not read from text
    pub line: usize,
}

impl RuleEntry {
    pub fn new(name: impl Into<String>, template: Option<Template>, alternatives: Vec<Alternative>) -> Self {
        Self {
            name: name.into(),
            template,
            alternatives,
            line: 0,
        }
    }
}

/// Compiled grammar: nonterminal name to entries, in first-definition order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grammar {
    rules: IndexMap<String, Vec<RuleEntry>>,
}

impl Grammar {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, entry: RuleEntry) {
        self.rules.entry(entry.name.clone()).or_default().push(entry);
    }

    /// Entries declared for `name`, empty if the name is not defined
    pub fn entries(&self, name: &str) -> &[RuleEntry] {
        self.rules.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Rule names in first-definition order
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RuleEntry])> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct nonterminals
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Total number of rule entries across all names
    pub fn entry_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    /// Names referenced by some conjunct but never defined, in first-use order.
    ///
    /// These are either open classes served by a completion resolver or mistakes.
    pub fn undefined_references(&self) -> Vec<&str> {
        let mut missing = Vec::new();
        for entries in self.rules.values() {
            for entry in entries {
                for alternative in &entry.alternatives {
                    for name in alternative.conjuncts.iter().filter_map(Conjunct::reference_name) {
                        if !self.contains(name) && !missing.contains(&name) {
                            missing.push(name);
                        }
                    }
                }
            }
        }
        missing
    }
}

/// Whether `word` reads back as a terminal without quotes
fn is_bare_terminal(word: &str) -> bool {
    const RESERVED: &[char] = &['[', ']', '{', '}', '<', '>', '|', ':', ',', ';', '#', '"', '\\'];
    !word.is_empty()
        && !word.starts_with(|c: char| c.is_ascii_uppercase() || c == '$' || c == '-')
        && !word.ends_with('-')
        && !word.contains("--")
        && !word.contains(|c: char| c.is_whitespace() || RESERVED.contains(&c))
}

impl fmt::Display for Conjunct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conjunct::Terminal(word) if is_bare_terminal(word) => write!(f, "{}", word),
            Conjunct::Terminal(word) => {
                write!(f, "\"")?;
                for c in word.chars() {
                    if matches!(c, '"' | '\\') {
                        write!(f, "\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, "\"")
            }
            Conjunct::Reference { name, pattern } => {
                // Lowercase names only parse back as references with the open-class marker
                if !name.starts_with(|c: char| c.is_ascii_uppercase()) {
                    write!(f, "$")?;
                }
                write!(f, "{}", name)?;
                if let Some(pattern) = pattern {
                    write!(f, "[{}]", pattern)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, conjunct) in self.conjuncts.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", conjunct)?;
        }
        Ok(())
    }
}

impl fmt::Display for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(template) = &self.template {
            write!(f, "[{}]", template)?;
        }
        write!(f, " ->")?;
        for (i, alternative) in self.alternatives.iter().enumerate() {
            if i > 0 {
                write!(f, " |")?;
            }
            write!(f, " {}", alternative)?;
        }
        Ok(())
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entries in self.rules.values() {
            for entry in entries {
                writeln!(f, "{}", entry)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Grammar {
        let mut grammar = Grammar::new();
        grammar.push(RuleEntry::new(
            "T",
            Some(Template::variable("X")),
            vec![Alternative::new(vec![
                Conjunct::terminal("go"),
                Conjunct::reference("DIR", Some("X")),
            ])],
        ));
        grammar.push(RuleEntry::new("DIR", None, vec![Alternative::from_words("left")]));
        grammar.push(RuleEntry::new(
            "T",
            None,
            vec![Alternative::new(vec![Conjunct::reference("name", None)])],
        ));
        grammar
    }

    #[test]
    fn test_entries_accumulate_per_name() {
        let grammar = sample();
        assert_eq!(grammar.len(), 2);
        assert_eq!(grammar.entry_count(), 3);
        assert_eq!(grammar.entries("T").len(), 2);
        assert!(grammar.entries("MISSING").is_empty());
        assert_eq!(grammar.rule_names().collect::<Vec<_>>(), vec!["T", "DIR"]);
    }

    #[test]
    fn test_undefined_references() {
        assert_eq!(sample().undefined_references(), vec!["name"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            sample().to_string(),
            "T[X] -> go DIR[X]\nT -> $name\nDIR -> left\n"
        );
    }

    #[test]
    fn test_bound_variables() {
        let alternative = Alternative::new(vec![
            Conjunct::reference("VP", Some("A1")),
            Conjunct::terminal("and"),
            Conjunct::reference("VP", Some("A2")),
        ]);
        assert_eq!(alternative.bound_variables(), vec!["A1", "A2"]);
    }
}
