//! Error types for grammar compilation and matching

use std::path::PathBuf;
use thiserror::Error;

/// What went wrong while compiling grammar text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    #[error("missing '->' in rule statement")]
    MissingArrow,

    #[error("rule name {0:?} must start with an uppercase letter")]
    InvalidRuleName(String),

    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("unclosed {0:?}")]
    UnclosedBracket(char),

    #[error("unmatched {0:?}")]
    UnmatchedBracket(char),

    #[error("empty alternative")]
    EmptyAlternative,

    #[error("terminal {0:?} cannot take an argument")]
    TerminalWithArgument(String),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("invalid character {0:?}")]
    InvalidCharacter(char),

    #[error("variable {0} appears more than once in a list template")]
    DuplicateListVariable(String),

    #[error("template variable {variable} is not bound in alternative {alternative}")]
    UnboundTemplateVariable { variable: String, alternative: usize },

    #[error("left recursion: {}", join_cycle(.0))]
    LeftRecursion(Vec<String>),
}

fn join_cycle(names: &[String]) -> String {
    names.join(" -> ")
}

/// A compile-time error with its location in the grammar source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}, column {column}{}: {kind}", rule_suffix(.rule))]
pub struct GrammarSyntaxError {
    pub line: usize,
    pub column: usize,
    pub rule: Option<String>,
    pub kind: SyntaxErrorKind,
}

fn rule_suffix(rule: &Option<String>) -> String {
    match rule {
        Some(name) => format!(" (rule {name})"),
        None => String::new(),
    }
}

impl GrammarSyntaxError {
    pub fn new(line: usize, column: usize, kind: SyntaxErrorKind) -> Self {
        Self {
            line,
            column,
            rule: None,
            kind,
        }
    }

    pub fn in_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// Render the error followed by the surrounding source lines
    pub fn render(&self, source: &str) -> String {
        format!("error: {}\n\n{}", self, format_source_context(source, self.line))
    }
}

/// Errors raised while evaluating a template against a binding scope
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unbound variable {0}")]
    UnboundVariable(String),
}

/// Errors from a matching attempt
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    /// The search was exhausted without a derivation covering the whole input
    #[error("no derivation: {}", describe_failure(.furthest, .token))]
    NoDerivation {
        furthest: usize,
        token: Option<String>,
    },

    /// The root rule has no entries and no resolver
    #[error("rule {0} is not defined and has no completion resolver")]
    UndefinedRule(String),

    /// A template referenced a variable the matcher never bound
    #[error("internal consistency fault: {0}")]
    Template(#[from] TemplateError),
}

fn describe_failure(furthest: &usize, token: &Option<String>) -> String {
    match token {
        Some(token) => format!("word {token:?} at index {furthest} failed to match"),
        None => format!("input ended at index {furthest} before the rule was complete"),
    }
}

/// Failure reported by a completion resolver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("resolver failed: {message}")]
pub struct ResolveError {
    pub message: String,
}

impl ResolveError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors while loading a grammar from disk
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read grammar file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Syntax(#[from] GrammarSyntaxError),
}

/// Errors from random sentence generation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("rule {0} is not defined")]
    UndefinedRule(String),

    #[error("expansion exceeded depth {0}")]
    DepthExceeded(usize),
}

/// Format source context around an error line (1-based).
///
/// Shows 2 lines before the error, the error line with >> marker, and 2 lines after.
/// All lines are numbered for easy reference.
pub fn format_source_context(source: &str, line: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let error_line = line.saturating_sub(1);

    let start_line = error_line.saturating_sub(2);
    let end_line = (error_line + 3).min(lines.len());

    let mut context = String::new();

    for (line_num, text) in lines.iter().enumerate().take(end_line).skip(start_line) {
        let marker = if line_num == error_line { ">>" } else { "  " };
        context.push_str(&format!("{} {:3} | {}\n", marker, line_num + 1, text));
    }

    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_source_context() {
        let source = "line 1\nline 2\nline 3\nerror line\nline 5\nline 6\nline 7";

        let context = format_source_context(source, 4);

        assert!(context.contains("line 2"));
        assert!(context.contains(">>   4 | error line"));
        assert!(context.contains("line 6"));
        assert!(!context.contains("line 7"));
        assert!(!context.contains("line 1"));
    }

    #[test]
    fn test_syntax_error_display() {
        let error = GrammarSyntaxError::new(3, 9, SyntaxErrorKind::MissingArrow).in_rule("VP");
        insta::assert_snapshot!(error.to_string(), @"line 3, column 9 (rule VP): missing '->' in rule statement");
    }

    #[test]
    fn test_left_recursion_display() {
        let kind = SyntaxErrorKind::LeftRecursion(vec!["A".into(), "B".into(), "A".into()]);
        assert_eq!(kind.to_string(), "left recursion: A -> B -> A");
    }

    #[test]
    fn test_no_derivation_display() {
        let error = MatchError::NoDerivation {
            furthest: 2,
            token: Some("maybe".into()),
        };
        assert_eq!(
            error.to_string(),
            "no derivation: word \"maybe\" at index 2 failed to match"
        );
    }
}
