//! # fcfg
//!
//! A feature context-free grammar parser.
//!
//! Grammars are classic context-free productions whose nonterminals carry feature
//! structures. Values matched by child rules flow upwards through variables into the
//! parent's template, so a command like "bring the coke to the kitchen" comes out as
//! a nested structure:
//!
//!     T[{"action": "bring", "entity": E, "to": L}] -> bring the OBJ[E] to the LOC[L]
//!
//! File Layout
//!
//! src/fcfg
//!   ├── lexing        logos tokens for grammar text
//!   ├── compiling     grammar text to `Grammar`, plus whole-grammar checks
//!   ├── template      feature structure templates and pattern binding
//!   ├── matching      backtracking matcher and next-word suggestions
//!   ├── completion    resolvers for open-class nonterminals
//!   ├── enumeration   bounded expansion trees
//!   ├── generation    random sentences
//!   ├── formats       treeviz rendering of expansion trees
//!   └── parser        the `Parser` facade tying it together
//!
//! Most callers only need [`Parser`]:
//!
//!     let parser: Parser = grammar_text.parse()?;
//!     let value = parser.parse("T", "bring the coke to the kitchen")?;

#![allow(rustdoc::invalid_html_tags)]

pub mod fcfg;

pub use fcfg::compiling::compile;
pub use fcfg::completion::{CompletionRegistry, CompletionResolver, ResolveContext};
pub use fcfg::enumeration::{Enumeration, Expansion};
pub use fcfg::error::{
    GenerateError, GrammarSyntaxError, LoadError, MatchError, ResolveError, SyntaxErrorKind, TemplateError,
};
pub use fcfg::grammar::{Alternative, Conjunct, Grammar, RuleEntry};
pub use fcfg::matching::{match_tokens, Derivation, MatchOptions, DEFAULT_MAX_DEPTH};
pub use fcfg::parser::Parser;
pub use fcfg::template::Template;
