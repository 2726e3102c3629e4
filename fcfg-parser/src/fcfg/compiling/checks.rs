//! Whole-grammar static checks
//!
//! These run after every statement parsed, since both need more than one
//! statement in view: a head template is checked against each of its own
//! alternatives, and left recursion can span several rules.

use crate::fcfg::error::{GrammarSyntaxError, SyntaxErrorKind};
use crate::fcfg::grammar::{Conjunct, Grammar, RuleEntry};
use std::collections::HashMap;

pub fn check(grammar: &Grammar) -> Result<(), GrammarSyntaxError> {
    for (_, entries) in grammar.iter() {
        for entry in entries {
            check_template_variables(entry)?;
        }
    }
    check_left_recursion(grammar)
}

/// Every variable in a head template must be bound by every alternative.
fn check_template_variables(entry: &RuleEntry) -> Result<(), GrammarSyntaxError> {
    let Some(template) = &entry.template else {
        return Ok(());
    };
    let variables = template.variables();
    for (i, alternative) in entry.alternatives.iter().enumerate() {
        let bound = alternative.bound_variables();
        if let Some(missing) = variables.iter().find(|v| !bound.contains(*v)) {
            return Err(GrammarSyntaxError::new(
                entry.line,
                1,
                SyntaxErrorKind::UnboundTemplateVariable {
                    variable: missing.to_string(),
                    alternative: i + 1,
                },
            )
            .in_rule(entry.name.as_str()));
        }
    }
    Ok(())
}

/// Reject any cycle through first conjuncts.
///
/// Alternatives are never empty, so a reference in first position is the only way a
/// rule can reach itself without consuming a token.
fn check_left_recursion(grammar: &Grammar) -> Result<(), GrammarSyntaxError> {
    let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
    for (name, entries) in grammar.iter() {
        let targets = edges.entry(name).or_default();
        for entry in entries {
            for alternative in &entry.alternatives {
                if let Some(target) = alternative.conjuncts.first().and_then(Conjunct::reference_name) {
                    if grammar.contains(target) && !targets.contains(&target) {
                        targets.push(target);
                    }
                }
            }
        }
    }

    let mut finished: Vec<&str> = Vec::new();
    for name in grammar.rule_names() {
        let mut path = Vec::new();
        if let Some(cycle) = find_cycle(name, &edges, &mut path, &mut finished) {
            let line = grammar.entries(cycle[0]).first().map_or(0, |e| e.line);
            return Err(GrammarSyntaxError::new(
                line,
                1,
                SyntaxErrorKind::LeftRecursion(cycle.iter().map(|s| s.to_string()).collect()),
            )
            .in_rule(cycle[0]));
        }
    }
    Ok(())
}

fn find_cycle<'g>(
    name: &'g str,
    edges: &HashMap<&'g str, Vec<&'g str>>,
    path: &mut Vec<&'g str>,
    finished: &mut Vec<&'g str>,
) -> Option<Vec<&'g str>> {
    if let Some(start) = path.iter().position(|n| *n == name) {
        let mut cycle = path[start..].to_vec();
        cycle.push(name);
        return Some(cycle);
    }
    if finished.contains(&name) {
        return None;
    }

    path.push(name);
    for target in edges.get(name).into_iter().flatten() {
        if let Some(cycle) = find_cycle(*target, edges, path, finished) {
            return Some(cycle);
        }
    }
    path.pop();
    finished.push(name);
    None
}
