//! Feature structure templates
//!
//!     A template is the bracketed part of a rule head (`VP[{"action": A}]`) or of a
//!     conjunct (`NP[X]`). On a rule head it is instantiated from the variables the
//!     matched alternative bound; on a conjunct it is a pattern the child's value is
//!     destructured against.
//!
//!     Values only ever flow upwards: a child is matched first, its value is bound
//!     into the parent's scope, and the parent's template is evaluated last.

use crate::fcfg::error::TemplateError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// A feature structure pattern
#[derive(Debug, Clone, PartialEq)]
pub enum Template {
    /// A constant: string, number, bool or null
    Literal(Value),
    /// A variable resolved from the binding scope
    Variable(String),
    /// `{key: template, ...}`, keys kept in declaration order
    Dict(Vec<(String, Template)>),
    /// `<template, ...>`
    List(Vec<Template>),
}

/// Variable bindings local to one attempted alternative
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: HashMap<String, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Template {
    pub fn string(text: impl Into<String>) -> Self {
        Template::Literal(Value::String(text.into()))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Template::Variable(name.into())
    }

    /// Instantiate the template from a binding scope.
    pub fn evaluate(&self, scope: &Bindings) -> Result<Value, TemplateError> {
        match self {
            Template::Literal(value) => Ok(value.clone()),
            Template::Variable(name) => scope
                .get(name)
                .cloned()
                .ok_or_else(|| TemplateError::UnboundVariable(name.clone())),
            Template::Dict(entries) => {
                let mut map = Map::new();
                for (key, template) in entries {
                    map.insert(key.clone(), template.evaluate(scope)?);
                }
                Ok(Value::Object(map))
            }
            Template::List(items) => items
                .iter()
                .map(|item| item.evaluate(scope))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
        }
    }

    /// Destructure `value` against this template used as a pattern.
    ///
    /// Returns false when the value does not have the pattern's shape, or when a
    /// variable already bound in `scope` is bound again to a different value.
    /// The scope may be partially extended on failure; callers discard it.
    pub fn bind(&self, value: &Value, scope: &mut Bindings) -> bool {
        match self {
            Template::Literal(expected) => expected == value,
            Template::Variable(name) => match scope.get(name) {
                Some(bound) => bound == value,
                None => {
                    scope.insert(name.clone(), value.clone());
                    true
                }
            },
            Template::Dict(entries) => {
                let Value::Object(map) = value else {
                    return false;
                };
                entries.iter().all(|(key, pattern)| {
                    map.get(key)
                        .is_some_and(|field| pattern.bind(field, scope))
                })
            }
            Template::List(items) => {
                let Value::Array(values) = value else {
                    return false;
                };
                values.len() == items.len()
                    && items
                        .iter()
                        .zip(values)
                        .all(|(pattern, item)| pattern.bind(item, scope))
            }
        }
    }

    /// Every variable name in the template, in first-occurrence order.
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Template::Literal(_) => {}
            Template::Variable(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Template::Dict(entries) => {
                for (_, template) in entries {
                    template.collect_variables(names);
                }
            }
            Template::List(items) => {
                for item in items {
                    item.collect_variables(names);
                }
            }
        }
    }

    /// Check if the template is a constant (contains no variables)
    pub fn is_constant(&self) -> bool {
        self.variables().is_empty()
    }
}

/// Whether a bare word names a variable: an uppercase ASCII letter followed by
/// letters, digits or underscores.
pub fn is_variable_name(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Interpret a bare (unquoted) template word.
pub fn template_from_word(word: &str) -> Template {
    if is_variable_name(word) {
        return Template::Variable(word.to_string());
    }
    match word {
        "true" => return Template::Literal(Value::Bool(true)),
        "false" => return Template::Literal(Value::Bool(false)),
        "null" => return Template::Literal(Value::Null),
        _ => {}
    }
    if let Ok(n) = word.parse::<i64>() {
        return Template::Literal(Value::from(n));
    }
    if let Ok(f) = word.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Template::Literal(Value::Number(n));
        }
    }
    Template::string(word)
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::Literal(value) => write!(f, "{}", value),
            Template::Variable(name) => write!(f, "{}", name),
            Template::Dict(entries) => {
                write!(f, "{{")?;
                for (i, (key, template)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", Value::String(key.clone()), template)?;
                }
                write!(f, "}}")
            }
            Template::List(items) => {
                write!(f, "<")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ">")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope(pairs: &[(&str, Value)]) -> Bindings {
        let mut bindings = Bindings::new();
        for (name, value) in pairs {
            bindings.insert(*name, value.clone());
        }
        bindings
    }

    #[test]
    fn test_evaluate_literal() {
        let template = Template::string("place");
        assert_eq!(template.evaluate(&Bindings::new()), Ok(json!("place")));
    }

    #[test]
    fn test_evaluate_nested_dict_keeps_key_order() {
        let template = Template::Dict(vec![
            ("action".into(), Template::string("bring")),
            ("entity".into(), Template::variable("E")),
            ("to".into(), Template::Dict(vec![("id".into(), Template::variable("L"))])),
        ]);
        let value = template
            .evaluate(&scope(&[("E", json!({"id": "coke"})), ("L", json!("kitchen"))]))
            .unwrap();

        assert_eq!(
            value,
            json!({"action": "bring", "entity": {"id": "coke"}, "to": {"id": "kitchen"}})
        );
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["action", "entity", "to"]);
    }

    #[test]
    fn test_evaluate_list_in_declaration_order() {
        let template = Template::List(vec![Template::variable("A2"), Template::variable("A1")]);
        let value = template
            .evaluate(&scope(&[("A1", json!("run")), ("A2", json!("jump"))]))
            .unwrap();
        assert_eq!(value, json!(["jump", "run"]));
    }

    #[test]
    fn test_evaluate_unbound_variable() {
        let template = Template::Dict(vec![("x".into(), Template::variable("X"))]);
        assert_eq!(
            template.evaluate(&Bindings::new()),
            Err(TemplateError::UnboundVariable("X".into()))
        );
    }

    #[test]
    fn test_bind_destructures_dict() {
        let pattern = Template::Dict(vec![
            ("type".into(), Template::string("person")),
            ("id".into(), Template::variable("X")),
        ]);
        let mut bindings = Bindings::new();

        assert!(pattern.bind(&json!({"type": "person", "id": "rein", "extra": 1}), &mut bindings));
        assert_eq!(bindings.get("X"), Some(&json!("rein")));

        let mut bindings = Bindings::new();
        assert!(!pattern.bind(&json!({"type": "object", "id": "coke"}), &mut bindings));
    }

    #[test]
    fn test_bind_requires_equal_rebinding() {
        let mut bindings = scope(&[("X", json!("left"))]);
        assert!(Template::variable("X").bind(&json!("left"), &mut bindings));
        assert!(!Template::variable("X").bind(&json!("right"), &mut bindings));
    }

    #[test]
    fn test_bind_list_arity() {
        let pattern = Template::List(vec![Template::variable("A"), Template::variable("B")]);
        let mut bindings = Bindings::new();
        assert!(!pattern.bind(&json!(["only"]), &mut bindings));
        assert!(pattern.bind(&json!(["one", "two"]), &mut bindings));
        assert_eq!(bindings.len(), 2);
    }

    #[test]
    fn test_variables_in_order_without_duplicates() {
        let template = Template::Dict(vec![
            ("a".into(), Template::List(vec![Template::variable("A1"), Template::variable("A2")])),
            ("b".into(), Template::variable("A1")),
        ]);
        assert_eq!(template.variables(), vec!["A1", "A2"]);
        assert!(!template.is_constant());
    }

    #[test]
    fn test_template_from_word() {
        assert_eq!(template_from_word("OBJ_1"), Template::variable("OBJ_1"));
        assert_eq!(template_from_word("pick-up"), Template::string("pick-up"));
        assert_eq!(template_from_word("3"), Template::Literal(json!(3)));
        assert_eq!(template_from_word("true"), Template::Literal(json!(true)));
        assert_eq!(template_from_word("lowercase"), Template::string("lowercase"));
        assert_eq!(template_from_word("Mixed-case"), Template::string("Mixed-case"));
    }

    #[test]
    fn test_display() {
        let template = Template::Dict(vec![
            ("actions".into(), Template::List(vec![Template::variable("A1"), Template::variable("A2")])),
            ("n".into(), Template::Literal(json!(2))),
        ]);
        assert_eq!(template.to_string(), r#"{"actions": <A1, A2>, "n": 2}"#);
    }
}
