//! Template table for storing and retrieving named text fragments

use std::collections::BTreeMap;

use thiserror::Error;

use super::rewrite::{RewriteRule, RuleError};

/// Errors that can occur while building the template table
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Rewrite rule failed to compile
    #[error("invalid rewrite rule {pattern:?} in template {template}: {source}")]
    InvalidRule {
        template: String,
        pattern: String,
        #[source]
        source: RuleError,
    },
}

/// A stored template
#[derive(Debug, Clone, Default)]
pub struct Template {
    /// Raw text with placeholders; `None` when the entry has no text
    pub text: Option<String>,
    /// Rules applied, in order, when this template is inlined elsewhere
    pub rules: Vec<RewriteRule>,
}

impl Template {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            rules: Vec::new(),
        }
    }

    /// Add a compiled rewrite rule
    pub fn with_rule(mut self, rule: RewriteRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Run every rewrite rule over `text`, each on the previous one's output
    pub fn rewrite(&self, text: String) -> String {
        self.rules.iter().fold(text, |acc, rule| rule.apply(&acc))
    }
}

/// Table of templates keyed by name
#[derive(Debug, Clone, Default)]
pub struct TemplateTable {
    templates: BTreeMap<String, Template>,
}

impl TemplateTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a template
    pub fn insert(&mut self, name: impl Into<String>, template: Template) {
        self.templates.insert(name.into(), template);
    }

    /// Builder form of [`TemplateTable::insert`]
    pub fn with(mut self, name: impl Into<String>, template: Template) -> Self {
        self.insert(name, template);
        self
    }

    /// Get a template by name
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Check if a template exists
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Get all template names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Template)> {
        self.templates.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_insert_and_get() {
        let mut table = TemplateTable::new();
        table.insert("box", Template::new("[]"));
        assert!(table.contains("box"));
        assert_eq!(table.get("box").and_then(|t| t.text.as_deref()), Some("[]"));
        assert_eq!(table.get("missing").map(|t| t.text.clone()), None);
    }

    #[test]
    fn test_insert_replaces_existing() {
        let mut table = TemplateTable::new();
        table.insert("box", Template::new("a"));
        table.insert("box", Template::new("b"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("box").and_then(|t| t.text.as_deref()), Some("b"));
    }

    #[test]
    fn test_names_are_sorted() {
        let table = TemplateTable::new()
            .with("b", Template::new(""))
            .with("a", Template::new(""));
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_rules_compose_in_order() {
        let template = Template::new("x")
            .with_rule(RewriteRule::new("x", "y").expect("valid"))
            .with_rule(RewriteRule::new("y", "z").expect("valid"));
        assert_eq!(template.rewrite("xx".to_string()), "zz");
    }
}
