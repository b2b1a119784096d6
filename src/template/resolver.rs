//! Template resolution - expands templates that reference other templates

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, trace, warn};

use super::lexer::{identifiers, is_valid};
use super::registry::TemplateTable;
use super::substitute::{substitute, substitute_keep_escapes};
use crate::variables::Variables;

/// Maximum nesting of template references followed from one top-level template
pub const MAX_DEPTH: usize = 64;

/// Context for template resolution
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    /// Templates currently being resolved, outermost first
    chain: Vec<String>,
    /// Same names as `chain`, for cycle detection
    resolving: HashSet<String>,
}

impl ResolutionContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a template is currently being resolved (cycle detection)
    pub fn is_resolving(&self, name: &str) -> bool {
        self.resolving.contains(name)
    }

    /// Number of templates currently being resolved
    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    /// Mark a template as being resolved
    pub fn start_resolving(&mut self, name: &str) {
        self.chain.push(name.to_string());
        self.resolving.insert(name.to_string());
    }

    /// Mark a template as done resolving
    pub fn done_resolving(&mut self, name: &str) {
        if let Some(pos) = self.chain.iter().rposition(|n| n == name) {
            self.chain.remove(pos);
        }
        self.resolving.remove(name);
    }

    /// Current chain followed by `next`, for diagnostics
    fn describe(&self, next: &str) -> String {
        let mut parts: Vec<&str> = self.chain.iter().map(|s| s.as_str()).collect();
        parts.push(next);
        parts.join(" -> ")
    }
}

fn placeholder(name: &str) -> String {
    format!("${{{}}}", name)
}

/// Resolve every template with text in the table
///
/// Well-formed templates are fully expanded. Templates containing a stray
/// `$` are passed through with their raw text. Templates without text are
/// left out of the result.
pub fn resolve(table: &TemplateTable, vars: &Variables) -> BTreeMap<String, String> {
    table
        .names()
        .filter_map(|name| Some((name.to_string(), resolve_template(name, table, vars)?)))
        .collect()
}

/// Resolve one entry the way [`resolve`] does
///
/// `None` when the template is absent or has no text.
pub fn resolve_template(name: &str, table: &TemplateTable, vars: &Variables) -> Option<String> {
    let Some(text) = table.get(name)?.text.as_deref() else {
        trace!(template = name, "skipping template without text");
        return None;
    };
    if text.is_empty() {
        return Some(String::new());
    }
    if !is_valid(text) {
        warn!(template = name, "template has malformed placeholders, leaving it unexpanded");
        return Some(text.to_string());
    }
    Some(resolve_one(name, table, vars))
}

/// Resolve one template as a top-level target
///
/// The template's own rewrite rules are not applied; they only apply when it
/// is inlined into another template.
pub fn resolve_one(name: &str, table: &TemplateTable, vars: &Variables) -> String {
    let mut ctx = ResolutionContext::new();
    resolve_in(name, table, vars, &mut ctx)
}

/// Resolve a template within an ongoing resolution
pub fn resolve_in(
    name: &str,
    table: &TemplateTable,
    vars: &Variables,
    ctx: &mut ResolutionContext,
) -> String {
    let Some(text) = table.get(name).and_then(|t| t.text.as_deref()) else {
        return placeholder(name);
    };

    // Check for circular references
    if ctx.is_resolving(name) {
        debug!(chain = %ctx.describe(name), "circular template reference left unresolved");
        return placeholder(name);
    }

    if ctx.depth() >= MAX_DEPTH {
        warn!(
            template = name,
            depth = ctx.depth(),
            "template nesting too deep, reference left unresolved"
        );
        return placeholder(name);
    }

    // Variables first; whatever survives may name another template
    let partial = substitute_keep_escapes(text, vars);

    ctx.start_resolving(name);

    let mut expansions: HashMap<String, String> = HashMap::new();
    for ident in identifiers(&partial) {
        let Some(dependency) = table.get(&ident) else {
            continue;
        };
        let expanded = resolve_in(&ident, table, vars, ctx);
        expansions.insert(ident, dependency.rewrite(expanded));
    }

    ctx.done_resolving(name);

    substitute(&partial, &expansions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{RewriteRule, Template};
    use pretty_assertions::assert_eq;

    fn rule(pattern: &str, replace: &str) -> RewriteRule {
        RewriteRule::new(pattern, replace).expect("valid rule")
    }

    #[test]
    fn test_plain_template_is_unchanged() {
        let table = TemplateTable::new().with("a", Template::new("int x = 1;\n"));
        assert_eq!(resolve_one("a", &table, &Variables::new()), "int x = 1;\n");
    }

    #[test]
    fn test_missing_template_is_placeholder() {
        let table = TemplateTable::new();
        assert_eq!(resolve_one("nope", &table, &Variables::new()), "${nope}");
    }

    #[test]
    fn test_template_without_text_is_placeholder() {
        let table = TemplateTable::new().with("empty", Template::default());
        assert_eq!(resolve_one("empty", &table, &Variables::new()), "${empty}");
    }

    #[test]
    fn test_dependency_inlining() {
        let table = TemplateTable::new()
            .with("A", Template::new("${B} end"))
            .with("B", Template::new("mid"));
        assert_eq!(resolve_one("A", &table, &Variables::new()), "mid end");
    }

    #[test]
    fn test_bare_dependency_reference() {
        let table = TemplateTable::new()
            .with("A", Template::new("<$B>"))
            .with("B", Template::new("mid"));
        assert_eq!(resolve_one("A", &table, &Variables::new()), "<mid>");
    }

    #[test]
    fn test_rules_apply_only_when_inlined() {
        let table = TemplateTable::new()
            .with("A", Template::new("${B}"))
            .with("B", Template::new("x").with_rule(rule("x", "y")));
        let vars = Variables::new();
        assert_eq!(resolve_one("A", &table, &vars), "y");
        assert_eq!(resolve_one("B", &table, &vars), "x");
    }

    #[test]
    fn test_rules_see_substituted_variables() {
        let table = TemplateTable::new()
            .with("A", Template::new("[${B}]"))
            .with(
                "B",
                Template::new("// ${module_name}\n").with_rule(rule(r"\n", "")),
            );
        let vars = Variables::new().with("module_name", "uart");
        assert_eq!(resolve_one("A", &table, &vars), "[// uart]");
    }

    #[test]
    fn test_end_anchored_rule_on_inlined_text() {
        let table = TemplateTable::new()
            .with("A", Template::new("[${B}]"))
            .with("B", Template::new("int x;\n").with_rule(rule(";$", "")));
        assert_eq!(resolve_one("A", &table, &Variables::new()), "[int x\n]");
    }

    #[test]
    fn test_nested_rules_apply_at_each_level() {
        let table = TemplateTable::new()
            .with("A", Template::new("${B}"))
            .with("B", Template::new("b${C}").with_rule(rule("b", "B")))
            .with("C", Template::new("c").with_rule(rule("c", "bc")));
        // C inlined into B gives "bbc"; B's rule then uppercases every b
        assert_eq!(resolve_one("A", &table, &Variables::new()), "BBc");
    }

    #[test]
    fn test_cycle_terminates_with_placeholder() {
        let table = TemplateTable::new()
            .with("A", Template::new("${B}"))
            .with("B", Template::new("${A}"));
        let out = resolve_one("A", &table, &Variables::new());
        assert_eq!(out, "${A}");
    }

    #[test]
    fn test_self_reference() {
        let table = TemplateTable::new().with("A", Template::new("a(${A})"));
        assert_eq!(resolve_one("A", &table, &Variables::new()), "a(${A})");
    }

    #[test]
    fn test_diamond_is_resolved_twice() {
        let table = TemplateTable::new()
            .with("top", Template::new("${left}|${right}"))
            .with("left", Template::new("L${shared}"))
            .with("right", Template::new("R${shared}"))
            .with("shared", Template::new("s"));
        assert_eq!(resolve_one("top", &table, &Variables::new()), "Ls|Rs");
    }

    #[test]
    fn test_variable_shadows_template() {
        let table = TemplateTable::new()
            .with("A", Template::new("${name}"))
            .with("name", Template::new("template"));
        let vars = Variables::new().with("name", "variable");
        assert_eq!(resolve_one("A", &table, &vars), "variable");
    }

    #[test]
    fn test_unknown_identifier_survives() {
        let table = TemplateTable::new().with("A", Template::new("${x} $y"));
        assert_eq!(resolve_one("A", &table, &Variables::new()), "${x} $y");
    }

    #[test]
    fn test_escape_unescaped_once() {
        let table = TemplateTable::new()
            .with("A", Template::new("$$B costs $$$$5"))
            .with("B", Template::new("nope"));
        assert_eq!(resolve_one("A", &table, &Variables::new()), "$B costs $$5");
    }

    #[test]
    fn test_inlined_text_is_not_rescanned() {
        let table = TemplateTable::new()
            .with("A", Template::new("${B}"))
            .with("B", Template::new("$$C"))
            .with("C", Template::new("nope"));
        assert_eq!(resolve_one("A", &table, &Variables::new()), "$C");
    }

    #[test]
    fn test_depth_limit() {
        let mut table = TemplateTable::new();
        for i in 0..(MAX_DEPTH + 10) {
            table.insert(format!("t{}", i), Template::new(format!("${{t{}}}", i + 1)));
        }
        let out = resolve_one("t0", &table, &Variables::new());
        assert!(out.starts_with("${t"));
    }

    #[test]
    fn test_resolve_whole_table() {
        let table = TemplateTable::new()
            .with("A", Template::new("${B}!"))
            .with("B", Template::new("${module_name}"))
            .with("broken", Template::new("cost $ 5 ${B}"))
            .with("no_text", Template::default());
        let vars = Variables::new().with("module_name", "foo");
        let resolved = resolve(&table, &vars);
        assert_eq!(resolved.get("A").map(String::as_str), Some("foo!"));
        assert_eq!(resolved.get("B").map(String::as_str), Some("foo"));
        assert_eq!(
            resolved.get("broken").map(String::as_str),
            Some("cost $ 5 ${B}")
        );
        assert!(!resolved.contains_key("no_text"));
    }

    #[test]
    fn test_resolve_template_entry() {
        let table = TemplateTable::new()
            .with("A", Template::new("${B}!"))
            .with("B", Template::new("b"))
            .with("blank", Template::new(""))
            .with("no_text", Template::default());
        let vars = Variables::new();
        assert_eq!(resolve_template("A", &table, &vars).as_deref(), Some("b!"));
        assert_eq!(resolve_template("blank", &table, &vars).as_deref(), Some(""));
        assert_eq!(resolve_template("no_text", &table, &vars), None);
        assert_eq!(resolve_template("absent", &table, &vars), None);
    }

    #[test]
    fn test_context_tracks_chain() {
        let mut ctx = ResolutionContext::new();
        ctx.start_resolving("a");
        ctx.start_resolving("b");
        assert!(ctx.is_resolving("a"));
        assert_eq!(ctx.depth(), 2);
        assert_eq!(ctx.describe("a"), "a -> b -> a");
        ctx.done_resolving("b");
        assert!(!ctx.is_resolving("b"));
        assert_eq!(ctx.depth(), 1);
    }
}
