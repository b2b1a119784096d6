//! Template file loading
//!
//! A template file is a TOML document holding the templates, the recipes for
//! the files to generate, and any extra variables. It is loaded once and not
//! modified afterwards; every module gets its own bindings on top of it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::generate::{FileKind, Recipe};
use crate::template::{RewriteRule, Template, TemplateError, TemplateTable};
use crate::variables::Variables;

/// Errors that can occur when loading or parsing a template file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read template file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse template TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// A loaded template file
#[derive(Debug, Clone, Default)]
pub struct GeneratorConfig {
    /// Optional name of the template set
    pub name: Option<String>,
    /// Variables from `[special_variables]`
    pub variables: Variables,
    pub sources: Vec<Recipe>,
    pub headers: Vec<Recipe>,
    pub tests: Vec<Recipe>,
    pub templates: TemplateTable,
}

/// TOML structure for deserializing template files
#[derive(Deserialize)]
struct TomlConfig {
    name: Option<String>,
    inherit: Option<toml::Value>,
    merge: Option<toml::Value>,
    #[serde(default)]
    special_variables: Variables,
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    templates: BTreeMap<String, TomlTemplate>,
}

#[derive(Deserialize, Default)]
struct TomlGeneral {
    #[serde(default)]
    sources: Vec<Recipe>,
    #[serde(default)]
    headers: Vec<Recipe>,
    #[serde(default)]
    test: Vec<Recipe>,
}

#[derive(Deserialize)]
struct TomlTemplate {
    #[serde(rename = "str")]
    text: Option<String>,
    #[serde(default, rename = "sub")]
    rules: Vec<TomlRule>,
}

#[derive(Deserialize)]
struct TomlRule {
    pattern: String,
    #[serde(default)]
    replace: String,
}

impl GeneratorConfig {
    /// Load a template file from disk
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a template file from a TOML string
    ///
    /// Every rewrite rule is compiled here, so a bad pattern fails the load
    /// before any module is generated.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;

        if parsed.inherit.is_some() {
            warn!("'inherit' is not supported and will be ignored");
        }
        if parsed.merge.is_some() {
            warn!("'merge' is not supported and will be ignored");
        }

        let mut templates = TemplateTable::new();
        for (name, entry) in parsed.templates {
            let mut template = Template {
                text: entry.text,
                rules: Vec::with_capacity(entry.rules.len()),
            };
            for rule in entry.rules {
                let compiled = RewriteRule::new(&rule.pattern, &rule.replace).map_err(|source| {
                    TemplateError::InvalidRule {
                        template: name.clone(),
                        pattern: rule.pattern.clone(),
                        source,
                    }
                })?;
                template.rules.push(compiled);
            }
            templates.insert(name, template);
        }

        debug!(
            templates = templates.len(),
            variables = parsed.special_variables.len(),
            "loaded template file"
        );

        Ok(GeneratorConfig {
            name: parsed.name,
            variables: parsed.special_variables,
            sources: parsed.general.sources,
            headers: parsed.general.headers,
            tests: parsed.general.test,
            templates,
        })
    }

    /// Recipes of one file kind
    pub fn recipes(&self, kind: FileKind) -> &[Recipe] {
        match kind {
            FileKind::Source => &self.sources,
            FileKind::Header => &self.headers,
            FileKind::Test => &self.tests,
        }
    }
}
