//! Assembling and writing output files from resolved templates

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::template::{resolve_template, substitute, TemplateTable};
use crate::variables::{date_variables, file_variables, Variables};

/// Errors that can occur while writing generated files
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The category of an output file, which decides its surrounding sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Source,
    Header,
    Test,
}

impl FileKind {
    pub const ALL: [FileKind; 3] = [FileKind::Source, FileKind::Header, FileKind::Test];

    /// Section placed before the recipe body
    pub fn leading_section(self) -> &'static str {
        match self {
            FileKind::Source => "src_header",
            FileKind::Header => "inc_header",
            FileKind::Test => "test_header",
        }
    }

    /// Section placed after the recipe body
    pub fn trailing_section(self) -> &'static str {
        match self {
            FileKind::Source => "src_footer",
            FileKind::Header => "inc_footer",
            FileKind::Test => "test_footer",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Source => write!(f, "source"),
            FileKind::Header => write!(f, "header"),
            FileKind::Test => write!(f, "test"),
        }
    }
}

/// Declarative description of one output file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Recipe {
    /// File base name pattern, e.g. `${module_name}_priv`
    pub name: String,
    /// Destination directory pattern, relative to the output directory
    #[serde(default)]
    pub path: String,
    /// Extension including the dot
    #[serde(default)]
    pub ext: String,
    /// Template names making up the file body
    #[serde(default)]
    pub body: Vec<String>,
}

impl Recipe {
    /// Bind the name and path patterns to a module
    pub fn bind(&self, module_name: &str) -> BoundRecipe {
        let vars = Variables::new().with("module_name", module_name);
        BoundRecipe {
            module_name: module_name.to_string(),
            base_name: substitute(&self.name, &vars),
            path: substitute(&self.path, &vars),
            ext: self.ext.clone(),
            body: self.body.clone(),
        }
    }
}

/// A recipe whose name and path belong to one module
#[derive(Debug, Clone, PartialEq)]
pub struct BoundRecipe {
    pub module_name: String,
    pub base_name: String,
    pub path: String,
    pub ext: String,
    pub body: Vec<String>,
}

impl BoundRecipe {
    pub fn file_name(&self) -> String {
        format!("{}{}", self.base_name, self.ext)
    }

    /// Destination relative to the output directory
    pub fn relative_path(&self) -> PathBuf {
        Path::new(&self.path).join(self.file_name())
    }

    /// Body wrapped in the leading and trailing sections of `kind`
    pub fn sections(&self, kind: FileKind) -> Vec<&str> {
        let mut sections = Vec::with_capacity(self.body.len() + 2);
        sections.push(kind.leading_section());
        sections.extend(self.body.iter().map(|s| s.as_str()));
        sections.push(kind.trailing_section());
        sections
    }
}

/// A file produced for a module
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFile {
    pub kind: FileKind,
    /// Path relative to the output directory
    pub path: PathBuf,
    pub contents: String,
}

/// Build the contents of one file
///
/// Each section is resolved with the module variables plus the file
/// variables of `recipe`, then sections are joined with a single newline.
/// A section missing from `templates` appears as its `${name}` placeholder.
pub fn assemble(
    kind: FileKind,
    recipe: &BoundRecipe,
    templates: &TemplateTable,
    module_vars: &Variables,
) -> String {
    let mut vars = module_vars.clone();
    vars.extend(&file_variables(&recipe.module_name, &recipe.base_name, &recipe.ext));

    recipe
        .sections(kind)
        .into_iter()
        .map(|section| match resolve_template(section, templates, &vars) {
            Some(text) => text,
            None => {
                warn!(section, file = %recipe.file_name(), "unknown section");
                format!("${{{}}}", section)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Variables for one module run: the template file's own variables, the
/// calendar date and the module name
pub fn module_variables(config: &GeneratorConfig, module_name: &str, date: NaiveDate) -> Variables {
    let mut vars = config.variables.clone();
    vars.extend(&date_variables(date));
    vars.with_module(module_name)
}

/// Compute every file of a module without touching the file system
pub fn plan_module(config: &GeneratorConfig, module_name: &str, date: NaiveDate) -> Vec<GeneratedFile> {
    let vars = module_variables(config, module_name, date);

    let mut files = Vec::new();
    for kind in FileKind::ALL {
        for recipe in config.recipes(kind) {
            let bound = recipe.bind(module_name);
            let contents = assemble(kind, &bound, &config.templates, &vars);
            files.push(GeneratedFile {
                kind,
                path: bound.relative_path(),
                contents,
            });
        }
        debug!(module = module_name, %kind, count = config.recipes(kind).len(), "planned files");
    }
    files
}

/// Write one file below `output_dir`, creating directories as needed
pub fn write_file(output_dir: &Path, file: &GeneratedFile) -> Result<PathBuf, GenerateError> {
    let dst = output_dir.join(&file.path);
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).map_err(|source| GenerateError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    debug!(path = %dst.display(), "writing file");
    std::fs::write(&dst, &file.contents).map_err(|source| GenerateError::Write {
        path: dst.clone(),
        source,
    })?;
    Ok(dst)
}

/// Generate and write every file of a module
///
/// Returns the absolute paths written, in recipe order.
pub fn generate_module(
    config: &GeneratorConfig,
    module_name: &str,
    date: NaiveDate,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, GenerateError> {
    info!(module = module_name, "generating files");

    let mut written = Vec::new();
    for file in plan_module(config, module_name, date) {
        written.push(write_file(output_dir, &file)?);
    }

    info!(module = module_name, files = written.len(), "generated files");
    Ok(written)
}
