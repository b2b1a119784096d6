//! File Generator - module boilerplate from declarative templates
//!
//! This library loads a TOML template file, expands its templates for a
//! module name and writes the source, header and test files its recipes
//! describe.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use file_generator::{plan_module, GeneratorConfig};
//!
//! let config = GeneratorConfig::from_str(r#"
//! [general]
//! sources = [{ name = "${module_name}", path = "src", ext = ".c", body = ["init"] }]
//!
//! [templates]
//! src_header = { str = "// ${module_name}.c" }
//! src_footer = { str = "// end" }
//! init = { str = "void ${module_name}_init(void);" }
//! "#).unwrap();
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let files = plan_module(&config, "Foo", date);
//! assert_eq!(files[0].contents, "// Foo.c\nvoid Foo_init(void);\n// end");
//! ```

pub mod config;
pub mod error;
pub mod generate;
pub mod template;
pub mod variables;

pub use config::{ConfigError, GeneratorConfig};
pub use error::PlaceholderError;
pub use generate::{
    assemble, generate_module, plan_module, write_file, BoundRecipe, FileKind, GenerateError,
    GeneratedFile, Recipe,
};
pub use template::{resolve, resolve_one, substitute, Template, TemplateTable};
pub use variables::{Value, Variables};

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during a generation run
#[derive(Debug, Error)]
pub enum RunError {
    /// Error loading the template file
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Error writing output files
    #[error("{0}")]
    Generate(#[from] GenerateError),
}

/// Malformed placeholders of every template, by template name
///
/// Such templates are still emitted, but unexpanded.
pub fn check_templates(config: &GeneratorConfig) -> Vec<(String, Vec<PlaceholderError>)> {
    config
        .templates
        .iter()
        .filter_map(|(name, t)| {
            let text = t.text.as_deref()?;
            template::validate(text).err().map(|errors| (name.to_string(), errors))
        })
        .collect()
}

/// Load a template file and generate every module in order
///
/// Each module is generated from the same loaded file; a module never sees
/// another module's bindings.
pub fn generate(
    template_file: &Path,
    module_names: &[String],
    output_dir: &Path,
    date: NaiveDate,
) -> Result<Vec<PathBuf>, RunError> {
    let config = GeneratorConfig::from_file(template_file)?;

    let mut written = Vec::new();
    for module_name in module_names {
        written.extend(generate_module(&config, module_name, date, output_dir)?);
    }
    Ok(written)
}
