//! Template expansion engine
//!
//! Templates are named text fragments. A fragment may contain `${name}` or
//! `$name` placeholders that refer either to a scalar variable or to another
//! template. Expansion substitutes variables first, then replaces every
//! surviving placeholder that names a template with that template's own
//! expansion, after running the referenced template's rewrite rules over it.
//!
//! # Example
//!
//! ```rust
//! use file_generator::template::{resolve_one, RewriteRule, Template, TemplateTable};
//! use file_generator::Variables;
//!
//! let table = TemplateTable::new()
//!     .with("guard", Template::new("${module_name}_H"))
//!     .with(
//!         "banner",
//!         Template::new("// ${module_name}\n")
//!             .with_rule(RewriteRule::new(r"\n$", "").unwrap()),
//!     )
//!     .with("header", Template::new("${banner} (${guard})"));
//!
//! let vars = Variables::new().with("module_name", "uart");
//! assert_eq!(resolve_one("header", &table, &vars), "// uart (uart_H)");
//! ```
//!
//! Unknown names and circular references never fail; the placeholder is
//! simply left in the output.

pub mod lexer;
mod registry;
mod resolver;
mod rewrite;
mod substitute;

pub use lexer::{identifiers, is_valid, validate};
pub use registry::{Template, TemplateError, TemplateTable};
pub use rewrite::{RewriteRule, RuleError};
pub use resolver::{
    resolve, resolve_in, resolve_one, resolve_template, ResolutionContext, MAX_DEPTH,
};
pub use substitute::substitute;
