//! Error types for placeholder syntax checking

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in template text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaceholderError {
    #[error("Invalid placeholder at {span:?}: {message}")]
    Syntax { span: Span, message: String },
}

impl PlaceholderError {
    pub fn span(&self) -> &Span {
        match self {
            PlaceholderError::Syntax { span, .. } => span,
        }
    }

    /// Format the error with template context using ariadne
    pub fn format(&self, source: &str, template: &str) -> String {
        let mut buf = Vec::new();
        match self {
            PlaceholderError::Syntax { span, message } => {
                let written = Report::build(ReportKind::Error, template, span.start)
                    .with_message(format!("malformed placeholder in template '{}'", template))
                    .with_label(
                        Label::new((template, span.clone()))
                            .with_message(message)
                            .with_color(Color::Red),
                    )
                    .with_help("write `$$` for a literal dollar sign")
                    .finish()
                    .write((template, Source::from(source)), &mut buf);

                if written.is_err() {
                    return self.to_string();
                }
            }
        }
        String::from_utf8(buf).unwrap_or_else(|_| self.to_string())
    }
}
