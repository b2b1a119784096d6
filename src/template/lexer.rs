//! Placeholder lexer for template text using logos

use logos::Logos;

use crate::error::{PlaceholderError, Span};

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    /// `$$`, a literal dollar sign
    #[token("$$")]
    Escape,

    /// `${identifier}`
    #[regex(r"\$\{[A-Za-z0-9_]+\}", |lex| {
        let s = lex.slice();
        s[2..s.len() - 1].to_string()
    })]
    Braced(String),

    /// `$identifier`
    #[regex(r"\$[A-Za-z0-9_]+", |lex| lex.slice()[1..].to_string())]
    Named(String),

    /// A `$` that starts no placeholder (including an unclosed `${`)
    #[token("$")]
    Stray,

    #[regex(r"[^$]+")]
    Text,
}

impl Token {
    /// The placeholder identifier, if this token is a placeholder
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Token::Braced(id) | Token::Named(id) => Some(id),
            _ => None,
        }
    }
}

/// Tokenize template text, pairing each token with its byte span
///
/// Bytes the lexer cannot classify are reported as `Text`, so joining the
/// spans always reproduces the input.
pub fn tokenize(text: &str) -> Vec<(Token, Span)> {
    Token::lexer(text)
        .spanned()
        .map(|(tok, span)| (tok.unwrap_or(Token::Text), span))
        .collect()
}

/// Distinct placeholder identifiers in order of first occurrence
pub fn identifiers(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for (tok, _) in tokenize(text) {
        if let Some(id) = tok.identifier() {
            if !seen.iter().any(|s: &String| s == id) {
                seen.push(id.to_string());
            }
        }
    }
    seen
}

/// Check that every `$` in the text starts an escape or a placeholder
pub fn validate(text: &str) -> Result<(), Vec<PlaceholderError>> {
    let errors: Vec<PlaceholderError> = tokenize(text)
        .into_iter()
        .filter(|(tok, _)| *tok == Token::Stray)
        .map(|(_, span)| {
            let message = if text[span.end..].starts_with('{') {
                "unterminated or empty '${' placeholder".to_string()
            } else {
                "expected an identifier, '{' or '$' after '$'".to_string()
            };
            PlaceholderError::Syntax { span, message }
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Whether the text contains only well-formed placeholders
pub fn is_valid(text: &str) -> bool {
    validate(text).is_ok()
}
