//! Single-pass, missing-safe placeholder substitution

use super::lexer::{tokenize, Token};
use crate::variables::Bindings;

/// Replace every `${name}` / `$name` bound in `bindings`
///
/// Unbound placeholders and stray `$` are left untouched, `$$` becomes `$`.
pub fn substitute(text: &str, bindings: &impl Bindings) -> String {
    substitute_with(text, bindings, true)
}

/// Like [`substitute`] but leaves `$$` escapes in place
///
/// Used for intermediate passes so that a text is unescaped exactly once.
pub(crate) fn substitute_keep_escapes(text: &str, bindings: &impl Bindings) -> String {
    substitute_with(text, bindings, false)
}

fn substitute_with(text: &str, bindings: &impl Bindings, unescape: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (tok, span) in tokenize(text) {
        match &tok {
            Token::Escape if unescape => out.push('$'),
            Token::Braced(id) | Token::Named(id) => match bindings.binding(id) {
                Some(value) => out.push_str(&value),
                None => out.push_str(&text[span]),
            },
            _ => out.push_str(&text[span]),
        }
    }
    out
}
