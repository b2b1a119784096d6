//! Rewrite rules written in Python `re` conventions, run on the `regex` crate
//!
//! Template files were authored for `re.sub`, so two things differ from
//! plain `regex` syntax and are translated when a rule is compiled:
//!
//! - In patterns, `$` outside multiline mode also matches just before a
//!   trailing newline, and `\Z` means the absolute end of text.
//! - In replacements, groups are referenced as `\1` or `\g<name>`, `\0` and
//!   three-digit octal escapes produce characters, and `$` is literal.
//!
//! An end anchor that is followed by more pattern in the same branch is
//! matched against the absolute end of text.

use regex::Regex;
use thiserror::Error;

/// Why a rewrite rule failed to compile
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("{0}")]
    Pattern(#[from] regex::Error),

    #[error("bad replacement {replace:?}: {message}")]
    Replacement { replace: String, message: String },
}

/// A regex find-and-replace applied when a template is inlined into another
#[derive(Debug, Clone)]
pub struct RewriteRule {
    regex: Regex,
    /// Pattern as written in the template file
    pattern: String,
    /// Replacement as written in the template file
    replace: String,
    /// Replacement in `regex` crate syntax
    expansion: String,
}

impl RewriteRule {
    /// Compile a rule from a `re`-style pattern and replacement
    pub fn new(pattern: &str, replace: &str) -> Result<Self, RuleError> {
        let translated = translate_pattern(pattern);
        let regex = Regex::new(&translated.source)?;

        let mut expansion = translate_replacement(replace, &translated, &regex)?;
        // Give back the newline an end anchor had to consume
        for name in &translated.end_anchors {
            expansion.push_str(&format!("${{{}}}", name));
        }

        Ok(Self {
            regex,
            pattern: pattern.to_string(),
            replace: replace.to_string(),
            expansion,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn replace(&self) -> &str {
        &self.replace
    }

    /// Replace every match in `text`
    pub fn apply(&self, text: &str) -> String {
        self.regex
            .replace_all(text, self.expansion.as_str())
            .into_owned()
    }
}

/// A pattern rewritten into `regex` syntax
#[derive(Debug, Default)]
struct TranslatedPattern {
    source: String,
    /// Real group index of each group written in the pattern, 1-based
    user_groups: Vec<usize>,
    /// Names of the groups inserted for end anchors
    end_anchors: Vec<String>,
}

/// Whether the pattern turns on multiline mode anywhere
///
/// `$` is left alone then, since `(?m)$` means the same in both engines.
fn is_multiline(pattern: &str) -> bool {
    let bytes = pattern.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'(' if bytes[i + 1] == b'?' => {
                let flags: Vec<u8> = bytes[i + 2..]
                    .iter()
                    .copied()
                    .take_while(|b| b.is_ascii_alphabetic())
                    .collect();
                let end = bytes.get(i + 2 + flags.len()).copied();
                if flags.contains(&b'm') && matches!(end, Some(b')') | Some(b':') | Some(b'-')) {
                    return true;
                }
                i += 2;
            }
            _ => i += 1,
        }
    }
    false
}

fn translate_pattern(pattern: &str) -> TranslatedPattern {
    let multiline = is_multiline(pattern);
    let mut out = TranslatedPattern::default();
    let mut groups = 0usize;
    let mut in_class = false;
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('Z') if !in_class => out.source.push_str(r"\z"),
                Some(next) => {
                    out.source.push('\\');
                    out.source.push(next);
                }
                None => out.source.push('\\'),
            },
            '[' if !in_class => {
                in_class = true;
                out.source.push('[');
                if chars.peek() == Some(&'^') {
                    chars.next();
                    out.source.push('^');
                }
                // A leading `]` is a literal member
                if chars.peek() == Some(&']') {
                    chars.next();
                    out.source.push(']');
                }
            }
            ']' if in_class => {
                in_class = false;
                out.source.push(']');
            }
            '(' if !in_class => {
                let mut rest = chars.clone();
                let captures = match rest.next() {
                    Some('?') => match (rest.next(), rest.next()) {
                        (Some('P'), Some('<')) => true,
                        (Some('<'), Some(n)) => n != '=' && n != '!',
                        _ => false,
                    },
                    _ => true,
                };
                if captures {
                    groups += 1;
                    out.user_groups.push(groups);
                }
                out.source.push('(');
            }
            '$' if !in_class && !multiline => {
                groups += 1;
                let name = format!("__end{}", out.end_anchors.len());
                out.source.push_str(&format!("(?P<{}>\\n?)\\z", name));
                out.end_anchors.push(name);
            }
            other => out.source.push(other),
        }
    }
    out
}

fn octal_digit(c: Option<&char>) -> Option<u32> {
    c.and_then(|c| c.to_digit(8))
}

/// Translate a backslash-style replacement into `regex` expansion syntax
fn translate_replacement(
    replace: &str,
    pattern: &TranslatedPattern,
    regex: &Regex,
) -> Result<String, RuleError> {
    let fail = |message: String| RuleError::Replacement {
        replace: replace.to_string(),
        message,
    };
    let group_ref = |index: usize| -> Result<String, RuleError> {
        if index == 0 {
            return Ok("${0}".to_string());
        }
        pattern
            .user_groups
            .get(index - 1)
            .map(|real| format!("${{{}}}", real))
            .ok_or_else(|| fail(format!("invalid group reference {}", index)))
    };

    let mut out = String::with_capacity(replace.len());
    let mut chars = replace.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' {
            out.push_str("$$");
            continue;
        }
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some(next) = chars.next() else {
            return Err(fail("bad escape (end of replacement)".to_string()));
        };
        match next {
            '0' => {
                // `\0` plus up to two more octal digits
                let mut value = 0;
                for _ in 0..2 {
                    match octal_digit(chars.peek()) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                push_literal(&mut out, value);
            }
            '1'..='9' => {
                let first = next.to_digit(10).unwrap_or_default();
                let mut lookahead = chars.clone();
                let second = lookahead.next();
                let third = lookahead.next();

                let octal = next.to_digit(8).is_some()
                    && octal_digit(second.as_ref()).is_some()
                    && octal_digit(third.as_ref()).is_some();
                if octal {
                    let value = first * 64
                        + octal_digit(second.as_ref()).unwrap_or_default() * 8
                        + octal_digit(third.as_ref()).unwrap_or_default();
                    if value > 0o377 {
                        return Err(fail(format!(
                            "octal escape value \\{}{}{} outside of range 0-0o377",
                            next,
                            second.unwrap_or('0'),
                            third.unwrap_or('0')
                        )));
                    }
                    chars.next();
                    chars.next();
                    push_literal(&mut out, value);
                } else {
                    let mut index = first as usize;
                    if let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                        index = index * 10 + d as usize;
                        chars.next();
                    }
                    out.push_str(&group_ref(index)?);
                }
            }
            'g' => {
                if chars.next() != Some('<') {
                    return Err(fail("missing < after \\g".to_string()));
                }
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('>') => break,
                        Some(ch) => name.push(ch),
                        None => {
                            return Err(fail(format!("missing >, unterminated name \\g<{}", name)));
                        }
                    }
                }
                if name.is_empty() {
                    return Err(fail("missing group name in \\g<>".to_string()));
                }
                if let Ok(index) = name.parse::<usize>() {
                    out.push_str(&group_ref(index)?);
                } else if regex.capture_names().flatten().any(|n| n == name) {
                    out.push_str(&format!("${{{}}}", name));
                } else {
                    return Err(fail(format!("unknown group name '{}'", name)));
                }
            }
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '\\' => out.push('\\'),
            letter if letter.is_ascii_alphabetic() => {
                return Err(fail(format!("bad escape \\{}", letter)));
            }
            other => {
                out.push('\\');
                if other == '$' {
                    out.push_str("$$");
                } else {
                    out.push(other);
                }
            }
        }
    }
    Ok(out)
}

fn push_literal(out: &mut String, value: u32) {
    match char::from_u32(value) {
        Some('$') => out.push_str("$$"),
        Some(ch) => out.push(ch),
        None => {}
    }
}
