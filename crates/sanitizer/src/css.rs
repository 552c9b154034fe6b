//! Best-effort splitting of a stylesheet into `selector { declarations }` pairs.
//!
//! This is not a CSS grammar. Ordinary blocks end at the first `}` and
//! never nest; only block at-rules get depth-counted brace matching so an
//! `@media` or `@keyframes` body is captured whole. Anything that does not
//! fit (a stray `}`, a trailing unterminated rule) is skipped without error.
//!
//! Known limitation: braces inside quoted strings in a selector, as in
//! `[data-x="{"]`, are treated as structure.

use crate::error::{ParserError, ParserResult};

/// One `selector { declarations }` construct, or an at-rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRule {
    /// Selector text, or the full at-rule prelude (`@media (max-width: 600px)`)
    pub selector: String,
    /// Raw block body; empty for statement at-rules such as `@charset "x";`
    pub declarations: String,
    pub is_at_rule: bool,
    /// Lower-cased at-rule name including the `@`
    pub at_rule_name: Option<String>,
}

impl ParsedRule {
    fn ordinary(selector: &str, declarations: &str) -> Self {
        Self {
            selector: selector.to_string(),
            declarations: declarations.to_string(),
            is_at_rule: false,
            at_rule_name: None,
        }
    }

    fn at_rule(prelude: &str, body: &str) -> Self {
        Self {
            selector: prelude.to_string(),
            declarations: body.to_string(),
            is_at_rule: true,
            at_rule_name: Some(at_rule_name(prelude)),
        }
    }
}

/// Split `css` into rules in source order.
///
/// `max_depth` bounds brace nesting inside block at-rules; exceeding it is
/// the one structural failure reported as an error.
pub fn parse_rules(css: &str, max_depth: usize) -> ParserResult<Vec<ParsedRule>> {
    let bytes = css.as_bytes();
    let mut rules = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'}' => {
                // Stray close brace; whatever preceded it is not a selector
                i += 1;
                start = i;
            }
            b'{' => {
                let prelude = &css[start..i];
                let selector = push_statements(prelude, &mut rules);

                let end = if selector.starts_with('@') {
                    find_block_end(bytes, i, max_depth)?
                } else {
                    css[i + 1..].find('}').map(|offset| i + 1 + offset)
                };

                let Some(end) = end else {
                    tracing::trace!("Dropping unterminated rule at byte {}", start);
                    return Ok(rules);
                };

                let body = &css[i + 1..end];
                if selector.starts_with('@') {
                    rules.push(ParsedRule::at_rule(selector, body));
                } else if !selector.is_empty() {
                    rules.push(ParsedRule::ordinary(selector, body));
                }

                i = end + 1;
                start = i;
            }
            _ => i += 1,
        }
    }

    // Trailing text without a block can still hold statement at-rules
    push_statements(&format!("{};", &css[start..]), &mut rules);
    Ok(rules)
}

/// Split statement at-rules (`@charset "x";`) off the front of a prelude.
/// They are recorded with an empty body; other `;`-terminated debris is
/// dropped. Returns the trimmed remainder, the actual selector.
fn push_statements<'a>(prelude: &'a str, rules: &mut Vec<ParsedRule>) -> &'a str {
    let Some(last) = prelude.rfind(';') else {
        return prelude.trim();
    };

    for statement in prelude[..last].split(';') {
        let statement = statement.trim();
        if statement.starts_with('@') {
            rules.push(ParsedRule::at_rule(statement, ""));
        }
    }

    prelude[last + 1..].trim()
}

/// Index of the `}` closing the block opened at `open`, or `None` if the
/// block never closes.
fn find_block_end(bytes: &[u8], open: usize, max_depth: usize) -> ParserResult<Option<usize>> {
    let mut depth = 0usize;
    for (offset, byte) in bytes[open..].iter().enumerate() {
        match byte {
            b'{' => {
                depth += 1;
                if depth > max_depth {
                    return Err(ParserError::NestingTooDeep(depth));
                }
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(Some(open + offset));
                }
            }
            _ => {}
        }
    }
    Ok(None)
}

/// Lower-cased name of an at-rule prelude, e.g. `@media` for
/// `@MEDIA(max-width: 600px)`.
pub fn at_rule_name(prelude: &str) -> String {
    let prelude = prelude.trim_start();
    let end = prelude
        .char_indices()
        .skip(1)
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        .map(|(idx, _)| idx)
        .unwrap_or(prelude.len());
    prelude[..end].to_ascii_lowercase()
}

/// Split on `sep` where it is not inside quotes, parentheses or brackets.
///
/// `url("a;b")` stays one declaration and `:is(h1, h2)` stays one selector.
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (idx, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '(') | (None, '[') => depth += 1,
            (None, ')') | (None, ']') => depth = (depth - 1).max(0),
            (None, c) if c == sep && depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}
