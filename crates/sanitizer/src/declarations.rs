//! Declaration filter: property allowlist, value re-scan and URL validation.

use regex::Regex;

use pixelpage_security::{SchemePolicy, SecurityError};

use crate::css::split_top_level;
use crate::patterns;
use crate::sanitizer::Diagnostics;
use crate::tables::{is_allowed_property, BLOCKED_PLACEHOLDER};

lazy_static::lazy_static! {
    static ref URL_FUNCTION: Regex = Regex::new(r"(?i)\burl\s*\(").unwrap();
    static ref URL_TOKEN: Regex = Regex::new(
        r#"(?i)\burl\s*\(\s*(?:"([^"]*)"|'([^']*)'|([^"'()\s]*))\s*\)"#
    ).unwrap();
    // Also matches the -webkit- prefixed form
    static ref IMAGE_SET: Regex = Regex::new(r"(?i)\bimage-set\s*\(").unwrap();
}

/// Filter a declaration block body, returning the surviving declarations
/// joined with `; ` in source order. An empty string means nothing survived.
pub fn filter_declarations(body: &str, diagnostics: &mut Diagnostics, policy: &SchemePolicy) -> String {
    let mut kept = Vec::new();

    for raw in split_top_level(body, ';') {
        let Some((property, value)) = raw.split_once(':') else {
            continue;
        };

        let property = property.trim().to_ascii_lowercase();
        if property.is_empty() {
            continue;
        }
        if !is_allowed_property(&property) {
            diagnostics.remove(SecurityError::BlockedProperty { property });
            continue;
        }

        if let Some(value) = sanitize_value(&property, value.trim(), diagnostics, policy) {
            kept.push(format!("{}: {}", property, value));
        }
    }

    kept.join("; ")
}

/// `None` drops the declaration.
fn sanitize_value(
    property: &str,
    value: &str,
    diagnostics: &mut Diagnostics,
    policy: &SchemePolicy,
) -> Option<String> {
    // Placeholders were already reported by the interceptor
    if value.is_empty() || value.contains(BLOCKED_PLACEHOLDER) {
        return None;
    }

    // A brace would open a block in the emitted rule
    if value.contains('{') {
        diagnostics.remove(SecurityError::BlockedValue {
            property: property.to_string(),
            pattern: "{".to_string(),
        });
        return None;
    }

    if let Some(pattern) = patterns::first_match(value) {
        diagnostics.remove(SecurityError::BlockedValue {
            property: property.to_string(),
            pattern: pattern.source().to_string(),
        });
        return None;
    }

    // The tokenizer decodes escapes in identifiers, so `u\rl(` is a url()
    if has_unquoted_escape(value) {
        diagnostics.remove(SecurityError::EscapedValue {
            property: property.to_string(),
        });
        return None;
    }

    if URL_FUNCTION.is_match(value) {
        validate_urls(property, value, diagnostics, policy)?;
    }

    for literal in image_set_strings(value) {
        if !check_url(property, literal, diagnostics, policy) {
            return None;
        }
    }

    Some(value.to_string())
}

/// Whether `value` has a backslash outside a quoted string.
fn has_unquoted_escape(value: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(_), '\\') => {
                chars.next();
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\\') => return true,
            (None, '"') | (None, '\'') => quote = Some(c),
            _ => {}
        }
    }
    false
}

/// Quoted strings passed directly to `image-set()`. Browsers load them as
/// URLs without any `url(` token. Strings nested deeper, as in `type("...")`
/// or `url("...")`, are not returned.
fn image_set_strings(value: &str) -> Vec<&str> {
    let mut literals = Vec::new();

    for found in IMAGE_SET.find_iter(value) {
        let args = &value[found.end()..];
        let mut depth = 1usize;
        let mut quote: Option<(char, usize)> = None;
        let mut escaped = false;

        for (idx, c) in args.char_indices() {
            if let Some((q, start)) = quote {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    if depth == 1 {
                        literals.push(&args[start..idx]);
                    }
                    quote = None;
                }
                continue;
            }
            match c {
                '"' | '\'' => quote = Some((c, idx + c.len_utf8())),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }

        // An unterminated string still reaches the browser
        if let Some((_, start)) = quote {
            if depth == 1 {
                literals.push(&args[start..]);
            }
        }
    }

    literals
}

fn check_url(property: &str, literal: &str, diagnostics: &mut Diagnostics, policy: &SchemePolicy) -> bool {
    match policy.check(literal) {
        Ok(()) => true,
        Err(reason) => {
            diagnostics.remove(SecurityError::UrlRejected {
                property: property.to_string(),
                reason: Box::new(reason),
            });
            false
        }
    }
}

/// Check every `url(...)` in `value`. Any malformed or rejected URL fails the
/// whole value.
pub fn validate_urls(
    property: &str,
    value: &str,
    diagnostics: &mut Diagnostics,
    policy: &SchemePolicy,
) -> Option<String> {
    let opened = URL_FUNCTION.find_iter(value).count();
    let tokens: Vec<_> = URL_TOKEN.captures_iter(value).collect();

    // Every url( must be a well-formed token we can actually inspect
    if tokens.len() != opened {
        diagnostics.remove(SecurityError::MalformedUrl { property: property.to_string() });
        return None;
    }

    for caps in &tokens {
        let literal = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());

        if !check_url(property, literal, diagnostics, policy) {
            return None;
        }
    }

    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn filter(body: &str) -> (String, Vec<String>) {
        let mut diagnostics = Diagnostics::default();
        let out = filter_declarations(body, &mut diagnostics, &SchemePolicy::default());
        (out, diagnostics.removed)
    }

    #[test]
    fn test_allowed_declarations_kept_in_order() {
        let (out, removed) = filter(" display: flex; WIDTH: 100%;margin:10px; ");
        assert_eq!(out, "display: flex; width: 100%; margin: 10px");
        assert!(removed.is_empty());
    }

    #[test]
    fn test_disallowed_property_named() {
        let (out, removed) = filter("color: red; behavior: url(x.htc); content: 'x'");
        assert_eq!(out, "color: red");
        assert_eq!(
            removed,
            vec!["Blocked property: behavior", "Blocked property: content"]
        );
    }

    #[test]
    fn test_dangerous_value_dropped() {
        let (out, removed) = filter("width: expression(alert(1)); color: blue");
        assert_eq!(out, "color: blue");
        assert_eq!(
            removed,
            vec![r"Blocked dangerous pattern in value for width: expression\s*\("]
        );
    }

    #[test]
    fn test_brace_in_value_dropped() {
        let (out, removed) = filter("color: { red; margin: 0");
        assert_eq!(out, "margin: 0");
        assert_eq!(removed, vec!["Blocked dangerous pattern in value for color: {"]);
    }

    #[test]
    fn test_fragments_without_colon_ignored() {
        let (out, removed) = filter("garbage; ; color: red; : blue");
        assert_eq!(out, "color: red");
        assert!(removed.is_empty());
    }

    #[test]
    fn test_urls_accepted() {
        let (out, removed) = filter(
            "background-image: url(https://example.com/a.jpg); background: url('/img/bg.png') no-repeat",
        );
        assert_eq!(
            out,
            "background-image: url(https://example.com/a.jpg); background: url('/img/bg.png') no-repeat"
        );
        assert!(removed.is_empty());
    }

    #[test]
    fn test_semicolon_inside_url_kept_together() {
        let (out, _) = filter(r#"background-image: url("/a;b.png"); color: red"#);
        assert_eq!(out, r#"background-image: url("/a;b.png"); color: red"#);
    }

    #[test]
    fn test_bad_scheme_fails_declaration_only() {
        let (out, removed) = filter("background-image: url(ftp://x/y.png); color: red");
        assert_eq!(out, "color: red");
        assert_eq!(
            removed,
            vec!["Blocked URL with invalid protocol: ftp: (in background-image)"]
        );
    }

    #[test]
    fn test_data_url_rejected() {
        let (out, removed) = filter("list-style-image: url( \"data:image/png;base64,AAAA\" )");
        assert_eq!(out, "");
        assert_eq!(removed.len(), 1);
        assert!(removed[0].starts_with("Blocked dangerous pattern in value for list-style-image"));

        // Tab noise slips past the pattern but not the scheme check
        let (out, removed) = filter("list-style-image: url(\"da\tta:image/png;base64,AAAA\")");
        assert_eq!(out, "");
        assert_eq!(removed.len(), 1);
        assert!(removed[0].starts_with("Blocked data URL: da\tta:image/png"));
    }

    #[test]
    fn test_one_bad_url_among_many_fails_value() {
        let (out, removed) = filter(
            "background: url(/ok.png), url(gopher://x) ; color: red",
        );
        assert_eq!(out, "color: red");
        assert_eq!(removed.len(), 1);
    }

    #[test]
    fn test_malformed_url_rejected() {
        let (out, removed) = filter("background: url(a b)");
        assert_eq!(out, "");
        assert_eq!(removed, vec!["Blocked malformed url() in background"]);

        let (out, removed) = filter("background: url(url(/x.png))");
        assert_eq!(out, "");
        assert_eq!(removed.len(), 1);
    }

    #[test]
    fn test_escaped_function_name_rejected() {
        let (out, removed) = filter(r"background-image: u\rl(data:image/svg+xml,PHN2Zz4=); color: red");
        assert_eq!(out, "color: red");
        assert_eq!(removed, vec!["Blocked escape sequence in background-image"]);

        let (out, _) = filter(r"background: \75rl(ftp://evil/x.png)");
        assert_eq!(out, "");
    }

    #[test]
    fn test_escape_inside_string_allowed() {
        let (out, removed) = filter(r#"font-family: "Font\"Name", serif"#);
        assert_eq!(out, r#"font-family: "Font\"Name", serif"#);
        assert!(removed.is_empty());
    }

    #[test]
    fn test_image_set_strings_checked() {
        let (out, removed) = filter(r#"background-image: image-set("data:image/svg+xml,PHN2Zz4=" 1x)"#);
        assert_eq!(out, "");
        assert_eq!(removed.len(), 1);
        assert!(removed[0].starts_with("Blocked data URL: data:image/svg+xml"));
        assert!(removed[0].ends_with("(in background-image)"));

        let (out, removed) = filter(r#"background-image: -webkit-image-set('ftp://x/a.png' 1x)"#);
        assert_eq!(out, "");
        assert_eq!(removed, vec!["Blocked URL with invalid protocol: ftp: (in background-image)"]);
    }

    #[test]
    fn test_image_set_safe_candidates_kept() {
        let css = r#"background-image: image-set("/a.png" 1x, url(https://x/b.png) 2x type("image/png"))"#;
        let (out, removed) = filter(css);
        assert_eq!(out, css);
        assert!(removed.is_empty());
    }

    #[test]
    fn test_neutralized_value_dropped_silently() {
        let (out, removed) = filter("background: url(/* BLOCKED */alert(1)); color: red");
        assert_eq!(out, "color: red");
        assert!(removed.is_empty());
    }
}
