//! Scoping transformer.
//!
//! Every ordinary selector is rewritten to live under the owner's sandbox
//! container, `.pixelpage-sandbox[data-username="<key>"]`, so a user
//! stylesheet cannot reach anything outside that element.

use std::fmt::Write;

use crate::css::split_top_level;
use crate::tables::{SANDBOX_CLASS, SCOPE_ATTRIBUTE};

/// A rule that survived filtering, ready to be scoped and serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanitizedRule {
    /// `selector, selector { declarations }`; never an empty list
    Style { selectors: Vec<String>, declarations: String },
    /// Keyframe names are local to the stylesheet; frames are never scoped.
    Keyframes { prelude: String, frames: Vec<(String, String)> },
    /// Inner rules are scoped like top-level ones.
    Media { prelude: String, rules: Vec<SanitizedRule> },
}

impl SanitizedRule {
    /// Number of `{`-delimited blocks this rule emits.
    pub fn weight(&self) -> usize {
        match self {
            SanitizedRule::Style { .. } => 1,
            SanitizedRule::Keyframes { frames, .. } => 1 + frames.len(),
            SanitizedRule::Media { rules, .. } => 1 + rules.iter().map(Self::weight).sum::<usize>(),
        }
    }
}

/// Escape a scope key for use inside a double-quoted CSS attribute value.
///
/// `"` and `\` get a backslash. Control characters and `<`/`>` become hex
/// escapes, which match the same attribute value but cannot end the string
/// or spell `</style` in the emitted text.
pub fn escape_scope_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            '"' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '<' | '>' => {
                let _ = write!(escaped, "\\{:x} ", c as u32);
            }
            c if c.is_control() => {
                let _ = write!(escaped, "\\{:x} ", c as u32);
            }
            c => escaped.push(c),
        }
    }
    escaped
}

/// `.pixelpage-sandbox[data-username="<escaped key>"]`
pub fn sandbox_selector(scope_key: &str) -> String {
    format!(
        ".{}[{}=\"{}\"]",
        SANDBOX_CLASS,
        SCOPE_ATTRIBUTE,
        escape_scope_key(scope_key)
    )
}

/// Attributes the host must put on the container element for the scoped
/// stylesheet to apply. Values are raw; HTML-escaping them is the renderer's job.
pub fn sandbox_attributes(scope_key: &str) -> [(&'static str, String); 2] {
    [
        ("class", SANDBOX_CLASS.to_string()),
        (SCOPE_ATTRIBUTE, scope_key.to_string()),
    ]
}

/// The non-empty selectors of a comma-separated list. `h1, , h2` gives
/// `["h1", "h2"]` and `,` gives nothing.
pub fn split_selector_list(selector: &str) -> Vec<String> {
    split_top_level(selector, ',')
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Prefix every selector with `sandbox` and join them into one list.
pub fn scope_selector_list(selectors: &[String], sandbox: &str) -> String {
    selectors
        .iter()
        .map(|part| format!("{} {}", sandbox, part))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Serialize rules with every ordinary selector scoped to `scope_key`.
pub fn scope_rules(rules: &[SanitizedRule], scope_key: &str) -> String {
    let sandbox = sandbox_selector(scope_key);
    render(rules, &sandbox)
}

fn render(rules: &[SanitizedRule], sandbox: &str) -> String {
    rules
        .iter()
        .map(|rule| match rule {
            SanitizedRule::Style { selectors, declarations } => {
                format!("{} {{ {} }}", scope_selector_list(selectors, sandbox), declarations)
            }
            SanitizedRule::Keyframes { prelude, frames } => {
                let body = frames
                    .iter()
                    .map(|(frame, declarations)| format!("{} {{ {} }}", frame, declarations))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("{} {{ {} }}", prelude, body)
            }
            SanitizedRule::Media { prelude, rules } => {
                format!("{} {{\n{}\n}}", prelude, render(rules, sandbox))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn style(selector: &str, declarations: &str) -> SanitizedRule {
        SanitizedRule::Style {
            selectors: split_selector_list(selector),
            declarations: declarations.to_string(),
        }
    }

    #[test]
    fn test_escape_quote_and_backslash() {
        assert_eq!(escape_scope_key(r#"user"name"#), r#"user\"name"#);
        assert_eq!(escape_scope_key(r"a\b"), r"a\\b");
        assert_eq!(escape_scope_key("plain_user-1"), "plain_user-1");
    }

    #[test]
    fn test_escape_markup_and_controls() {
        assert_eq!(escape_scope_key("</style>"), r"\3c /style\3e ");
        assert_eq!(escape_scope_key("a\nb"), r"\a b");
    }

    #[test]
    fn test_sandbox_selector() {
        assert_eq!(
            sandbox_selector("u"),
            r#".pixelpage-sandbox[data-username="u"]"#
        );
        assert_eq!(
            sandbox_selector(r#"user"name"#),
            r#".pixelpage-sandbox[data-username="user\"name"]"#
        );
    }

    #[test]
    fn test_selector_list_fully_scoped() {
        let selectors = split_selector_list("h1, h2 > a,:is(p, li)");
        assert_eq!(scope_selector_list(&selectors, "S"), "S h1, S h2 > a, S :is(p, li)");
    }

    #[test]
    fn test_empty_list_entries_dropped() {
        assert_eq!(split_selector_list(" h1 ,, h2, "), vec!["h1", "h2"]);
        assert!(split_selector_list(",").is_empty());
        assert!(split_selector_list(" , ,\n").is_empty());
    }

    #[test]
    fn test_render_media_and_keyframes() {
        let rules = vec![
            SanitizedRule::Keyframes {
                prelude: "@keyframes slide".to_string(),
                frames: vec![
                    ("from".to_string(), "left: 0".to_string()),
                    ("to".to_string(), "left: 100%".to_string()),
                ],
            },
            SanitizedRule::Media {
                prelude: "@media (max-width: 600px)".to_string(),
                rules: vec![style(".a", "color: red")],
            },
        ];
        assert_eq!(
            scope_rules(&rules, "u"),
            "@keyframes slide { from { left: 0 } to { left: 100% } }\n\
             @media (max-width: 600px) {\n\
             .pixelpage-sandbox[data-username=\"u\"] .a { color: red }\n\
             }"
        );
    }

    #[test]
    fn test_weights() {
        let media = SanitizedRule::Media {
            prelude: "@media print".to_string(),
            rules: vec![style("a", "color: red"), style("b", "color: red")],
        };
        assert_eq!(style("a", "color: red").weight(), 1);
        assert_eq!(media.weight(), 3);
    }

    #[test]
    fn test_sandbox_attributes() {
        let attrs = sandbox_attributes("johndoe");
        assert_eq!(attrs[0], ("class", "pixelpage-sandbox".to_string()));
        assert_eq!(attrs[1], ("data-username", "johndoe".to_string()));
    }
}
