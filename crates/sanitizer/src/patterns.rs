//! Global blocked-pattern interceptor.
//!
//! Runs over the raw stylesheet before any structural parsing. A rule parser
//! fed crafted, half-broken input can be made to skip over a dangerous token;
//! scrubbing the flat text first means there is nothing left to hide.

use std::borrow::Cow;

use regex::Regex;

use crate::tables::BLOCKED_PLACEHOLDER;

/// Identifiers that look like DOM event handler attributes.
const EVENT_HANDLERS: &[&str] = &[
    "onclick",
    "ondblclick",
    "onerror",
    "onload",
    "onunload",
    "onmouseover",
    "onfocus",
    "onblur",
    "onchange",
    "oninput",
    "onsubmit",
    "onkeydown",
    "onkeyup",
    "onkeypress",
    "onmousedown",
    "onmouseup",
    "onmousemove",
    "onmouseout",
    "onmouseenter",
    "onmouseleave",
    "onanimationstart",
    "onanimationend",
    "ontransitionend",
    "onanimationiteration",
    "ontransitionstart",
    "ontransitionrun",
    "onpointerdown",
    "onpointerup",
    "onpointermove",
    "onpointerover",
    "onpointerout",
    "onpointerenter",
    "onpointerleave",
    "ontouchstart",
    "ontouchend",
    "ontouchmove",
    "onwheel",
    "onscroll",
    "onresize",
    "oncontextmenu",
    "ondragstart",
    "ondragover",
    "ondrop",
    "oncopy",
    "onpaste",
    "onbeforeunload",
    "onhashchange",
    "onmessage",
    "onpageshow",
    "ontoggle",
    "onfocusin",
    "onfocusout",
];

/// A case-insensitive regex for one known attack class.
#[derive(Debug)]
pub struct BlockedPattern {
    source: &'static str,
    regex: Regex,
}

impl BlockedPattern {
    fn new(source: &'static str) -> Self {
        Self {
            source,
            regex: Regex::new(&format!("(?i){}", source)).unwrap(),
        }
    }

    /// Pattern text as it appears in diagnostics
    pub fn source(&self) -> &'static str {
        self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    fn replace_all<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.regex.replace_all(text, BLOCKED_PLACEHOLDER)
    }
}

lazy_static::lazy_static! {
    /// Ordered blocklist. Detection order is reporting order.
    pub static ref BLOCKED_PATTERNS: Vec<BlockedPattern> = {
        let mut sources: Vec<&'static str> = vec![
            r"expression\s*\(",          // IE expression()
            r"javascript\s*:",
            r"behavior\s*:",             // IE .htc behaviors
            r"@import",
            r#"url\s*\(\s*["']?\s*data:"#,
            r"<script",
            r"</script",
            r"</style",                  // closes the host <style> element
        ];
        sources.extend_from_slice(EVENT_HANDLERS);
        // Any other handler written the way markup assigns one
        sources.push(r"\bon[a-z]+\s*=");
        sources.extend_from_slice(&[
            r"vbscript\s*:",
            r"mhtml\s*:",
            r"binding\s*:",              // XBL
            r"-moz-binding",
        ]);
        sources.into_iter().map(BlockedPattern::new).collect()
    };

    static ref COMMENT: Regex = Regex::new(r"(?s)/\*.*?(?:\*/|\z)").unwrap();
}

/// Remove `/* ... */` comments; an unterminated comment runs to the end.
///
/// Comments produce no token in CSS, so `java/**/script:` has to be seen as
/// `javascript:` by the scan that follows.
pub fn strip_comments(css: &str) -> Cow<'_, str> {
    COMMENT.replace_all(css, "")
}

/// Strip comments, then replace every match of every blocked pattern with an
/// inert placeholder. Returns the scrubbed text and the patterns that fired,
/// in blocklist order.
pub fn neutralize(css: &str) -> (String, Vec<&'static BlockedPattern>) {
    let mut text = strip_comments(css).into_owned();
    let mut hits = Vec::new();

    for pattern in BLOCKED_PATTERNS.iter() {
        if pattern.is_match(&text) {
            tracing::debug!("Blocked pattern {} in stylesheet", pattern.source());
            text = pattern.replace_all(&text).into_owned();
            hits.push(pattern);
        }
    }

    (text, hits)
}

/// Same scan as [`neutralize`] without touching the input.
pub fn detect(css: &str) -> Vec<&'static BlockedPattern> {
    let text = strip_comments(css);
    BLOCKED_PATTERNS
        .iter()
        .filter(|pattern| pattern.is_match(&text))
        .collect()
}

/// First blocked pattern matching a single declaration value.
pub fn first_match(value: &str) -> Option<&'static BlockedPattern> {
    BLOCKED_PATTERNS.iter().find(|pattern| pattern.is_match(value))
}
