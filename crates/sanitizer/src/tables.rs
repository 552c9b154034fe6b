//! Static allowlists and limits.
//!
//! Built once on first use and never mutated; every sanitizer call reads the
//! same tables without locking.

use std::collections::HashSet;

/// Default maximum stylesheet size (100 KiB).
pub const MAX_CSS_SIZE: usize = 100 * 1024;

/// Default maximum number of rule blocks kept in sanitized output.
pub const MAX_RULES: usize = 1000;

/// Default maximum brace depth inside a block at-rule.
pub const MAX_NESTING_DEPTH: usize = 8;

/// Class carried by every user sandbox container.
pub const SANDBOX_CLASS: &str = "pixelpage-sandbox";

/// Attribute on the sandbox container holding the scope key.
pub const SCOPE_ATTRIBUTE: &str = "data-username";

/// Scope key used when previewing a theme that has no owning user yet.
pub const THEME_PREVIEW_SCOPE: &str = "theme-preview";

/// Inert comment left where a blocked pattern was found.
pub const BLOCKED_PLACEHOLDER: &str = "/* BLOCKED */";

lazy_static::lazy_static! {
    /// CSS properties allowed to reach sanitized output.
    pub static ref ALLOWED_PROPERTIES: HashSet<&'static str> = [
        // Layout
        "display", "position", "top", "right", "bottom", "left", "float", "clear",
        "width", "height", "min-width", "max-width", "min-height", "max-height",
        "margin", "margin-top", "margin-right", "margin-bottom", "margin-left",
        "padding", "padding-top", "padding-right", "padding-bottom", "padding-left",
        "box-sizing",
        // Flexbox
        "flex", "flex-direction", "flex-wrap", "flex-flow", "flex-grow", "flex-shrink",
        "flex-basis", "justify-content", "align-items", "align-content", "align-self",
        "order",
        // Grid
        "grid", "grid-template", "grid-template-columns", "grid-template-rows",
        "grid-template-areas", "grid-auto-columns", "grid-auto-rows", "grid-auto-flow",
        "grid-column", "grid-column-start", "grid-column-end", "grid-row",
        "grid-row-start", "grid-row-end", "grid-area", "gap", "row-gap", "column-gap",
        // Visual
        "background", "background-color", "background-image", "background-position",
        "background-size", "background-repeat", "background-origin", "background-clip",
        "background-attachment", "background-blend-mode",
        "border", "border-width", "border-style", "border-color",
        "border-top", "border-right", "border-bottom", "border-left",
        "border-top-width", "border-top-style", "border-top-color",
        "border-right-width", "border-right-style", "border-right-color",
        "border-bottom-width", "border-bottom-style", "border-bottom-color",
        "border-left-width", "border-left-style", "border-left-color",
        "border-radius", "border-top-left-radius", "border-top-right-radius",
        "border-bottom-left-radius", "border-bottom-right-radius",
        "box-shadow", "opacity", "visibility", "overflow", "overflow-x", "overflow-y",
        "clip", "clip-path",
        // Typography
        "color", "font", "font-family", "font-size", "font-weight", "font-style",
        "font-variant", "line-height", "letter-spacing", "word-spacing", "text-align",
        "text-decoration", "text-decoration-line", "text-decoration-color",
        "text-decoration-style", "text-transform", "text-indent", "text-shadow",
        "white-space", "word-break", "word-wrap", "overflow-wrap", "text-overflow",
        "vertical-align",
        // Transform & animation
        "transform", "transform-origin", "transform-style", "perspective",
        "perspective-origin", "backface-visibility",
        "transition", "transition-property", "transition-duration",
        "transition-timing-function", "transition-delay",
        "animation", "animation-name", "animation-duration", "animation-timing-function",
        "animation-delay", "animation-iteration-count", "animation-direction",
        "animation-fill-mode", "animation-play-state",
        // Other safe properties
        "cursor", "z-index", "filter", "backdrop-filter", "mix-blend-mode",
        "object-fit", "object-position",
        "outline", "outline-width", "outline-style", "outline-color", "outline-offset",
        "list-style", "list-style-type", "list-style-position", "list-style-image",
        "pointer-events", "user-select",
    ]
    .into_iter()
    .collect();

    /// Block at-rules kept in sanitized output. Everything else is dropped.
    pub static ref ALLOWED_AT_RULES: HashSet<&'static str> =
        ["@keyframes", "@media"].into_iter().collect();
}

/// Check if a (lower-cased, trimmed) property name is on the allowlist
pub fn is_allowed_property(property: &str) -> bool {
    ALLOWED_PROPERTIES.contains(property)
}

/// Check if an at-rule name such as `@media` is on the allowlist
pub fn is_allowed_at_rule(name: &str) -> bool {
    ALLOWED_AT_RULES.contains(name.to_ascii_lowercase().as_str())
}
