//! PixelPage CSS sanitizer
//!
//! Takes untrusted CSS written for a customizable profile page and returns
//! CSS that is safe to place in a shared `<style>` element and confined to
//! the owner's sandbox container.
//!
//! ```
//! use pixelpage_sanitizer::sanitize_css;
//!
//! let result = sanitize_css(".card { color: red; behavior: url(x.htc) }", "alice");
//! assert!(result.success);
//! assert!(result.clean.starts_with(r#".pixelpage-sandbox[data-username="alice"] .card"#));
//! assert!(!result.removed.is_empty());
//! ```

pub mod config;
pub mod css;
pub mod declarations;
pub mod error;
pub mod metrics;
pub mod patterns;
pub mod sanitizer;
pub mod scope;
pub mod tables;

/// Re-export common types
pub use config::SanitizerConfig;
pub use error::{ParserError, ParserResult, SanitizeError};
pub use metrics::{MetricsSnapshot, SanitizerMetrics};
pub use sanitizer::{sanitize_css, validate_css, CssSanitizer, SanitizeResult, ValidationResult};
pub use scope::{escape_scope_key, sandbox_attributes, sandbox_selector};
pub use tables::THEME_PREVIEW_SCOPE;

pub use pixelpage_security::{SchemePolicy, SchemePolicyBuilder, SecurityError};
