//! PixelPage Security Crate
//!
//! Shared vocabulary for the CSS sanitizer: the reasons content gets removed
//! and the policy deciding which URL schemes user stylesheets may reference.

pub mod context;
pub mod error;

pub use context::{SchemePolicy, SchemePolicyBuilder, UrlScheme};
pub use error::{SecurityError, SecurityResult};
