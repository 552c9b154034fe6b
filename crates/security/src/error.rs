//! Security specific errors for the PixelPage CSS sanitizer.
//!
//! Every entry a caller sees in a `removed` or `errors` list is one of these
//! variants rendered through `Display`, so the wording here is user facing.

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SecurityError {
    #[error("Invalid security configuration: {0}")]
    InvalidConfiguration(String),

    #[error("CSS exceeds maximum size of {limit} bytes (got {actual})")]
    SizeExceeded { limit: usize, actual: usize },

    #[error("Blocked dangerous pattern: {pattern}")]
    BlockedPattern { pattern: String },

    #[error("Blocked dangerous pattern in value for {property}: {pattern}")]
    BlockedValue { property: String, pattern: String },

    #[error("Blocked property: {property}")]
    BlockedProperty { property: String },

    #[error("Blocked at-rule: {name}")]
    BlockedAtRule { name: String },

    #[error("Blocked data URL: {preview}...")]
    DataUrl { preview: String },

    #[error("Blocked URL with invalid protocol: {scheme}:")]
    InvalidScheme { scheme: String },

    #[error("Blocked URL containing escape sequences: {preview}")]
    EscapedUrl { preview: String },

    #[error("Blocked relative URL: {preview}")]
    RelativeUrl { preview: String },

    #[error("Blocked escape sequence in {property}")]
    EscapedValue { property: String },

    #[error("Blocked malformed url() in {property}")]
    MalformedUrl { property: String },

    #[error("{reason} (in {property})")]
    UrlRejected {
        property: String,
        reason: Box<SecurityError>,
    },
}

impl SecurityError {
    /// Whether this violation aborts sanitization instead of dropping one unit.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SecurityError::SizeExceeded { .. } | SecurityError::InvalidConfiguration(_)
        )
    }
}

/// Result type for policy checks
pub type SecurityResult<T> = Result<T, SecurityError>;
