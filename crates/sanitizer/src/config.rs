use serde::Deserialize;

use crate::error::{ParserError, ParserResult};
use crate::tables::{MAX_CSS_SIZE, MAX_NESTING_DEPTH, MAX_RULES};

/// Limits applied by the sanitizer. Loaded once at startup and shared
/// read-only by every call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Maximum allowed CSS size in bytes; larger input is rejected outright
    pub max_css_size: usize,
    /// Maximum number of rule blocks kept in the output
    pub max_rules: usize,
    /// Maximum nesting depth for block at-rules
    pub max_nesting_depth: usize,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            max_css_size: MAX_CSS_SIZE,
            max_rules: MAX_RULES,
            max_nesting_depth: MAX_NESTING_DEPTH,
        }
    }
}

impl SanitizerConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> ParserResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject limits that would make every stylesheet fail or every rule vanish.
    pub fn validate(&self) -> ParserResult<()> {
        if self.max_css_size == 0 {
            return Err(ParserError::Config("max_css_size must be greater than zero".to_string()));
        }
        if self.max_rules == 0 {
            return Err(ParserError::Config("max_rules must be greater than zero".to_string()));
        }
        // @media and @keyframes both need one level below the top
        if self.max_nesting_depth < 2 {
            return Err(ParserError::Config("max_nesting_depth must be at least 2".to_string()));
        }
        Ok(())
    }
}
