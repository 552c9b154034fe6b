use std::error::Error;
use std::fmt;

use pixelpage_security::SecurityError;

/// Error types for the rule parser and sanitizer pipeline
#[derive(Debug)]
pub enum ParserError {
    /// CSS structure could not be processed
    CssError(String),
    /// Block at-rules nested deeper than the configured limit
    NestingTooDeep(usize),
    /// Invalid sanitizer configuration
    Config(String),
    /// Policy construction failed
    Security(SecurityError),
    /// Unknown error
    Unknown(String),
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserError::CssError(msg) => write!(f, "CSS parse error: {}", msg),
            ParserError::NestingTooDeep(depth) => write!(f, "Nesting too deep: {}", depth),
            ParserError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            ParserError::Security(e) => write!(f, "Security policy error: {}", e),
            ParserError::Unknown(msg) => write!(f, "Unknown error: {}", msg),
        }
    }
}

impl Error for ParserError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParserError::Security(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SecurityError> for ParserError {
    fn from(e: SecurityError) -> Self {
        ParserError::Security(e)
    }
}

impl From<serde_json::Error> for ParserError {
    fn from(e: serde_json::Error) -> Self {
        ParserError::Config(e.to_string())
    }
}

/// Result type for parser operations
pub type ParserResult<T> = Result<T, ParserError>;

/// Returned by [`SanitizeResult::into_clean`](crate::SanitizeResult::into_clean)
/// when the stylesheet must not be stored or applied.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("CSS sanitization failed: {}", reasons.join("; "))]
    Rejected { reasons: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParserError::CssError("unbalanced block".to_string());
        assert_eq!(err.to_string(), "CSS parse error: unbalanced block");

        let err = ParserError::NestingTooDeep(9);
        assert_eq!(err.to_string(), "Nesting too deep: 9");
    }

    #[test]
    fn test_error_source() {
        let err = ParserError::from(SecurityError::InvalidConfiguration("x".to_string()));
        assert!(err.source().is_some());

        let err = ParserError::Unknown("test".to_string());
        assert!(err.source().is_none());
    }

    #[test]
    fn test_rejection_lists_reasons() {
        let err = SanitizeError::Rejected {
            reasons: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "CSS sanitization failed: a; b");
    }
}
