//! URL scheme policy for references inside user stylesheets.
//!
//! `url(...)` tokens are the only way a sanitized stylesheet can make the
//! browser fetch or interpret something, so every literal found in one is
//! classified by scheme and checked against a small allowlist.

use crate::error::{SecurityError, SecurityResult};
use std::collections::HashSet;

/// Longest prefix of an offending URL echoed back in a violation message.
const PREVIEW_LEN: usize = 50;

/// Represents known URL schemes.
/// Using an enum provides type safety over raw strings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum UrlScheme {
    Http,
    Https,
    Data,
    Javascript,
    Custom(String), // Anything else, lower-cased
}

impl UrlScheme {
    /// Attempts to parse a string into a known UrlScheme.
    /// A trailing `:` is accepted so `"https:"` and `"https"` are equivalent.
    pub fn parse(s: &str) -> Result<Self, SecurityError> {
        let name = s.trim().trim_end_matches(':').to_ascii_lowercase();
        if !is_scheme_name(&name) {
            return Err(SecurityError::InvalidScheme { scheme: name });
        }
        Ok(match name.as_str() {
            "http" => UrlScheme::Http,
            "https" => UrlScheme::Https,
            "data" => UrlScheme::Data,
            "javascript" => UrlScheme::Javascript,
            _ => UrlScheme::Custom(name),
        })
    }

    /// Returns the explicit scheme of `url`, or `None` for relative,
    /// root-relative and scheme-relative references.
    pub fn detect(url: &str) -> Option<Self> {
        let url = strip_url_noise(url);
        let colon = url.find(':')?;
        let candidate = &url[..colon];
        if is_scheme_name(candidate) {
            Self::parse(candidate).ok()
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            UrlScheme::Http => "http",
            UrlScheme::Https => "https",
            UrlScheme::Data => "data",
            UrlScheme::Javascript => "javascript",
            UrlScheme::Custom(name) => name,
        }
    }
}

/// `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`
fn is_scheme_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Browsers drop leading C0/space and every tab or newline before parsing a
/// URL, so `java\tscript:` still resolves to `javascript:`. Do the same
/// before looking for a scheme.
fn strip_url_noise(url: &str) -> String {
    url.trim_start_matches(|c: char| c <= ' ')
        .chars()
        .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

fn preview(url: &str) -> String {
    url.chars().take(PREVIEW_LEN).collect()
}

/// Decides which `url(...)` literals a sanitized stylesheet may keep.
#[derive(Debug, Clone)]
pub struct SchemePolicy {
    allowed_schemes: HashSet<UrlScheme>,
    allow_relative: bool,
}

impl SchemePolicy {
    /// Check if a URL scheme is allowed
    pub fn is_scheme_allowed(&self, scheme: &UrlScheme) -> bool {
        self.allowed_schemes.contains(scheme)
    }

    /// Validate a single URL literal taken from inside `url(...)`.
    ///
    /// `data:` is refused regardless of payload or configuration. CSS escape
    /// sequences are refused outright since the CSS tokenizer would decode
    /// them after this check ran.
    pub fn check(&self, url: &str) -> SecurityResult<()> {
        let url = url.trim();
        if url.contains('\\') {
            log::debug!("Rejecting escaped URL literal");
            return Err(SecurityError::EscapedUrl { preview: preview(url) });
        }

        match UrlScheme::detect(url) {
            Some(UrlScheme::Data) => Err(SecurityError::DataUrl { preview: preview(url) }),
            Some(scheme) if self.is_scheme_allowed(&scheme) => Ok(()),
            Some(scheme) => {
                log::debug!("Rejecting URL with scheme {}", scheme.as_str());
                Err(SecurityError::InvalidScheme { scheme: scheme.as_str().to_string() })
            }
            None if self.allow_relative => Ok(()),
            None => Err(SecurityError::RelativeUrl { preview: preview(url) }),
        }
    }
}

impl Default for SchemePolicy {
    /// `http:`, `https:` and relative references.
    fn default() -> Self {
        Self {
            allowed_schemes: HashSet::from([UrlScheme::Http, UrlScheme::Https]),
            allow_relative: true,
        }
    }
}

/// Builder for creating SchemePolicy instances.
#[derive(Default)]
pub struct SchemePolicyBuilder {
    allowed_schemes: HashSet<UrlScheme>,
    scheme_errors: Vec<SecurityError>,
    allow_relative: Option<bool>, // Use Option to distinguish between unset and false
}

impl SchemePolicyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds allowed URL schemes. Input strings are parsed into UrlScheme enums.
    /// Invalid schemes cause an error during build().
    pub fn allow_schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for s in schemes {
            match UrlScheme::parse(s.as_ref()) {
                Ok(scheme) => {
                    self.allowed_schemes.insert(scheme);
                }
                Err(e) => self.scheme_errors.push(e),
            }
        }
        self
    }

    /// Sets whether URLs without an explicit scheme are accepted.
    pub fn allow_relative(mut self, allow: bool) -> Self {
        self.allow_relative = Some(allow);
        self
    }

    /// Constructs the final SchemePolicy.
    pub fn build(self) -> Result<SchemePolicy, SecurityError> {
        if let Some(err) = self.scheme_errors.into_iter().next() {
            return Err(SecurityError::InvalidConfiguration(err.to_string()));
        }

        for unsafe_scheme in [UrlScheme::Data, UrlScheme::Javascript] {
            if self.allowed_schemes.contains(&unsafe_scheme) {
                return Err(SecurityError::InvalidConfiguration(format!(
                    "{}: URLs cannot be allowed in user stylesheets",
                    unsafe_scheme.as_str()
                )));
            }
        }

        let allow_relative = self.allow_relative.unwrap_or(true);
        if self.allowed_schemes.is_empty() && !allow_relative {
            return Err(SecurityError::InvalidConfiguration(
                "policy must allow at least one scheme or relative URLs".to_string(),
            ));
        }

        Ok(SchemePolicy {
            allowed_schemes: self.allowed_schemes,
            allow_relative,
        })
    }
}
