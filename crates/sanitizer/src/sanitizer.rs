//! Top-level sanitize and validate entry points.
//!
//! Pipeline for `sanitize`:
//! 1. size guard (fatal)
//! 2. blocked-pattern interceptor over the raw text
//! 3. rule parser and declaration filter
//! 4. rule-count guard (truncates, non-fatal)
//! 5. scoping transformer
//!
//! Every failure is a return value. Only the size guard and a parser failure
//! make `success` false, and then `clean` is always empty.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;

use pixelpage_security::{SchemePolicy, SecurityError, SecurityResult};

use crate::config::SanitizerConfig;
use crate::css::{parse_rules, ParsedRule};
use crate::declarations::filter_declarations;
use crate::error::{ParserError, ParserResult, SanitizeError};
use crate::metrics::SanitizerMetrics;
use crate::patterns;
use crate::scope::{scope_rules, split_selector_list, SanitizedRule};
use crate::tables::is_allowed_at_rule;

/// Outcome of [`CssSanitizer::sanitize`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SanitizeResult {
    /// Sanitized and scoped CSS; empty whenever `success` is false
    pub clean: String,
    /// What was removed and why, in detection order
    pub removed: Vec<String>,
    /// Non-blocking warnings
    pub warnings: Vec<String>,
    pub success: bool,
}

impl SanitizeResult {
    /// The clean stylesheet, or the removal reasons when sanitization failed.
    /// Callers that persist CSS should go through this rather than read
    /// `clean` directly.
    pub fn into_clean(self) -> Result<String, SanitizeError> {
        if self.success {
            Ok(self.clean)
        } else {
            Err(SanitizeError::Rejected { reasons: self.removed })
        }
    }
}

/// Outcome of [`CssSanitizer::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Append-only audit trail shared by every stage of one call.
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub removed: Vec<String>,
    pub warnings: Vec<String>,
}

impl Diagnostics {
    pub fn remove(&mut self, violation: SecurityError) {
        tracing::debug!("Removed: {}", violation);
        self.removed.push(violation.to_string());
    }

    pub fn warn(&mut self, warning: String) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// CSS sanitizer with immutable limits and URL policy.
///
/// Holds no per-call state; one instance can serve any number of threads.
#[derive(Debug)]
pub struct CssSanitizer {
    config: SanitizerConfig,
    policy: SchemePolicy,
    metrics: Arc<SanitizerMetrics>,
}

impl Default for CssSanitizer {
    fn default() -> Self {
        Self {
            config: SanitizerConfig::default(),
            policy: SchemePolicy::default(),
            metrics: Arc::new(SanitizerMetrics::default()),
        }
    }
}

impl CssSanitizer {
    /// Create a sanitizer with the given limits and the default URL policy
    pub fn new(config: SanitizerConfig) -> ParserResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn with_policy(mut self, policy: SchemePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Report into an externally owned metrics sink
    pub fn with_metrics(mut self, metrics: Arc<SanitizerMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &SanitizerConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<SanitizerMetrics> {
        &self.metrics
    }

    /// Sanitize `css` and scope it to `scope_key`.
    pub fn sanitize(&self, css: &str, scope_key: &str) -> SanitizeResult {
        self.metrics.record_sanitize();
        let mut diagnostics = Diagnostics::default();

        if let Err(violation) = self.check_size(css) {
            let fatal = violation.is_fatal();
            diagnostics.remove(violation);
            if fatal {
                return self.fail(diagnostics);
            }
        }

        let (scrubbed, hits) = patterns::neutralize(css);
        for pattern in hits {
            diagnostics.remove(SecurityError::BlockedPattern {
                pattern: pattern.source().to_string(),
            });
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.transform(&scrubbed, scope_key, &mut diagnostics)
        }));

        let error = match outcome {
            Ok(Ok(clean)) => {
                self.metrics.record_removals(diagnostics.removed.len());
                return SanitizeResult {
                    clean,
                    removed: diagnostics.removed,
                    warnings: diagnostics.warnings,
                    success: true,
                };
            }
            Ok(Err(e)) => e,
            Err(payload) => ParserError::Unknown(panic_message(payload.as_ref())),
        };

        tracing::warn!("Sanitization failed: {}", error);
        diagnostics.removed.push(format!("Parse error: {}", error));
        self.fail(diagnostics)
    }

    /// Size guard and pattern detection only. Produces no CSS and never
    /// parses, so it is cheap enough for pre-submit linting.
    pub fn validate(&self, css: &str) -> ValidationResult {
        self.metrics.record_validate();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if let Err(violation) = self.check_size(css) {
            errors.push(violation.to_string());
        }

        for pattern in patterns::detect(css) {
            errors.push(
                SecurityError::BlockedPattern {
                    pattern: pattern.source().to_string(),
                }
                .to_string(),
            );
        }

        let blocks = css.matches('{').count();
        if blocks > self.config.max_rules {
            warnings.push(format!(
                "CSS has about {} rule blocks (maximum {}). Some rules may not apply.",
                blocks, self.config.max_rules
            ));
        }

        ValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    fn check_size(&self, css: &str) -> SecurityResult<()> {
        if css.len() > self.config.max_css_size {
            return Err(SecurityError::SizeExceeded {
                limit: self.config.max_css_size,
                actual: css.len(),
            });
        }
        Ok(())
    }

    fn fail(&self, diagnostics: Diagnostics) -> SanitizeResult {
        self.metrics.record_rejection();
        self.metrics.record_removals(diagnostics.removed.len());
        SanitizeResult {
            clean: String::new(),
            removed: diagnostics.removed,
            warnings: diagnostics.warnings,
            success: false,
        }
    }

    /// Stages 3 to 5 over already scrubbed text.
    fn transform(&self, css: &str, scope_key: &str, diagnostics: &mut Diagnostics) -> ParserResult<String> {
        let parsed = parse_rules(css, self.config.max_nesting_depth)?;
        let mut rules = self.sanitize_rules(parsed, diagnostics)?;
        self.truncate_to_max_rules(&mut rules, diagnostics);
        Ok(scope_rules(&rules, scope_key))
    }

    fn sanitize_rules(
        &self,
        parsed: Vec<ParsedRule>,
        diagnostics: &mut Diagnostics,
    ) -> ParserResult<Vec<SanitizedRule>> {
        let mut rules = Vec::with_capacity(parsed.len());

        for rule in parsed {
            tracing::trace!("Sanitizing rule `{}`", rule.selector);

            let Some(name) = rule.at_rule_name else {
                // Nothing to scope, e.g. a selector of bare commas
                let selectors = split_selector_list(&rule.selector);
                if selectors.is_empty() {
                    continue;
                }
                let declarations = filter_declarations(&rule.declarations, diagnostics, &self.policy);
                // A rule whose every declaration was removed is dropped whole
                if !declarations.is_empty() {
                    rules.push(SanitizedRule::Style { selectors, declarations });
                }
                continue;
            };

            if !is_allowed_at_rule(&name) {
                diagnostics.remove(SecurityError::BlockedAtRule { name });
                continue;
            }

            match name.as_str() {
                "@media" => {
                    let inner = parse_rules(&rule.declarations, self.config.max_nesting_depth)?;
                    let inner = self.sanitize_rules(inner, diagnostics)?;
                    if !inner.is_empty() {
                        rules.push(SanitizedRule::Media {
                            prelude: rule.selector,
                            rules: inner,
                        });
                    }
                }
                "@keyframes" => {
                    let frames = self.sanitize_frames(&rule.declarations, diagnostics)?;
                    if !frames.is_empty() {
                        rules.push(SanitizedRule::Keyframes {
                            prelude: rule.selector,
                            frames,
                        });
                    }
                }
                other => {
                    return Err(ParserError::CssError(format!(
                        "no handler for allowed at-rule {}",
                        other
                    )))
                }
            }
        }

        Ok(rules)
    }

    /// Keyframe selectors (`from`, `50%`) stay as written; their
    /// declarations go through the same filter as any other rule.
    fn sanitize_frames(
        &self,
        body: &str,
        diagnostics: &mut Diagnostics,
    ) -> ParserResult<Vec<(String, String)>> {
        let mut frames = Vec::new();
        for frame in parse_rules(body, self.config.max_nesting_depth)? {
            if let Some(name) = frame.at_rule_name {
                diagnostics.remove(SecurityError::BlockedAtRule { name });
                continue;
            }
            let declarations = filter_declarations(&frame.declarations, diagnostics, &self.policy);
            if !declarations.is_empty() {
                frames.push((frame.selector, declarations));
            }
        }
        Ok(frames)
    }

    /// Keep the longest prefix of whole rules whose block count fits the limit.
    fn truncate_to_max_rules(&self, rules: &mut Vec<SanitizedRule>, diagnostics: &mut Diagnostics) {
        let max_rules = self.config.max_rules;
        let total: usize = rules.iter().map(SanitizedRule::weight).sum();
        if total <= max_rules {
            return;
        }

        diagnostics.warn(format!(
            "CSS has {} rules (maximum {}). Some rules may not apply.",
            total, max_rules
        ));
        self.metrics.record_truncation();

        let mut used = 0;
        let keep = rules
            .iter()
            .take_while(|rule| {
                used += rule.weight();
                used <= max_rules
            })
            .count();
        rules.truncate(keep);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("internal failure: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("internal failure: {}", msg)
    } else {
        "internal failure".to_string()
    }
}

lazy_static::lazy_static! {
    static ref DEFAULT_SANITIZER: CssSanitizer = CssSanitizer::default();
}

/// Sanitize with the process-wide default configuration.
pub fn sanitize_css(css: &str, scope_key: &str) -> SanitizeResult {
    DEFAULT_SANITIZER.sanitize(css, scope_key)
}

/// Validate with the process-wide default configuration.
pub fn validate_css(css: &str) -> ValidationResult {
    DEFAULT_SANITIZER.validate(css)
}
