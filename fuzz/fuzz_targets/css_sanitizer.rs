#![no_main]

use libfuzzer_sys::fuzz_target;
use pixelpage_sanitizer::patterns::BLOCKED_PATTERNS;
use pixelpage_sanitizer::sanitize_css;

fuzz_target!(|data: &[u8]| {
    let Ok(css) = std::str::from_utf8(data) else {
        return;
    };

    let result = sanitize_css(css, "fuzz");
    if !result.success {
        assert!(result.clean.is_empty(), "failed call leaked CSS");
        assert!(!result.removed.is_empty(), "failure without a reason");
        return;
    }

    for pattern in BLOCKED_PATTERNS.iter() {
        assert!(
            !pattern.is_match(&result.clean),
            "{} survived sanitization",
            pattern.source()
        );
    }
});
