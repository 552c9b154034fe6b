#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pixelpage_sanitizer::{sandbox_selector, sanitize_css};

#[derive(Arbitrary, Debug)]
struct Input {
    scope_key: String,
    selector: String,
}

fuzz_target!(|input: Input| {
    // Keep the selector to plain characters; the key is the hostile part
    if input.selector.contains(['{', '}', ';', '@', '/', '<', '"', '\'', '\\']) {
        return;
    }

    let css = format!("{} {{ color: red }}", input.selector);
    let result = sanitize_css(&css, &input.scope_key);
    assert!(result.success);

    // The key must stay inside its quoted attribute value
    assert!(!result.clean.contains('<'));
    if !result.clean.is_empty() {
        assert!(result.clean.starts_with(&sandbox_selector(&input.scope_key)));
    }
});
