//! Fuzz target: classifier stdout parsing.

#![no_main]

use irrigator::adapters::classifier::parse_classifier_output;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    if let Ok(c) = parse_classifier_output(&text) {
        assert!((0.0..=1.0).contains(&c.confidence));
        assert!(!c.label.is_empty());
    }
});
