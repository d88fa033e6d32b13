//! Fuzz target: telemetry frame parser.
//!
//! Arbitrary bytes off the serial line must never panic, and any accepted
//! frame must carry the moisture digits that appear in the input.

#![no_main]

use irrigator::telemetry::parse_frame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Some(frame) = parse_frame(data) {
        let text = String::from_utf8_lossy(data);
        assert!(text.contains(&frame.moisture_raw.to_string()));
    }
});
