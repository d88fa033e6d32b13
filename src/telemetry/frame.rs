//! Telemetry frame parser.
//!
//! Wire format, one report per newline-terminated line:
//! ```text
//! Humedad: <int> | Válvula: <ON|OFF>
//! Humedad: <int>                      (firmware without valve reporting)
//! ```
//!
//! The serial link gives no framing guarantee after a device reset or a
//! buffer glitch, so anything that does not match is an expected skip, not
//! an error: [`parse_frame`] returns `None` and logs at trace level.

use std::sync::LazyLock;

use log::trace;
use regex::Regex;

use crate::control::ValvePosition;

/// Moisture token followed by whatever trails it on the line.
static MOISTURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Humedad:\s*(\d+)(.*)$").expect("static regex"));

/// Optional valve segment. The accent may arrive mangled by Latin-1 firmware.
static VALVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\|\s*V(?:á|a|\x{FFFD}{1,2})lvula:\s*(ON|OFF)$").expect("static regex")
});

/// One parsed device report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryFrame {
    /// Raw ADC reading (typically 0..=1023).
    pub moisture_raw: u32,
    /// Valve position as the device sees it. Informational only.
    pub valve_reported: Option<ValvePosition>,
}

/// Extract a frame from one raw line.
///
/// Invalid UTF-8 is replaced rather than rejected. Returns `None` for a
/// missing delimiter, a non-numeric or overflowing moisture value, or a
/// valve token other than `ON`/`OFF` (case-sensitive).
pub fn parse_frame(raw: &[u8]) -> Option<TelemetryFrame> {
    let text = String::from_utf8_lossy(raw);
    let line = text.trim_end_matches(['\r', '\n']);

    let Some(caps) = MOISTURE.captures(line) else {
        trace!("skip: no moisture token in {line:?}");
        return None;
    };

    let Ok(moisture_raw) = caps[1].parse::<u32>() else {
        trace!("skip: moisture out of range in {line:?}");
        return None;
    };

    let rest = caps[2].trim();
    let valve_reported = if rest.is_empty() {
        None
    } else {
        let Some(valve) = VALVE.captures(rest) else {
            trace!("skip: bad valve segment in {line:?}");
            return None;
        };
        valve[1].parse().ok()
    };

    Some(TelemetryFrame {
        moisture_raw,
        valve_reported,
    })
}
