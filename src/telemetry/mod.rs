//! Device telemetry: turning raw serial lines into structured frames.

pub mod frame;

pub use frame::{TelemetryFrame, parse_frame};
