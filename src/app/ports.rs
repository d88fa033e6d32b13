//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ IrrigationController (domain)
//! ```
//!
//! Driven adapters (serial device, journal file, wall clock, event sinks,
//! camera, classifier) implement these traits. The
//! [`IrrigationController`](super::service::IrrigationController) consumes
//! them via generics, so the domain core never touches a device or a file
//! directly and every seam can be replaced by a test double.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::error::{ChannelError, JournalError, VisionError};
use crate::journal::{Journal, JournalRecord};

// ───────────────────────────────────────────────────────────────
// Telemetry channel (driven adapter: device ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Line-delimited, byte-oriented link to the controller board.
///
/// Exactly one owner reads and writes a channel. Front-ends never open a
/// second one; they send [`ControlCommand`](super::commands::ControlCommand)s
/// through a [`ControllerHandle`](super::runner::ControllerHandle) instead.
pub trait TelemetryChannel {
    /// Read one raw line, blocking up to the configured timeout.
    ///
    /// A timeout yields an empty buffer, not an error.
    fn read_line(&mut self) -> Result<Vec<u8>, ChannelError>;

    /// Write `command` followed by a newline. No acknowledgment is read back.
    fn send_command(&mut self, command: &str) -> Result<(), ChannelError>;

    /// Release the device. Must be idempotent.
    fn close(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Journal port (driven adapter: domain → durable history)
// ───────────────────────────────────────────────────────────────

/// Append-only decision history.
pub trait JournalPort {
    fn append(&self, record: &JournalRecord) -> Result<(), JournalError>;

    /// Most recent record, `None` on an empty journal.
    fn last_record(&self) -> Result<Option<JournalRecord>, JournalError>;

    /// Returns `false` when there is no row to amend.
    fn amend_last_visual_state(&self, label: &str) -> Result<bool, JournalError>;
}

impl JournalPort for Journal {
    fn append(&self, record: &JournalRecord) -> Result<(), JournalError> {
        Journal::append(self, record)
    }

    fn last_record(&self) -> Result<Option<JournalRecord>, JournalError> {
        Journal::last_record(self)
    }

    fn amend_last_visual_state(&self, label: &str) -> Result<bool, JournalError> {
        Journal::amend_last_visual_state(self, label)
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall-clock source for journal timestamps.
pub trait Clock {
    /// Local time, truncated to whole seconds.
    fn now(&self) -> NaiveDateTime;
}

// ───────────────────────────────────────────────────────────────
// Vision collaborators
// ───────────────────────────────────────────────────────────────

/// Takes a still image of the plant.
pub trait CapturePort {
    /// Capture to `output` and return the path actually written.
    fn capture(&self, output: &Path, width: u32, height: u32) -> Result<PathBuf, VisionError>;
}

/// Labels a plant image.
pub trait ClassifierPort {
    fn classify(&self, image: &Path) -> Result<Classification, VisionError>;
}

/// Classifier verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    /// 0.0 to 1.0
    pub confidence: f32,
}
