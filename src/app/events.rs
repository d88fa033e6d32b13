//! Outbound application events.
//!
//! The [`IrrigationController`](super::service::IrrigationController) emits
//! these through the [`EventSink`](super::ports::EventSink) port. Adapters
//! on the other side decide what to do with them: log them, push them to a
//! dashboard, etc.

use core::fmt;

use crate::control::{Decision, ValvePosition};

/// Who asked for a valve change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Hysteresis policy.
    Auto,
    /// Operator or remote override.
    Manual,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        })
    }
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The controller has started (carries the initial valve position).
    Started(ValvePosition),

    /// A telemetry frame was evaluated.
    Reading {
        moisture_raw: u32,
        valve_reported: Option<ValvePosition>,
        decision: Decision,
    },

    /// The valve was driven to a new position (or re-sent the same one,
    /// for manual commands).
    ValveCommanded {
        from: ValvePosition,
        to: ValvePosition,
        origin: Origin,
    },

    /// The command could not be written to the device.
    ActuationFailed {
        target: ValvePosition,
        origin: Origin,
        reason: String,
    },

    /// A journal append or amend failed. The loop keeps running.
    JournalFailed(String),

    /// A classifier label was written back (or there was no row for it).
    VisualStateAmended { label: String, amended: bool },

    /// The loop ended after `ticks` iterations.
    Stopped { ticks: u64 },
}
