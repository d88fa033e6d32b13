//! Inbound commands to the irrigation controller.
//!
//! These represent actions requested by the outside world (operator
//! console, dashboard, chat front-end) that the
//! [`IrrigationController`](super::service::IrrigationController)
//! interprets and acts upon. They reach the controller through a queue so
//! the device keeps a single owner.

use crate::control::ValvePosition;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// Manual override: drive the valve regardless of the thresholds.
    SetValve(ValvePosition),

    /// Write a classifier label into the most recent journal row.
    AmendVisualState(String),

    /// Stop the control loop and release the device.
    Shutdown,
}
