//! Application core: pure domain logic, zero direct I/O.
//!
//! This module contains the business rules for the irrigation system:
//! reading telemetry, evaluating the hysteresis policy, actuating the
//! valve and journaling every decision. All interaction with the device,
//! the filesystem and the camera happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real hardware.

pub mod commands;
pub mod events;
pub mod ports;
pub mod runner;
pub mod service;
pub mod vision;

pub use commands::ControlCommand;
pub use events::{AppEvent, Origin};
pub use runner::{ControllerHandle, RunSummary, StopReason, command_queue, run};
pub use service::{CommandOutcome, IrrigationController, TickOutcome};
