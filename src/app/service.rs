//! Irrigation controller: the hexagonal core.
//!
//! [`IrrigationController`] owns the valve state and the wall clock. All
//! I/O flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//!  TelemetryChannel ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                       │  IrrigationController  │
//!  TelemetryChannel ◀── │  parse · policy        │ ──▶ JournalPort
//!                       └────────────────────────┘
//! ```

use log::{debug, error, info, warn};

use crate::control::{Decision, Thresholds, ValvePosition, ValveState};
use crate::journal::JournalRecord;
use crate::telemetry::parse_frame;

use super::commands::ControlCommand;
use super::events::{AppEvent, Origin};
use super::ports::{Clock, EventSink, JournalPort, TelemetryChannel};

// ───────────────────────────────────────────────────────────────
// Outcomes
// ───────────────────────────────────────────────────────────────

/// What one [`IrrigationController::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Read timed out; nothing arrived this tick.
    Idle,
    /// A line arrived but was not a telemetry frame.
    Skipped,
    /// A frame was evaluated and journaled (or journaling was attempted).
    Recorded(Decision),
    /// The channel reported an error other than a timeout.
    ReadFailed,
}

/// What [`IrrigationController::handle_command`] asks of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Shutdown,
}

// ───────────────────────────────────────────────────────────────
// IrrigationController
// ───────────────────────────────────────────────────────────────

/// The controller orchestrates parser, policy and journal.
pub struct IrrigationController {
    valve: ValveState,
    clock: Box<dyn Clock + Send>,
    /// Most recent moisture reading, stamped on manual records.
    last_moisture: Option<u32>,
    tick_count: u64,
}

impl IrrigationController {
    /// Construct the controller with the valve `OFF`.
    pub fn new(thresholds: Thresholds, clock: impl Clock + Send + 'static) -> Self {
        Self {
            valve: ValveState::new(thresholds),
            clock: Box::new(clock),
            last_moisture: None,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started(self.valve.current()));
        let t = self.valve.thresholds();
        info!(
            "controller started: valve={} dry={} wet={} polarity={:?}",
            self.valve.current(),
            t.dry(),
            t.wet(),
            t.polarity()
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one automatic cycle: read → parse → decide → actuate → journal.
    pub fn tick(
        &mut self,
        channel: &mut impl TelemetryChannel,
        journal: &impl JournalPort,
        sink: &mut impl EventSink,
    ) -> TickOutcome {
        self.tick_count += 1;

        let raw = match channel.read_line() {
            Ok(raw) => raw,
            Err(e) => {
                error!("channel read failed: {e}");
                return TickOutcome::ReadFailed;
            }
        };
        if raw.is_empty() {
            return TickOutcome::Idle;
        }
        self.process_line(&raw, channel, journal, sink)
    }

    /// Parse, decide, actuate and journal an already-read line.
    pub fn process_line(
        &mut self,
        raw: &[u8],
        channel: &mut impl TelemetryChannel,
        journal: &impl JournalPort,
        sink: &mut impl EventSink,
    ) -> TickOutcome {
        let Some(frame) = parse_frame(raw) else {
            return TickOutcome::Skipped;
        };
        self.last_moisture = Some(frame.moisture_raw);

        if let Some(reported) = frame.valve_reported {
            if reported != self.valve.current() {
                debug!(
                    "device reports valve {reported}, controller holds {}",
                    self.valve.current()
                );
            }
        }

        let decision = self.valve.decide(frame.moisture_raw);
        debug!("reading: moisture={} -> {}", frame.moisture_raw, decision.event.description());
        sink.emit(&AppEvent::Reading {
            moisture_raw: frame.moisture_raw,
            valve_reported: frame.valve_reported,
            decision,
        });

        let observations = if decision.transitioned {
            let from = self.valve.current();
            if self.actuate(channel, decision.state, Origin::Auto, sink) {
                self.valve.apply(&decision);
                sink.emit(&AppEvent::ValveCommanded {
                    from,
                    to: decision.state,
                    origin: Origin::Auto,
                });
                info!("valve {from} -> {} at moisture {}", decision.state, frame.moisture_raw);
                format!("{}: {}", Origin::Auto, decision.event.description())
            } else {
                format!("{}: {} command failed", Origin::Auto, decision.state.command())
            }
        } else {
            format!("{}: {}", Origin::Auto, decision.event.description())
        };

        self.record(journal, sink, observations);
        TickOutcome::Recorded(decision)
    }

    // ── Command handling ──────────────────────────────────────

    /// Process one queued command from a front-end.
    pub fn handle_command(
        &mut self,
        cmd: ControlCommand,
        channel: &mut impl TelemetryChannel,
        journal: &impl JournalPort,
        sink: &mut impl EventSink,
    ) -> CommandOutcome {
        match cmd {
            ControlCommand::SetValve(target) => {
                let from = self.valve.current();
                let observations = if self.actuate(channel, target, Origin::Manual, sink) {
                    self.valve.force(target);
                    sink.emit(&AppEvent::ValveCommanded {
                        from,
                        to: target,
                        origin: Origin::Manual,
                    });
                    info!("manual override: valve {from} -> {target}");
                    format!("{}: valve {target}", Origin::Manual)
                } else {
                    format!("{}: {} command failed", Origin::Manual, target.command())
                };
                self.record(journal, sink, observations);
                CommandOutcome::Continue
            }
            ControlCommand::AmendVisualState(label) => {
                match journal.amend_last_visual_state(&label) {
                    Ok(amended) => {
                        if !amended {
                            info!("no journal row to attach visual state {label:?} to");
                        }
                        sink.emit(&AppEvent::VisualStateAmended { label, amended });
                    }
                    Err(e) => {
                        warn!("visual state amend failed: {e}");
                        sink.emit(&AppEvent::JournalFailed(e.to_string()));
                    }
                }
                CommandOutcome::Continue
            }
            ControlCommand::Shutdown => {
                info!("shutdown requested");
                CommandOutcome::Shutdown
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn valve(&self) -> ValvePosition {
        self.valve.current()
    }

    pub fn thresholds(&self) -> &Thresholds {
        self.valve.thresholds()
    }

    pub fn last_moisture(&self) -> Option<u32> {
        self.last_moisture
    }

    /// Total ticks executed since construction.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    /// Send the valve command. Returns whether it reached the channel.
    fn actuate(
        &self,
        channel: &mut impl TelemetryChannel,
        target: ValvePosition,
        origin: Origin,
        sink: &mut impl EventSink,
    ) -> bool {
        match channel.send_command(target.command()) {
            Ok(()) => true,
            Err(e) => {
                error!("{origin} command {:?} failed: {e}", target.command());
                sink.emit(&AppEvent::ActuationFailed {
                    target,
                    origin,
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    /// Append a record for the current valve position. Failures are logged
    /// and reported; they never stop the loop.
    fn record(&self, journal: &impl JournalPort, sink: &mut impl EventSink, observations: String) {
        let record = JournalRecord {
            timestamp: self.clock.now(),
            moisture_raw: self.last_moisture,
            valve: self.valve.current(),
            observations,
            visual_state: None,
        };
        if let Err(e) = journal.append(&record) {
            warn!("journal append failed: {e}");
            sink.emit(&AppEvent::JournalFailed(e.to_string()));
        }
    }
}
