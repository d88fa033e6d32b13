//! The cancellable control loop.
//!
//! [`run`] owns the telemetry channel for its whole lifetime. Front-ends
//! talk to it only through a [`ControllerHandle`], so the device always has
//! exactly one reader and one writer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::control::ValvePosition;

use super::commands::ControlCommand;
use super::events::AppEvent;
use super::ports::{EventSink, JournalPort, TelemetryChannel};
use super::service::{CommandOutcome, IrrigationController, TickOutcome};

/// Commands handled between two consecutive ticks.
pub const COMMANDS_PER_TICK: usize = 16;

/// Why [`run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The stop flag was raised (SIGINT/SIGTERM).
    Signal,
    /// A [`ControlCommand::Shutdown`] was received.
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub reason: StopReason,
}

// ───────────────────────────────────────────────────────────────
// ControllerHandle
// ───────────────────────────────────────────────────────────────

/// Cloneable sender given to front-ends.
///
/// Every method returns `false` once the loop has exited.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: Sender<ControlCommand>,
}

impl ControllerHandle {
    pub fn set_valve(&self, position: ValvePosition) -> bool {
        self.send(ControlCommand::SetValve(position))
    }

    pub fn amend_visual_state(&self, label: impl Into<String>) -> bool {
        self.send(ControlCommand::AmendVisualState(label.into()))
    }

    pub fn shutdown(&self) -> bool {
        self.send(ControlCommand::Shutdown)
    }

    fn send(&self, cmd: ControlCommand) -> bool {
        self.tx.send(cmd).is_ok()
    }
}

/// Create the command queue feeding [`run`].
pub fn command_queue() -> (ControllerHandle, Receiver<ControlCommand>) {
    let (tx, rx) = mpsc::channel();
    (ControllerHandle { tx }, rx)
}

// ───────────────────────────────────────────────────────────────
// Loop
// ───────────────────────────────────────────────────────────────

/// Closes the channel however the loop exits, including by panic.
struct ChannelGuard<C: TelemetryChannel>(C);

impl<C: TelemetryChannel> Drop for ChannelGuard<C> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Drive `controller` until `stop` is raised or a shutdown command arrives.
///
/// Each iteration handles up to [`COMMANDS_PER_TICK`] queued commands, then
/// runs one tick, so a busy front-end cannot starve telemetry. A read
/// failure other than a timeout sleeps for `read_retry` before the next
/// attempt. When every [`ControllerHandle`] is dropped the loop keeps
/// running on telemetry alone.
pub fn run<C, J, S>(
    controller: &mut IrrigationController,
    channel: C,
    journal: &J,
    sink: &mut S,
    commands: &Receiver<ControlCommand>,
    stop: &AtomicBool,
    read_retry: Duration,
) -> RunSummary
where
    C: TelemetryChannel,
    J: JournalPort,
    S: EventSink,
{
    let mut guard = ChannelGuard(channel);
    controller.start(sink);
    let mut commands_open = true;

    let reason = 'outer: loop {
        if stop.load(Ordering::SeqCst) {
            break StopReason::Signal;
        }

        for _ in 0..COMMANDS_PER_TICK {
            if !commands_open {
                break;
            }
            match commands.try_recv() {
                Ok(cmd) => {
                    if controller.handle_command(cmd, &mut guard.0, journal, sink)
                        == CommandOutcome::Shutdown
                    {
                        break 'outer StopReason::Shutdown;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("all controller handles dropped");
                    commands_open = false;
                }
            }
        }

        if controller.tick(&mut guard.0, journal, sink) == TickOutcome::ReadFailed {
            thread::sleep(read_retry);
        }
    };

    let ticks = controller.tick_count();
    drop(guard);
    sink.emit(&AppEvent::Stopped { ticks });
    info!("control loop stopped after {ticks} ticks ({reason:?})");
    RunSummary { ticks, reason }
}
