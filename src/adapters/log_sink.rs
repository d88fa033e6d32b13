//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (rendered by the subscriber installed in `main`).
//! A dashboard or chat adapter would implement the same trait.

use log::{debug, error, info, warn};

use crate::app::events::{AppEvent, Origin};
use crate::app::ports::EventSink;
use crate::control::PolicyEvent;

/// Adapter that logs every [`AppEvent`] as a single line.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Reading {
                moisture_raw,
                valve_reported,
                decision,
            } => {
                let reported = valve_reported.map_or("-", |v| v.as_str());
                if decision.event == PolicyEvent::Normal {
                    debug!(
                        "READ | moisture={moisture_raw} | device={reported} | valve={}",
                        decision.state
                    );
                } else {
                    info!(
                        "READ | moisture={moisture_raw} | device={reported} | {}",
                        decision.event.description()
                    );
                }
            }
            AppEvent::ValveCommanded {
                from,
                to,
                origin: Origin::Auto,
            } => {
                info!("VALVE | {from} -> {to}");
            }
            AppEvent::ValveCommanded {
                from,
                to,
                origin: Origin::Manual,
            } => {
                info!("MANUAL | {from} -> {to}");
            }
            AppEvent::ActuationFailed {
                target,
                origin,
                reason,
            } => {
                error!("VALVE | {origin} {} failed: {reason}", target.command());
            }
            AppEvent::JournalFailed(reason) => {
                warn!("JOURNAL | {reason}");
            }
            AppEvent::VisualStateAmended { label, amended } => {
                if *amended {
                    info!("JOURNAL | visual state {label:?} recorded");
                } else {
                    info!("JOURNAL | visual state {label:?} dropped, journal empty");
                }
            }
            AppEvent::Started(valve) => {
                info!("START | valve={valve}");
            }
            AppEvent::Stopped { ticks } => {
                info!("STOP | ticks={ticks}");
            }
        }
    }
}
