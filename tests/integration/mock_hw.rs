//! Mock adapters for integration tests.
//!
//! The scripted channel replays a fixed sequence of reads and records every
//! command written to it, so tests can assert on the full device
//! conversation without a serial port.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{NaiveDate, NaiveDateTime};
use irrigator::app::events::AppEvent;
use irrigator::app::ports::{Clock, EventSink, JournalPort, TelemetryChannel};
use irrigator::error::{ChannelError, JournalError};
use irrigator::journal::JournalRecord;

// ── Scripted channel ──────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Step {
    Line(Vec<u8>),
    Timeout,
    ReadError,
}

/// What the device saw. Shared so it outlives a channel moved into `run`.
#[derive(Debug, Default)]
pub struct DeviceLog {
    pub sent: Vec<String>,
    pub closed: u32,
}

pub struct ScriptedChannel {
    script: VecDeque<Step>,
    log: Rc<RefCell<DeviceLog>>,
    fail_sends: bool,
    stop_when_done: Option<Arc<AtomicBool>>,
}

#[allow(dead_code)]
impl ScriptedChannel {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: steps.into_iter().collect(),
            log: Rc::default(),
            fail_sends: false,
            stop_when_done: None,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Channel that yields one well-formed frame per reading.
    pub fn readings(values: &[u32]) -> Self {
        Self::new(
            values
                .iter()
                .map(|m| Step::Line(format!("Humedad: {m} | Válvula: OFF\r\n").into_bytes())),
        )
    }

    pub fn lines(lines: &[&str]) -> Self {
        Self::new(lines.iter().map(|l| Step::Line(l.as_bytes().to_vec())))
    }

    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Raise `stop` once the script is exhausted.
    pub fn stop_when_done(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop_when_done = Some(stop);
        self
    }

    pub fn log(&self) -> Rc<RefCell<DeviceLog>> {
        Rc::clone(&self.log)
    }

    pub fn sent(&self) -> Vec<String> {
        self.log.borrow().sent.clone()
    }
}

impl TelemetryChannel for ScriptedChannel {
    fn read_line(&mut self) -> Result<Vec<u8>, ChannelError> {
        match self.script.pop_front() {
            Some(Step::Line(bytes)) => Ok(bytes),
            Some(Step::Timeout) => Ok(Vec::new()),
            Some(Step::ReadError) => Err(ChannelError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "device unplugged",
            ))),
            None => {
                if let Some(stop) = &self.stop_when_done {
                    stop.store(true, Ordering::SeqCst);
                }
                Ok(Vec::new())
            }
        }
    }

    fn send_command(&mut self, command: &str) -> Result<(), ChannelError> {
        if self.fail_sends {
            return Err(ChannelError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "write failed",
            )));
        }
        self.log.borrow_mut().sent.push(command.to_string());
        Ok(())
    }

    fn close(&mut self) {
        self.log.borrow_mut().closed += 1;
    }
}

// ── In-memory journal ─────────────────────────────────────────

#[derive(Default)]
pub struct MemoryJournal {
    pub rows: RefCell<Vec<JournalRecord>>,
    pub fail_appends: Cell<bool>,
}

#[allow(dead_code)]
impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn valves(&self) -> Vec<&'static str> {
        self.rows.borrow().iter().map(|r| r.valve.as_str()).collect()
    }

    pub fn observations(&self) -> Vec<String> {
        self.rows
            .borrow()
            .iter()
            .map(|r| r.observations.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }
}

impl JournalPort for MemoryJournal {
    fn append(&self, record: &JournalRecord) -> Result<(), JournalError> {
        if self.fail_appends.get() {
            return Err(JournalError::Malformed {
                line: 0,
                reason: "disk full".into(),
            });
        }
        self.rows.borrow_mut().push(record.clone());
        Ok(())
    }

    fn last_record(&self) -> Result<Option<JournalRecord>, JournalError> {
        Ok(self.rows.borrow().last().cloned())
    }

    fn amend_last_visual_state(&self, label: &str) -> Result<bool, JournalError> {
        match self.rows.borrow_mut().last_mut() {
            Some(last) => {
                last.visual_state = Some(label.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Clock ─────────────────────────────────────────────────────

pub struct FixedClock(pub NaiveDateTime);

impl Default for FixedClock {
    fn default() -> Self {
        Self(
            NaiveDate::from_ymd_opt(2025, 6, 1)
                .and_then(|d| d.and_hms_opt(8, 0, 0))
                .unwrap(),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
