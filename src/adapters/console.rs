//! Operator console: manual commands typed on stdin.
//!
//! | Input      | Effect                                         |
//! |------------|------------------------------------------------|
//! | `ON`/`OFF` | manual valve override                          |
//! | `CLASSIFY` | capture + classify, label written to journal   |
//!
//! Input is case-insensitive. The console runs on its own thread and only
//! talks to the controller through a [`ControllerHandle`].

use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use log::{info, warn};

use crate::app::ControllerHandle;
use crate::app::ports::{CapturePort, ClassifierPort};
use crate::app::vision::classify_and_record;
use crate::config::VisionConfig;
use crate::control::ValvePosition;

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Valve(ValvePosition),
    Classify,
    Empty,
    Unknown(String),
}

pub fn parse_console_line(line: &str) -> ConsoleInput {
    let word = line.trim();
    if word.is_empty() {
        return ConsoleInput::Empty;
    }
    match word.to_ascii_uppercase().as_str() {
        "ON" => ConsoleInput::Valve(ValvePosition::On),
        "OFF" => ConsoleInput::Valve(ValvePosition::Off),
        "CLASSIFY" => ConsoleInput::Classify,
        _ => ConsoleInput::Unknown(word.to_string()),
    }
}

/// Dispatch one parsed line. Returns `false` once the controller is gone.
pub fn dispatch(
    input: ConsoleInput,
    controller: &ControllerHandle,
    camera: &impl CapturePort,
    classifier: &impl ClassifierPort,
    vision: &VisionConfig,
) -> bool {
    match input {
        ConsoleInput::Valve(position) => controller.set_valve(position),
        ConsoleInput::Classify => match classify_and_record(camera, classifier, vision, controller)
        {
            Ok(verdict) => {
                info!(
                    "plant state: {} ({:.0}%)",
                    verdict.label,
                    verdict.confidence * 100.0
                );
                true
            }
            Err(crate::error::VisionError::ControllerStopped) => false,
            Err(e) => {
                warn!("classification failed: {e}");
                true
            }
        },
        ConsoleInput::Empty => true,
        ConsoleInput::Unknown(word) => {
            warn!("unknown console command {word:?} (expected ON, OFF or CLASSIFY)");
            true
        }
    }
}

/// Read stdin lines on a background thread until EOF or the controller
/// stops.
pub fn spawn<C, K>(
    controller: ControllerHandle,
    camera: C,
    classifier: K,
    vision: VisionConfig,
) -> io::Result<JoinHandle<()>>
where
    C: CapturePort + Send + 'static,
    K: ClassifierPort + Send + 'static,
{
    thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let input = parse_console_line(&line);
                if !dispatch(input, &controller, &camera, &classifier, &vision) {
                    break;
                }
            }
        })
}
