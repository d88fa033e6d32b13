//! Unified error types for the irrigation controller.
//!
//! Each subsystem owns a typed error; the crate-level [`Error`] wraps them so
//! the binary can report a single diagnostic. Inside the control loop these
//! errors are logged and the loop keeps running: only [`ChannelError::Open`]
//! at startup is fatal.

use std::io;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Subsystem errors, unified for callers that span more than one.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The serial channel failed (open, read or write).
    #[error("channel: {0}")]
    Channel(#[from] ChannelError),
    /// The journal could not be read or written.
    #[error("journal: {0}")]
    Journal(#[from] JournalError),
    /// Configuration is invalid or could not be loaded.
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    /// Image capture or classification failed.
    #[error("vision: {0}")]
    Vision(#[from] VisionError),
}

// ---------------------------------------------------------------------------
// Channel errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The device port is missing, busy or not permitted. Fatal at startup.
    #[error("cannot open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    /// A read or write on an open port failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// Journal errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// A stored row could not be interpreted.
    #[error("malformed row {line}: {reason}")]
    Malformed { line: u64, reason: String },
}

impl JournalError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    /// A field failed range or consistency validation.
    #[error("validation failed: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Vision errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    /// No command configured for this collaborator.
    #[error("{0} command not configured")]
    NotConfigured(&'static str),
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    /// The classifier printed something other than `<label> <confidence>`.
    #[error("unexpected classifier output: {0:?}")]
    BadOutput(String),
    /// The label could not be queued because the control loop has exited.
    #[error("controller stopped before the label could be recorded")]
    ControllerStopped,
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
