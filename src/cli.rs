//! Command-line surface and subcommand handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use irrigator::adapters::camera::CommandCamera;
use irrigator::adapters::classifier::CommandClassifier;
use irrigator::adapters::clock::SystemClock;
use irrigator::adapters::console;
use irrigator::adapters::log_sink::LogEventSink;
use irrigator::adapters::serial::SerialChannel;
use irrigator::app::vision::image_status;
use irrigator::app::{IrrigationController, command_queue, run};
use irrigator::config::SystemConfig;
use irrigator::journal::{Journal, JournalRecord, TIMESTAMP_FORMAT};

/// irrigator - soil-moisture irrigation controller
#[derive(Parser, Debug)]
#[command(name = "irrigator")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file (built-in defaults when absent)
    #[arg(short, long, env = "IRRIGATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level or filter directive (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the device and run the control loop with console input
    Run(RunArgs),

    /// Create the journal with its header (idempotent)
    Init,

    /// Show the most recent record and the last captured image
    Status {
        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print journal rows, most recent last
    History {
        /// Only the last N rows
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Print the rows as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Overrides applied on top of the configuration file.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Serial device path
    #[arg(long, env = "IRRIGATOR_PORT")]
    pub port: Option<String>,

    #[arg(long)]
    pub baud_rate: Option<u32>,

    /// Journal CSV path
    #[arg(long, env = "IRRIGATOR_JOURNAL")]
    pub journal: Option<PathBuf>,

    #[arg(long)]
    pub dry_threshold: Option<u32>,

    #[arg(long)]
    pub wet_threshold: Option<u32>,
}

impl RunArgs {
    pub fn apply(&self, cfg: &mut SystemConfig) {
        if let Some(port) = &self.port {
            cfg.serial.port.clone_from(port);
        }
        if let Some(baud) = self.baud_rate {
            cfg.serial.baud_rate = baud;
        }
        if let Some(journal) = &self.journal {
            cfg.journal.path.clone_from(journal);
        }
        if let Some(dry) = self.dry_threshold {
            cfg.control.dry_threshold = dry;
        }
        if let Some(wet) = self.wet_threshold {
            cfg.control.wet_threshold = wet;
        }
    }
}

/// Load the configuration file, or the defaults when none was named.
pub fn load_config(path: Option<&Path>) -> Result<SystemConfig> {
    match path {
        Some(path) => SystemConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(SystemConfig::default()),
    }
}

// ── Handlers ──────────────────────────────────────────────────

pub fn run_controller(cfg: &SystemConfig, stop: &Arc<AtomicBool>) -> Result<()> {
    let thresholds = cfg.thresholds().context("invalid thresholds")?;
    let journal = Journal::initialize(&cfg.journal.path).with_context(|| {
        format!("failed to initialize journal {}", cfg.journal.path.display())
    })?;
    let channel = SerialChannel::open(
        &cfg.serial.port,
        cfg.serial.baud_rate,
        cfg.serial.read_timeout(),
        cfg.serial.settle_delay(),
    )
    .context("failed to open the controller board")?;

    let (handle, commands) = command_queue();
    console::spawn(
        handle,
        CommandCamera::new(cfg.vision.capture_command.clone()),
        CommandClassifier::new(cfg.vision.classify_command.clone()),
        cfg.vision.clone(),
    )
    .context("failed to start console thread")?;

    let mut controller = IrrigationController::new(thresholds, SystemClock);
    let mut sink = LogEventSink::new();
    let summary = run(
        &mut controller,
        channel,
        &journal,
        &mut sink,
        &commands,
        stop,
        cfg.serial.read_timeout(),
    );
    info!(
        "stopped ({:?}); journal at {}",
        summary.reason,
        journal.path().display()
    );
    Ok(())
}

pub fn init_journal(cfg: &SystemConfig) -> Result<()> {
    let journal = Journal::initialize(&cfg.journal.path).with_context(|| {
        format!("failed to initialize journal {}", cfg.journal.path.display())
    })?;
    println!("Journal ready at {}", journal.path().display());
    Ok(())
}

pub fn show_status(cfg: &SystemConfig, json: bool) -> Result<()> {
    let journal = open_existing(&cfg.journal.path)
        .with_context(|| format!("failed to open journal {}", cfg.journal.path.display()))?;
    let last = match &journal {
        Some(journal) => journal.last_record().context("failed to read journal")?,
        None => None,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&last)?);
    } else if let Some(record) = &last {
        println!("{}", render_header());
        println!("{}", render_row(record));
    } else {
        println!("No data recorded yet.");
    }

    match image_status(&cfg.vision.image_path) {
        Some(path) => println!("Last image: {}", path.display()),
        None => println!("No image captured yet."),
    }
    Ok(())
}

pub fn show_history(cfg: &SystemConfig, limit: Option<usize>, json: bool) -> Result<()> {
    let journal = open_existing(&cfg.journal.path)
        .with_context(|| format!("failed to open journal {}", cfg.journal.path.display()))?;
    let records = match journal {
        Some(journal) => journal.records().context("failed to read journal")?,
        None => Vec::new(),
    };
    let skip = limit.map_or(0, |n| records.len().saturating_sub(n));
    let shown = &records[skip..];

    if json {
        println!("{}", serde_json::to_string_pretty(shown)?);
        return Ok(());
    }
    if shown.is_empty() {
        println!("No data recorded yet.");
        return Ok(());
    }
    println!("{}", render_header());
    for record in shown {
        println!("{}", render_row(record));
    }
    Ok(())
}

/// Reading commands never create the journal.
fn open_existing(path: &Path) -> irrigator::Result<Option<Journal>> {
    Ok(Journal::open_existing(path)?)
}

fn render_header() -> String {
    format!(
        "{:<19}  {:>8}  {:<5}  {:<32}  {}",
        "time", "moisture", "valve", "observations", "visual"
    )
}

fn render_row(record: &JournalRecord) -> String {
    format!(
        "{:<19}  {:>8}  {:<5}  {:<32}  {}",
        record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        record
            .moisture_raw
            .map_or_else(|| "-".to_string(), |m| m.to_string()),
        record.valve.as_str(),
        record.observations,
        record.visual_state.as_deref().unwrap_or("-"),
    )
}
