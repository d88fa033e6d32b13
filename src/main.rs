//! irrigator: soil-moisture irrigation controller.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SerialChannel     LogEventSink   Journal (CSV)   SystemClock  │
//! │  (Telemetry)       (EventSink)    (JournalPort)   (Clock)      │
//! │  Console           CommandCamera  CommandClassifier            │
//! │  (stdin → handle)  (CapturePort)  (ClassifierPort)             │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │         IrrigationController (pure logic)              │    │
//! │  │  Frame parser · Hysteresis policy                      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  runner::run (single channel owner, stop flag, command queue)  │
//! └────────────────────────────────────────────────────────────────┘
//! ```

mod cli;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use clap::Parser;
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut cfg = cli::load_config(cli.config.as_deref())?;
    if let Commands::Run(args) = &cli.command {
        args.apply(&mut cfg);
    }
    cfg.validate().context("invalid configuration")?;

    match cli.command {
        Commands::Run(_) => {
            let stop = Arc::new(AtomicBool::new(false));
            for signal in [SIGINT, SIGTERM] {
                signal_hook::flag::register(signal, Arc::clone(&stop))
                    .with_context(|| format!("failed to register handler for signal {signal}"))?;
            }
            cli::run_controller(&cfg, &stop)
        }
        Commands::Init => cli::init_journal(&cfg),
        Commands::Status { json } => cli::show_status(&cfg, json),
        Commands::History { limit, json } => cli::show_history(&cfg, limit, json),
    }
}
