//! Roastctl host entry point
//!
//! Runs the control core against the simulated drum, one async task per
//! periodic trigger.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimulatedRoaster   LogEventSink   JsonFileConfig              │
//! │  (Sensor+Heater)    (EventSink)    (ConfigPort)                │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            RoastService (pure logic)                   │    │
//! │  │  RoR · PID · Log · Stopwatch · Chart lock              │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  edge-executor: control │ chart-refresh │ chart-data │ table   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use core::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use edge_executor::LocalExecutor;
use embassy_time::{Duration, Instant, Timer};
use log::{info, warn};
use tracing_subscriber::filter::LevelFilter;

use roastctl::adapters::config_file::JsonFileConfig;
use roastctl::adapters::log_sink::LogEventSink;
use roastctl::adapters::sim::SimulatedRoaster;
use roastctl::app::ports::{ConfigPort, TickDelegate};
use roastctl::app::runner::TickRunner;
use roastctl::app::service::RoastService;
use roastctl::config::RoasterConfig;
use roastctl::scheduler::{PeriodicTrigger, Scheduler};

/// Columns written by `--export`.
const EXPORT_FIELDS: [&str; 3] = ["log.temperature", "log.heat", "log.auto_mode"];

/// Coffee roaster control loop
#[derive(Parser, Debug)]
#[command(name = "roastctl", about = "Coffee roaster control loop against a simulated drum.")]
struct Cli {
    /// Path to a JSON config file (a missing file means defaults)
    #[arg(short, long, default_value = "roaster.json")]
    config: PathBuf,

    /// Stop after this many seconds (runs until killed when omitted)
    #[arg(short, long)]
    duration: Option<u64>,

    /// Auto-mode target rate-of-rise (°C/min).  Auto mode is the default;
    /// without this flag the configured default target is used
    #[arg(short, long)]
    target: Option<f64>,

    /// Start in manual mode at this heat level (%) instead of auto mode
    #[arg(long, conflicts_with = "target")]
    heat: Option<i32>,

    /// Write a CSV roast profile here on exit
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Ambient / starting drum temperature (°C)
    #[arg(long, default_value_t = 20.0)]
    ambient: f64,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        })
        .init();

    info!("╔══════════════════════════════════════╗");
    info!("║  Roastctl v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 1. Config (file or defaults) ──────────────────────────
    let config = match JsonFileConfig::new(&cli.config).load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            RoasterConfig::default()
        }
    };

    // ── 2. Service and adapters ───────────────────────────────
    let start = Instant::now();
    let service = RoastService::new(config, start);
    let mut sink = LogEventSink::new();
    let mut hw = SimulatedRoaster::new(cli.ambient);

    service.reset_stopwatch(&mut sink, start);
    match (cli.target, cli.heat) {
        (None, Some(level)) => {
            service.set_heat(level, &mut hw, &mut sink);
        }
        (target, _) => {
            if target.is_none() {
                info!("No --target or --heat given, starting in auto mode");
            }
            service.start_pid(
                target.unwrap_or(service.config().default_target_ror),
                &mut sink,
            );
        }
    }

    // ── 3. One task per trigger ───────────────────────────────
    let runner = RefCell::new(TickRunner::new(&service, hw, sink));
    let executor: LocalExecutor<'_, 8> = LocalExecutor::new();
    for trigger in Scheduler::from_config(service.config(), start).into_triggers() {
        executor.spawn(drive(trigger, &runner)).detach();
    }

    info!("System ready. Entering tick loop.");
    match cli.duration {
        Some(secs) => futures_lite::future::block_on(
            executor.run(Timer::after(Duration::from_secs(secs))),
        ),
        None => futures_lite::future::block_on(executor.run(core::future::pending::<()>())),
    }

    // ── 4. Wrap up ────────────────────────────────────────────
    let metrics = service.metrics(Instant::now());
    info!("Metrics: {}", serde_json::to_string(&metrics)?);

    if let Some(path) = cli.export {
        let summary = service.data_summary(&EXPORT_FIELDS);
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        let mut out = BufWriter::new(file);
        summary.write_csv(&mut out)?;
        out.flush()?;
        info!("Exported {} rows to {}", summary.len(), path.display());
    }

    Ok(())
}

/// Wait for each due time and hand the firing to the delegate.
async fn drive<D: TickDelegate>(mut trigger: PeriodicTrigger, delegate: &RefCell<D>) {
    loop {
        Timer::at(trigger.next_due()).await;
        let now = Instant::now();
        if trigger.fire(now) {
            let outcome = delegate.borrow_mut().on_tick(trigger.kind(), now);
            trigger.record(outcome);
        }
    }
}
