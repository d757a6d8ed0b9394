//! BrewRig host simulator: main entry point
//!
//! Runs a recipe against a simulated rig.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  SimRig            LogEventSink   JsonConfigFile  Monotonic  │
//! │  (Sensor+Actuator) LogNotifier    (Config)        Clock      │
//! │  FsLogArchive (log housekeeping)                             │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │              BrewService (pure logic)                  │  │
//! │  │  RecipeRunner · Supervisor · control loops             │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use tracing_subscriber::EnvFilter;

use brewrig::adapters::config_file::JsonConfigFile;
use brewrig::adapters::log_archive::FsLogArchive;
use brewrig::adapters::log_sink::{LogEventSink, LogNotifier};
use brewrig::adapters::sim::{SimRig, ThermalModel};
use brewrig::adapters::time::MonotonicClock;
use brewrig::app::commands::RigCommand;
use brewrig::app::ports::{ConfigPort, RigPorts};
use brewrig::app::service::BrewService;
use brewrig::control::ControllerRegistry;
use brewrig::step::StepRegistry;

#[derive(Parser, Debug)]
#[command(name = "brewrig")]
#[command(about = "Run a brewing recipe against a simulated rig")]
#[command(version)]
struct Cli {
    /// Rig configuration (JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// Stop after this many scheduler ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the configured tick interval (milliseconds)
    #[arg(long)]
    tick_ms: Option<u32>,

    /// Press "next" for the operator once a step has waited this many ticks
    #[arg(long)]
    auto_next: Option<u64>,

    /// Print the available step kinds and exit
    #[arg(long)]
    list_steps: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let steps = StepRegistry::with_builtins();

    if cli.list_steps {
        for kind in steps.kinds() {
            println!("{:<12} {}", kind.id, kind.name);
            for prop in kind.properties {
                println!("    {:<10} {:<18} {}", prop.key, prop.label, prop.description);
            }
        }
        return Ok(());
    }

    // ── Configuration ─────────────────────────────────────────
    let mut config = JsonConfigFile::new(&cli.config)
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(ms) = cli.tick_ms {
        config.tick_interval_ms = ms;
    }
    let config = Arc::new(config);

    // ── Adapters ──────────────────────────────────────────────
    let sim = Arc::new(SimRig::from_config(&config, ThermalModel::default()));
    let ports = RigPorts {
        actuators: sim.clone(),
        sensors: sim.clone(),
        notifier: Arc::new(LogNotifier::new()),
        events: Arc::new(LogEventSink::new()),
        clock: Arc::new(MonotonicClock::new()),
        properties: config.clone(),
        logs: Arc::new(FsLogArchive::new(config.log_dir.clone())),
    };

    let mut service = BrewService::new(
        &config,
        ports,
        ControllerRegistry::with_builtins(),
        steps,
    )
    .context("building brew service")?;

    // ── Main loop ─────────────────────────────────────────────
    service.start();
    let tick = service.tick_interval();
    let mut waited = 0u64;
    let mut last_position = service.runner().position();

    while !service.is_finished() && cli.ticks.is_none_or(|max| service.tick_count() < max) {
        thread::sleep(tick);
        sim.advance(tick.as_secs_f64());
        service.tick();

        let position = service.runner().position();
        if position == last_position {
            waited += 1;
        } else {
            waited = 0;
            last_position = position;
        }
        if cli.auto_next.is_some_and(|limit| waited >= limit) {
            info!("Step waited {} ticks, advancing", waited);
            service.handle_command(RigCommand::Next)?;
            waited = 0;
        }

        if service.tick_count() % 10 == 0 {
            let t = service.build_telemetry();
            if let Some(step) = &t.step {
                info!(
                    "TELEM | step #{} '{}' {} | timer={:?}",
                    step.position,
                    step.name,
                    step.phase.as_str(),
                    step.timer
                );
            }
        }
    }

    if !service.is_finished() {
        warn!("Tick limit reached before the recipe finished");
    }
    let failures = service.shutdown();
    info!(
        "Done after {} ticks ({} shutdown failure(s))",
        service.tick_count(),
        failures.len()
    );
    Ok(())
}
