//! Application service: the hexagonal core.
//!
//! [`BrewService`] owns the recipe runner and shares the controller
//! supervisor with it.  It exposes a clean, hardware-agnostic API: one
//! [`tick`](BrewService::tick) per scheduler period, operator commands,
//! and telemetry.  All I/O flows through the [`RigPorts`] injected at
//! construction, making the whole service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!                 │         BrewService          │
//! ActuatorPort ◀──│  RecipeRunner · Supervisor   │ ──▶ Notifier
//!                 └─────────────────────────────┘
//!                          │ spawn
//!                          ▼
//!                   control loops (own threads)
//! ```

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};

use crate::config::RigConfig;
use crate::control::{ControllerRegistry, Supervisor};
use crate::error::{ConfigError, ControlError, Error};
use crate::kettle::KettleRegistry;
use crate::step::{RecipeRunner, StepRegistry};

use super::commands::RigCommand;
use super::events::{Notification, Severity, Telemetry};
use super::ports::{Notifier, RigPorts};

// ───────────────────────────────────────────────────────────────
// BrewService
// ───────────────────────────────────────────────────────────────

pub struct BrewService {
    runner: RecipeRunner,
    supervisor: Supervisor,
    notifier: Arc<dyn Notifier>,
    tick_interval: Duration,
    tick_count: u64,
}

impl BrewService {
    /// Build the service from a validated configuration.
    ///
    /// Kettle algorithms are checked against `controllers` here; unknown
    /// step kinds are only reported, since the recipe blocks on them when
    /// it gets there and the operator may skip them.
    pub fn new(
        config: &RigConfig,
        ports: RigPorts,
        controllers: ControllerRegistry,
        steps: StepRegistry,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let kettles = Arc::new(KettleRegistry::from_config(&config.kettles));
        let supervisor = Supervisor::new(kettles, controllers, &ports, config.control_stack_kb)?;

        let recipe = config.recipe_outline();
        for (position, entry) in recipe.iter().enumerate() {
            if steps.get(&entry.kind).is_none() {
                warn!(
                    "Recipe step {} '{}' uses unknown kind '{}'",
                    position, entry.name, entry.kind
                );
            }
        }

        info!(
            "BrewService ready: {} kettle(s), {} step(s), tick {}ms",
            config.kettles.len(),
            recipe.len(),
            config.tick_interval_ms
        );

        Ok(Self {
            notifier: Arc::clone(&ports.notifier),
            runner: RecipeRunner::new(recipe, steps, ports, supervisor.clone()),
            supervisor,
            tick_interval: Duration::from_millis(u64::from(config.tick_interval_ms)),
            tick_count: 0,
        })
    }

    /// Enter the first recipe step.
    pub fn start(&mut self) {
        self.runner.start();
    }

    /// One scheduler tick.
    pub fn tick(&mut self) {
        self.tick_count += 1;
        self.runner.tick();
    }

    /// Process an operator command.
    pub fn handle_command(&mut self, cmd: RigCommand) -> Result<(), Error> {
        info!("Command: {:?}", cmd);
        match cmd {
            RigCommand::Start => self.runner.start(),
            RigCommand::Next => self.runner.next(),
            RigCommand::ResetStep => self.runner.reset_step(),
            RigCommand::Stop => self.runner.stop(),
            RigCommand::SetAutoMode { kettle, mode } => {
                self.supervisor.auto_mode(kettle, mode).inspect_err(|e| {
                    error!("Auto mode command: {}", e);
                    self.notifier.notify(
                        &Notification::new(
                            "Error",
                            format!("Failed to set Auto mode {}", mode.as_str()),
                            Severity::Danger,
                        )
                        .sticky(),
                    );
                })?;
            }
            RigCommand::SetTargetTemp { kettle, target } => {
                if !target.is_finite() {
                    return Err(ConfigError::InvalidProperty {
                        name: "target".into(),
                        reason: format!("{target} is not finite"),
                    }
                    .into());
                }
                self.supervisor.set_target_temp(kettle, target)?;
            }
        }
        Ok(())
    }

    /// Build a telemetry snapshot.
    pub fn build_telemetry(&self) -> Telemetry {
        Telemetry {
            step: self.runner.status(),
            kettles: self.supervisor.snapshots(),
            finished: self.runner.is_finished(),
        }
    }

    /// Stop the recipe and every running control loop.
    pub fn shutdown(&mut self) -> Vec<ControlError> {
        self.runner.stop();
        let failures = self.supervisor.shutdown();
        for e in &failures {
            warn!("Shutdown: {}", e);
        }
        info!("BrewService shut down after {} ticks", self.tick_count);
        failures
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn is_finished(&self) -> bool {
        self.runner.is_finished()
    }

    pub fn runner(&self) -> &RecipeRunner {
        &self.runner
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }
}
