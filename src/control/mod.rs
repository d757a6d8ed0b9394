//! Automatic kettle control ("auto mode").
//!
//! ```text
//!  Step ──auto_mode(ON)──▶ Supervisor ──construct──▶ ControlLoopFactory
//!                              │                          │
//!                              │ spawn                    ▼
//!                              └──────────────▶  ControlLoop::run()
//!                                                 (own thread, polls StopToken)
//! ```
//!
//! Algorithms are plugged in through [`ControlLoopFactory`] and resolved by
//! name through a [`ControllerRegistry`].  Their parameters are validated
//! when the supervisor is built, so a typo in the rig config is reported
//! at startup rather than the first time a brewer flips auto mode on.

pub mod hysteresis;
pub mod pid;
pub mod stop;
pub mod supervisor;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::app::ports::{ActorId, ActuatorPort, SensorId, SensorPort};
use crate::error::ConfigError;
use crate::kettle::{KettleId, SetpointHandle};

pub use stop::{StopSignal, StopToken, stop_channel};
pub use supervisor::Supervisor;

/// Algorithm-specific tuning values, keyed by parameter name.
pub type AlgorithmParams = BTreeMap<String, f64>;

// ───────────────────────────────────────────────────────────────
// Auto-mode request
// ───────────────────────────────────────────────────────────────

/// Desired auto-mode transition for a kettle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoMode {
    On,
    Off,
    NoChange,
}

impl AutoMode {
    /// Option labels as the step editor shows them.
    pub const OPTIONS: [&'static str; 3] = ["Set to ON", "Set to OFF", "No Change"];

    /// Parse a step-editor label.  Anything unrecognised leaves the kettle
    /// alone.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Set to ON" => Self::On,
            "Set to OFF" => Self::Off,
            _ => Self::NoChange,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::NoChange => "NO_CHANGE",
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Control loop contract
// ───────────────────────────────────────────────────────────────

/// A running closed-loop controller for one kettle.
///
/// `run` blocks on a dedicated thread until the [`StopToken`] it received
/// at construction fires (or the algorithm decides it is done).  It must
/// poll the token at least once per iteration and leave the heater off
/// when it returns.
pub trait ControlLoop: Send {
    /// One-time setup, run on the caller's thread before spawning.
    fn init(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn run(&mut self) -> anyhow::Result<()>;
}

/// Everything a control loop gets at construction.
pub struct ControlLoopConfig {
    pub kettle: KettleId,
    pub heater: ActorId,
    pub sensor: SensorId,
    /// Live target temperature, updated by the supervisor.
    pub setpoint: SetpointHandle,
    pub params: AlgorithmParams,
    pub actuators: Arc<dyn ActuatorPort>,
    pub sensors: Arc<dyn SensorPort>,
    pub stop: StopToken,
}

/// Typed constructor for one control algorithm.
pub trait ControlLoopFactory: Send + Sync {
    /// Name kettles use to select this algorithm.
    fn name(&self) -> &'static str;

    /// Check a kettle's parameters without building anything.
    fn validate(&self, params: &AlgorithmParams) -> Result<(), ConfigError>;

    fn construct(&self, config: ControlLoopConfig) -> anyhow::Result<Box<dyn ControlLoop>>;
}

// ───────────────────────────────────────────────────────────────
// Registry
// ───────────────────────────────────────────────────────────────

/// Name → factory map consulted by the supervisor.
#[derive(Default)]
pub struct ControllerRegistry {
    factories: BTreeMap<&'static str, Box<dyn ControlLoopFactory>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the bundled `hysteresis` and `pid` loops.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register(Box::new(hysteresis::HysteresisFactory));
        reg.register(Box::new(pid::PidFactory));
        reg
    }

    /// Add or replace a factory.
    pub fn register(&mut self, factory: Box<dyn ControlLoopFactory>) {
        self.factories.insert(factory.name(), factory);
    }

    pub fn get(&self, name: &str) -> Option<&dyn ControlLoopFactory> {
        self.factories.get(name).map(AsRef::as_ref)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// Resolve `name` and validate `params` against it.
    pub fn validate(&self, name: &str, params: &AlgorithmParams) -> Result<(), ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::UnknownAlgorithm(name.to_string()))?
            .validate(params)
    }
}

/// Read an optional tuning value, falling back to `default`.
pub fn param(params: &AlgorithmParams, name: &str, default: f64) -> f64 {
    params.get(name).copied().unwrap_or(default)
}

/// Reject a tuning value that is non-finite or outside `min..=max`.
pub fn check_param(
    params: &AlgorithmParams,
    name: &str,
    min: f64,
    max: f64,
) -> Result<(), ConfigError> {
    match params.get(name) {
        Some(v) if !v.is_finite() || *v < min || *v > max => Err(ConfigError::InvalidProperty {
            name: name.to_string(),
            reason: format!("{v} is outside {min}..={max}"),
        }),
        _ => Ok(()),
    }
}
