//! Rig configuration
//!
//! Everything the core needs to know about the physical rig and the
//! recipe to run: actors, probes, kettles (with their control algorithm
//! and its tuning), global parameters and the ordered recipe steps.
//! Loaded from JSON through a [`ConfigPort`](crate::app::ports::ConfigPort).

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::app::ports::{ActorId, PropertyStore, SensorId};
use crate::control::AlgorithmParams;
use crate::error::ConfigError;
use crate::kettle::KettleId;
use crate::step::properties::StepProperties;
use crate::step::runner::RecipeEntry;

/// A switchable actor wired to the rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorConfig {
    pub id: ActorId,
    pub name: String,
}

/// A temperature probe wired to the rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub id: SensorId,
    pub name: String,
}

/// Static description of one kettle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KettleConfig {
    pub id: KettleId,
    pub name: String,
    pub heater: ActorId,
    pub sensor: SensorId,
    /// Registered control algorithm (`"hysteresis"`, `"pid"`, …).
    #[serde(default)]
    pub logic: Option<String>,
    /// Algorithm-specific tuning, e.g. `{"p": 44, "i": 165, "d": 4}`.
    #[serde(default)]
    pub logic_params: AlgorithmParams,
    /// Initial target temperature (°C).
    #[serde(default)]
    pub target_temp: f64,
}

/// One recipe step as configured by the brewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStep {
    pub name: String,
    /// Step type id from the step registry (`"chill"`, `"actor_timer"`, …).
    pub kind: String,
    #[serde(default)]
    pub properties: StepProperties,
}

/// Core rig configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Scheduler tick interval (milliseconds)
    pub tick_interval_ms: u32,
    /// Stack size for each control-loop thread (KiB)
    pub control_stack_kb: usize,
    /// Directory holding the per-device temperature logs
    pub log_dir: PathBuf,
    /// Free-form parameters (`brew_name`, …)
    pub parameters: BTreeMap<String, String>,
    pub actors: Vec<ActorConfig>,
    pub sensors: Vec<SensorConfig>,
    pub kettles: Vec<KettleConfig>,
    pub recipe: Vec<RecipeStep>,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000, // 1 Hz
            control_stack_kb: 64,
            log_dir: PathBuf::from("./logs/"),
            parameters: BTreeMap::new(),
            actors: Vec::new(),
            sensors: Vec::new(),
            kettles: Vec::new(),
            recipe: Vec::new(),
        }
    }
}

impl RigConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Corrupted(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the core cannot run safely.
    ///
    /// Algorithm names are checked later, against the controller registry,
    /// when the supervisor is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(invalid("tick_interval_ms must be > 0"));
        }
        if self.control_stack_kb < 16 {
            return Err(invalid("control_stack_kb must be >= 16"));
        }

        let actors = unique_ids(self.actors.iter().map(|a| a.id), "actor")?;
        let sensors = unique_ids(self.sensors.iter().map(|s| s.id), "sensor")?;
        unique_ids(self.kettles.iter().map(|k| k.id), "kettle")?;

        for kettle in &self.kettles {
            if kettle.id == KettleId(0) {
                return Err(invalid("kettle id 0 is reserved"));
            }
            if !actors.contains(&kettle.heater) {
                return Err(invalid(format!(
                    "kettle {} heater {} is not a configured actor",
                    kettle.id, kettle.heater
                )));
            }
            if !sensors.contains(&kettle.sensor) {
                return Err(invalid(format!(
                    "kettle {} sensor {} is not a configured sensor",
                    kettle.id, kettle.sensor
                )));
            }
            if !kettle.target_temp.is_finite() {
                return Err(invalid(format!("kettle {} target is not finite", kettle.id)));
            }
        }

        for (position, step) in self.recipe.iter().enumerate() {
            if step.kind.trim().is_empty() {
                return Err(invalid(format!("recipe step {position} has no kind")));
            }
        }
        Ok(())
    }

    /// Names and kinds of the recipe steps, in order.
    pub fn recipe_outline(&self) -> Vec<RecipeEntry> {
        self.recipe
            .iter()
            .map(|s| RecipeEntry {
                name: s.name.clone(),
                kind: s.kind.clone(),
            })
            .collect()
    }
}

impl PropertyStore for RigConfig {
    fn step_properties(&self, position: usize) -> Result<StepProperties, ConfigError> {
        self.recipe
            .get(position)
            .map(|s| s.properties.clone())
            .ok_or_else(|| invalid(format!("no recipe step at position {position}")))
    }

    fn parameter(&self, key: &str) -> Option<String> {
        self.parameters.get(key).cloned()
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::ValidationFailed(msg.into())
}

fn unique_ids<T: Ord + Copy + core::fmt::Display>(
    ids: impl Iterator<Item = T>,
    what: &str,
) -> Result<BTreeSet<T>, ConfigError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(invalid(format!("duplicate {what} id {id}")));
        }
    }
    Ok(seen)
}
