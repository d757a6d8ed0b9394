//! Port traits: the hexagonal boundary between the brewing core and the rig.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ RecipeRunner / Supervisor (domain)
//! ```
//!
//! Driven adapters (actuator drivers, sensor readers, notification UI,
//! property store, clock, log storage) implement these traits.  The core
//! holds them behind `Arc<dyn …>` because control loops run on their own
//! threads and share the same actuator and sensor handles as the
//! scheduler thread.  Every port is therefore `Send + Sync` and takes
//! `&self`; adapters do their own interior locking.

use core::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::RigConfig;
use crate::error::{ActuatorError, ConfigError, SensorError};
use crate::step::properties::StepProperties;

use super::events::{Notification, RigEvent};

// ───────────────────────────────────────────────────────────────
// Identifiers
// ───────────────────────────────────────────────────────────────

/// Address of a switchable actor (heater element, pump, agitator, valve).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of a temperature probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorId(pub u32);

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: switch actors on and off.
///
/// Each call is independently fallible.  Callers that switch several
/// actors must attempt every one of them regardless of earlier failures.
pub trait ActuatorPort: Send + Sync {
    fn turn_on(&self, actor: ActorId) -> Result<(), ActuatorError>;

    fn turn_off(&self, actor: ActorId) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain temperatures (°C).
pub trait SensorPort: Send + Sync {
    fn read_temperature(&self, sensor: SensorId) -> Result<f64, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Operator notifications and structured events
// ───────────────────────────────────────────────────────────────

/// Operator-facing notification channel (UI toast, push message, …).
///
/// Fire-and-forget: implementations must not block the scheduler.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// The domain emits structured [`RigEvent`]s through this port.  Adapters
/// decide where they go (log, websocket, MQTT).
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &RigEvent);
}

// ───────────────────────────────────────────────────────────────
// Time
// ───────────────────────────────────────────────────────────────

/// Monotonic time source used by step timers and elapsed-time reports.
pub trait Clock: Send + Sync {
    /// Monotonic time since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    /// Local calendar date, used to name archived brew logs.
    fn today(&self) -> NaiveDate;
}

// ───────────────────────────────────────────────────────────────
// Property store (read-only to steps)
// ───────────────────────────────────────────────────────────────

/// Supplies each step's configured property values at activation time,
/// plus free-form rig parameters such as the current brew name.
pub trait PropertyStore: Send + Sync {
    /// Properties of the step at `position` in the recipe.
    fn step_properties(&self, position: usize) -> Result<StepProperties, ConfigError>;

    /// A global rig parameter, `None` when unset.
    fn parameter(&self, key: &str) -> Option<String>;
}

// ───────────────────────────────────────────────────────────────
// Log archive (housekeeping steps)
// ───────────────────────────────────────────────────────────────

/// Access to the per-device temperature logs kept by the rig.
pub trait LogArchive: Send + Sync {
    /// Delete the live per-device logs.  Returns how many were removed.
    fn clear_logs(&self) -> io::Result<usize>;

    /// Copy every live per-device log under an archive name derived from
    /// `brew_name`.  Returns how many were archived.
    fn archive_logs(&self, brew_name: &str) -> io::Result<usize>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists rig configuration.
///
/// Implementations MUST validate before persisting and reject invalid
/// values with [`ConfigError::ValidationFailed`] rather than clamping.
pub trait ConfigPort {
    fn load(&self) -> Result<RigConfig, ConfigError>;

    fn save(&self, config: &RigConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Port bundle
// ───────────────────────────────────────────────────────────────

/// Every collaborator the core needs, wired once at startup and handed to
/// both the scheduler and the supervisor.
#[derive(Clone)]
pub struct RigPorts {
    pub actuators: Arc<dyn ActuatorPort>,
    pub sensors: Arc<dyn SensorPort>,
    pub notifier: Arc<dyn Notifier>,
    pub events: Arc<dyn EventSink>,
    pub clock: Arc<dyn Clock>,
    pub properties: Arc<dyn PropertyStore>,
    pub logs: Arc<dyn LogArchive>,
}
