//! Kettle records and the explicit kettle registry.
//!
//! A kettle is a controllable heat source: one heater actor, one
//! temperature probe, a target setpoint and optionally a control
//! algorithm.  Records are configured once at startup and live for the
//! whole process.
//!
//! The registry's mutex is the single serialization point for the
//! bookkeeping fields (`running`, the control-loop instance).  Only the
//! [`Supervisor`](crate::control::supervisor::Supervisor) takes it for
//! writing.  The setpoint is additionally published through a lock-free
//! [`SetpointHandle`] so control loops can read it every iteration
//! without contending with the scheduler.

use core::fmt;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::app::ports::{ActorId, SensorId};
use crate::config::KettleConfig;
use crate::control::AlgorithmParams;
use crate::control::supervisor::ControlHandle;

/// Unique kettle identifier.  Zero is reserved for "no kettle selected".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KettleId(pub u32);

impl fmt::Display for KettleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Setpoint
// ---------------------------------------------------------------------------

/// Shared, lock-free target temperature (°C stored as `f64` bits).
#[derive(Debug, Clone)]
pub struct SetpointHandle(Arc<AtomicU64>);

impl SetpointHandle {
    fn new(celsius: f64) -> Self {
        Self(Arc::new(AtomicU64::new(celsius.to_bits())))
    }

    /// Current target temperature.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    fn set(&self, celsius: f64) {
        self.0.store(celsius.to_bits(), Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Kettle record
// ---------------------------------------------------------------------------

/// One kettle's configuration plus its live auto-mode bookkeeping.
pub struct Kettle {
    pub id: KettleId,
    pub name: String,
    pub heater: ActorId,
    pub sensor: SensorId,
    /// Registered name of the control algorithm, if any.
    pub logic: Option<String>,
    pub logic_params: AlgorithmParams,
    setpoint: SetpointHandle,
    /// `true` while an automatic control loop owns this kettle.
    pub(crate) running: bool,
    /// The live control-loop task, when one was spawned.
    pub(crate) instance: Option<ControlHandle>,
    /// Bumped on every spawn so a late-exiting task cannot retire its
    /// successor.
    pub(crate) generation: u64,
}

impl Kettle {
    pub fn from_config(cfg: &KettleConfig) -> Self {
        Self {
            id: cfg.id,
            name: cfg.name.clone(),
            heater: cfg.heater,
            sensor: cfg.sensor,
            logic: cfg.logic.clone(),
            logic_params: cfg.logic_params.clone(),
            setpoint: SetpointHandle::new(cfg.target_temp),
            running: false,
            instance: None,
            generation: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn target_temp(&self) -> f64 {
        self.setpoint.get()
    }

    pub fn setpoint(&self) -> SetpointHandle {
        self.setpoint.clone()
    }

    pub(crate) fn set_target_temp(&mut self, celsius: f64) {
        self.setpoint.set(celsius);
    }

    pub fn snapshot(&self) -> KettleSnapshot {
        KettleSnapshot {
            id: self.id,
            name: self.name.clone(),
            target_temp: self.target_temp(),
            running: self.running,
            has_instance: self.instance.is_some(),
            logic: self.logic.clone(),
        }
    }
}

impl fmt::Debug for Kettle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kettle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("target_temp", &self.target_temp())
            .field("running", &self.running)
            .field("has_instance", &self.instance.is_some())
            .finish_non_exhaustive()
    }
}

/// Copy of a kettle's observable state, safe to hand to event sinks.
#[derive(Debug, Clone, PartialEq)]
pub struct KettleSnapshot {
    pub id: KettleId,
    pub name: String,
    pub target_temp: f64,
    pub running: bool,
    pub has_instance: bool,
    pub logic: Option<String>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Explicit registry of every kettle on the rig, shared by reference
/// between the recipe runner and the supervisor.
#[derive(Debug, Default)]
pub struct KettleRegistry {
    kettles: Mutex<BTreeMap<KettleId, Kettle>>,
}

impl KettleRegistry {
    pub fn new(kettles: impl IntoIterator<Item = Kettle>) -> Self {
        Self {
            kettles: Mutex::new(kettles.into_iter().map(|k| (k.id, k)).collect()),
        }
    }

    pub fn from_config(configs: &[KettleConfig]) -> Self {
        Self::new(configs.iter().map(Kettle::from_config))
    }

    /// Lock the bookkeeping map.  A panic on another thread while holding
    /// the lock must not wedge the rig, so poisoning is ignored.
    pub(crate) fn lock(&self) -> MutexGuard<'_, BTreeMap<KettleId, Kettle>> {
        self.kettles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, id: KettleId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Probe wired to the kettle.
    pub fn sensor_of(&self, id: KettleId) -> Option<SensorId> {
        self.lock().get(&id).map(|k| k.sensor)
    }

    pub fn snapshot(&self, id: KettleId) -> Option<KettleSnapshot> {
        self.lock().get(&id).map(Kettle::snapshot)
    }

    pub fn snapshots(&self) -> Vec<KettleSnapshot> {
        self.lock().values().map(Kettle::snapshot).collect()
    }

    pub fn ids(&self) -> Vec<KettleId> {
        self.lock().keys().copied().collect()
    }
}
