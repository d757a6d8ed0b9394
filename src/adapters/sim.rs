//! Simulated rig adapter.
//!
//! Implements [`ActuatorPort`] and [`SensorPort`] over a first-order
//! thermal model so the host binary can run a whole recipe without
//! hardware.  Each kettle warms while its heater actor is on and relaxes
//! towards ambient otherwise; every other actor is a plain switch.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::app::ports::{ActorId, ActuatorPort, SensorId, SensorPort};
use crate::config::RigConfig;
use crate::error::{ActuatorError, SensorError};

/// Thermal constants for the simulated kettles.
#[derive(Debug, Clone, Copy)]
pub struct ThermalModel {
    pub ambient: f64,
    /// Heating rate with the element on (°C/s).
    pub heat_rate: f64,
    /// Newtonian loss coefficient (1/s).
    pub loss: f64,
}

impl Default for ThermalModel {
    fn default() -> Self {
        Self {
            ambient: 20.0,
            heat_rate: 0.5,
            loss: 0.01,
        }
    }
}

#[derive(Debug)]
struct SimKettle {
    heater: ActorId,
    temp: f64,
}

#[derive(Debug, Default)]
struct SimState {
    actors: BTreeMap<ActorId, bool>,
    /// Keyed by the kettle's probe.
    kettles: BTreeMap<SensorId, SimKettle>,
    /// Probes not mounted in a kettle read ambient.
    loose_sensors: Vec<SensorId>,
}

/// Simulated actors and probes, shared between the scheduler and the
/// control-loop threads.
#[derive(Debug)]
pub struct SimRig {
    model: ThermalModel,
    state: Mutex<SimState>,
}

impl SimRig {
    pub fn from_config(config: &RigConfig, model: ThermalModel) -> Self {
        let mut state = SimState::default();
        for actor in &config.actors {
            state.actors.insert(actor.id, false);
        }
        for kettle in &config.kettles {
            state.kettles.insert(
                kettle.sensor,
                SimKettle {
                    heater: kettle.heater,
                    temp: model.ambient,
                },
            );
        }
        state.loose_sensors = config
            .sensors
            .iter()
            .map(|s| s.id)
            .filter(|id| !state.kettles.contains_key(id))
            .collect();
        Self {
            model,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Integrate the model over `dt_secs` of simulated time.
    pub fn advance(&self, dt_secs: f64) {
        let m = self.model;
        let mut state = self.lock();
        let SimState { actors, kettles, .. } = &mut *state;
        for kettle in kettles.values_mut() {
            let heating = if actors.get(&kettle.heater).copied().unwrap_or(false) {
                m.heat_rate
            } else {
                0.0
            };
            kettle.temp += (heating - m.loss * (kettle.temp - m.ambient)) * dt_secs;
        }
    }

    /// Force a probe reading, e.g. to start a chill from boiling.
    pub fn set_temperature(&self, sensor: SensorId, celsius: f64) {
        if let Some(kettle) = self.lock().kettles.get_mut(&sensor) {
            kettle.temp = celsius;
        }
    }

    pub fn is_on(&self, actor: ActorId) -> bool {
        self.lock().actors.get(&actor).copied().unwrap_or(false)
    }

    fn switch(&self, actor: ActorId, on: bool) -> Result<(), ActuatorError> {
        let mut state = self.lock();
        let slot = state
            .actors
            .get_mut(&actor)
            .ok_or(ActuatorError::UnknownActor(actor))?;
        if *slot != on {
            debug!("SIM | actor {} -> {}", actor, if on { "ON" } else { "OFF" });
        }
        *slot = on;
        Ok(())
    }
}

impl ActuatorPort for SimRig {
    fn turn_on(&self, actor: ActorId) -> Result<(), ActuatorError> {
        self.switch(actor, true)
    }

    fn turn_off(&self, actor: ActorId) -> Result<(), ActuatorError> {
        self.switch(actor, false)
    }
}

impl SensorPort for SimRig {
    fn read_temperature(&self, sensor: SensorId) -> Result<f64, SensorError> {
        let state = self.lock();
        if let Some(kettle) = state.kettles.get(&sensor) {
            Ok(kettle.temp)
        } else if state.loose_sensors.contains(&sensor) {
            Ok(self.model.ambient)
        } else {
            Err(SensorError::UnknownSensor(sensor))
        }
    }
}
