//! Controller supervisor.
//!
//! Owns at most one live control-loop task per kettle and is the only
//! writer of a kettle's `running` flag and instance reference.
//!
//! ## Lifecycle of one auto-mode activation
//!
//! 1. `start` (OFF → ON edge only) resolves the kettle's algorithm,
//!    constructs and initialises the loop, spawns it on a named thread,
//!    stores the handle and flips `running`.  Any failure along the way
//!    leaves `running == false` and no handle behind.
//! 2. The loop runs on its own cadence, reading the setpoint lock-free.
//! 3. `stop` (ON → OFF edge only) sends the stop request, drops the handle
//!    and clears `running`.  It does not wait: the thread finishes its
//!    current iteration and exits detached.
//! 4. If the loop returns or panics by itself, its thread wrapper retires
//!    the kettle through the same lock, switches the heater off when the
//!    exit was abnormal, and tells the operator.
//!
//! Every transition holds the registry lock from the edge check to the
//! bookkeeping write, so concurrent start/start or start/stop requests on
//! one kettle are serialized and only one of them can act.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;

use log::{debug, error, info, warn};

use crate::app::events::{Notification, RigEvent, Severity};
use crate::app::ports::{ActorId, ActuatorPort, EventSink, Notifier, RigPorts, SensorPort};
use crate::drivers::task::spawn_named;
use crate::error::{ConfigError, ControlError};
use crate::kettle::{Kettle, KettleId, KettleRegistry, KettleSnapshot};

use super::stop::{StopSignal, stop_channel};
use super::{AutoMode, ControlLoopConfig, ControllerRegistry};

/// Bookkeeping for one spawned control loop.
pub(crate) struct ControlHandle {
    signal: StopSignal,
    generation: u64,
    algorithm: String,
    /// Dropped (detached) on stop; never joined.
    _thread: JoinHandle<()>,
}

impl ControlHandle {
    fn request_stop(self) -> Result<(), &'static str> {
        debug!(
            "Signalling '{}' loop (generation {}) to stop",
            self.algorithm, self.generation
        );
        self.signal.send()
    }
}

/// Cloneable handle to the supervisor shared by the scheduler and the
/// control-loop threads.
#[derive(Clone)]
pub struct Supervisor {
    shared: Arc<Shared>,
}

struct Shared {
    kettles: Arc<KettleRegistry>,
    controllers: ControllerRegistry,
    actuators: Arc<dyn ActuatorPort>,
    sensors: Arc<dyn SensorPort>,
    events: Arc<dyn EventSink>,
    notifier: Arc<dyn Notifier>,
    stack_kb: usize,
}

impl Supervisor {
    /// Build the supervisor and validate every kettle's algorithm name and
    /// parameters against `controllers`.
    pub fn new(
        kettles: Arc<KettleRegistry>,
        controllers: ControllerRegistry,
        ports: &RigPorts,
        stack_kb: usize,
    ) -> Result<Self, ConfigError> {
        for kettle in kettles.lock().values() {
            if let Some(logic) = &kettle.logic {
                controllers.validate(logic, &kettle.logic_params)?;
            }
        }

        Ok(Self {
            shared: Arc::new(Shared {
                kettles,
                controllers,
                actuators: Arc::clone(&ports.actuators),
                sensors: Arc::clone(&ports.sensors),
                events: Arc::clone(&ports.events),
                notifier: Arc::clone(&ports.notifier),
                stack_kb,
            }),
        })
    }

    pub fn kettles(&self) -> &Arc<KettleRegistry> {
        &self.shared.kettles
    }

    // ── Auto-mode transitions ─────────────────────────────────

    /// Turn auto mode on.  A no-op when the kettle is already running.
    ///
    /// A kettle without a configured algorithm is marked running with no
    /// task attached.
    pub fn start(&self, id: KettleId) -> Result<(), ControlError> {
        let snapshot = {
            let mut kettles = self.shared.kettles.lock();
            let kettle = kettles
                .get_mut(&id)
                .ok_or(ControlError::UnknownKettle(id))?;
            if kettle.running {
                debug!("Kettle {} auto mode already on", id);
                return Ok(());
            }

            if let Some(logic) = kettle.logic.clone() {
                let handle = Shared::launch(&self.shared, kettle, &logic).map_err(|cause| {
                    warn!("Kettle {} auto mode start failed: {}", id, cause);
                    ControlError::StartFailed { kettle: id, cause }
                })?;
                kettle.instance = Some(handle);
                info!("Kettle {} auto mode ON ({})", id, logic);
            } else {
                info!("Kettle {} auto mode ON (no control algorithm)", id);
            }
            kettle.running = true;
            kettle.snapshot()
        };

        self.shared.events.emit(&RigEvent::KettleUpdated(snapshot));
        Ok(())
    }

    /// Turn auto mode off.  A no-op when the kettle is not running.
    ///
    /// The loop is asked to stop and left to finish detached; the heater
    /// is not guaranteed idle when this returns.  If the request cannot
    /// be delivered the kettle is still marked not-running and
    /// [`ControlError::StopFailed`] is returned.
    ///
    /// The supervisor clears a kettle's handle before the loop's stop
    /// token is dropped, so delivery only fails for a loop that released
    /// its token while still running.
    pub fn stop(&self, id: KettleId) -> Result<(), ControlError> {
        let (snapshot, delivered) = {
            let mut kettles = self.shared.kettles.lock();
            let kettle = kettles
                .get_mut(&id)
                .ok_or(ControlError::UnknownKettle(id))?;
            if !kettle.running {
                debug!("Kettle {} auto mode already off", id);
                return Ok(());
            }

            let delivered = match kettle.instance.take() {
                Some(handle) => handle.request_stop(),
                None => Ok(()),
            };
            kettle.running = false;
            info!("Kettle {} auto mode OFF", id);
            (kettle.snapshot(), delivered)
        };

        self.shared.events.emit(&RigEvent::KettleUpdated(snapshot));

        delivered.map_err(|cause| {
            let err = ControlError::StopFailed {
                kettle: id,
                cause: cause.to_string(),
            };
            warn!("{}; task left to finish detached", err);
            err
        })
    }

    /// Edge-triggered auto-mode request, as issued by steps and the
    /// operator.  `On` only acts on OFF → ON, `Off` only on ON → OFF.
    pub fn auto_mode(&self, id: KettleId, desired: AutoMode) -> Result<(), ControlError> {
        match desired {
            AutoMode::On => self.start(id),
            AutoMode::Off => self.stop(id),
            AutoMode::NoChange => Ok(()),
        }
    }

    /// Stop every running kettle.  Failures are collected, not fatal.
    pub fn shutdown(&self) -> Vec<ControlError> {
        self.shared
            .kettles
            .ids()
            .into_iter()
            .filter_map(|id| self.stop(id).err())
            .collect()
    }

    // ── Setpoint ──────────────────────────────────────────────

    pub fn set_target_temp(&self, id: KettleId, celsius: f64) -> Result<(), ControlError> {
        let snapshot = {
            let mut kettles = self.shared.kettles.lock();
            let kettle = kettles
                .get_mut(&id)
                .ok_or(ControlError::UnknownKettle(id))?;
            kettle.set_target_temp(celsius);
            kettle.snapshot()
        };
        debug!("Kettle {} target -> {:.1}", id, celsius);
        self.shared.events.emit(&RigEvent::KettleUpdated(snapshot));
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_running(&self, id: KettleId) -> bool {
        self.shared
            .kettles
            .lock()
            .get(&id)
            .is_some_and(Kettle::is_running)
    }

    pub fn snapshot(&self, id: KettleId) -> Option<KettleSnapshot> {
        self.shared.kettles.snapshot(id)
    }

    pub fn snapshots(&self) -> Vec<KettleSnapshot> {
        self.shared.kettles.snapshots()
    }
}

impl Shared {
    /// Build, initialise and spawn the kettle's control loop.
    /// Runs with the registry lock held.
    fn launch(this: &Arc<Self>, kettle: &mut Kettle, logic: &str) -> Result<ControlHandle, String> {
        let factory = this
            .controllers
            .get(logic)
            .ok_or_else(|| format!("unknown control algorithm '{logic}'"))?;

        let (signal, token) = stop_channel();
        let config = ControlLoopConfig {
            kettle: kettle.id,
            heater: kettle.heater,
            sensor: kettle.sensor,
            setpoint: kettle.setpoint(),
            params: kettle.logic_params.clone(),
            actuators: Arc::clone(&this.actuators),
            sensors: Arc::clone(&this.sensors),
            stop: token,
        };

        let mut instance = factory.construct(config).map_err(|e| format!("{e:#}"))?;
        instance.init().map_err(|e| format!("{e:#}"))?;

        let id = kettle.id;
        let heater = kettle.heater;
        let generation = kettle.generation + 1;
        let shared = Arc::clone(this);
        let thread = spawn_named(format!("kettle-{id}-{logic}"), this.stack_kb, move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| instance.run()));
            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(format!("{e:#}")),
                Err(payload) => Some(panic_message(payload.as_ref())),
            };
            shared.retire(id, heater, generation, failure);
        })
        .map_err(|e| format!("could not spawn control task: {e}"))?;

        kettle.generation = generation;
        Ok(ControlHandle {
            signal,
            generation,
            algorithm: logic.to_string(),
            _thread: thread,
        })
    }

    /// Called from the loop's own thread once `run` has returned.
    fn retire(&self, id: KettleId, heater: ActorId, generation: u64, failure: Option<String>) {
        if failure.is_some() {
            // The loop may have died with the element energised.
            if let Err(e) = self.actuators.turn_off(heater) {
                error!("Kettle {} heater {} could not be switched off: {}", id, heater, e);
            }
        }

        let snapshot = {
            let mut kettles = self.kettles.lock();
            kettles.get_mut(&id).and_then(|kettle| {
                let current = kettle
                    .instance
                    .as_ref()
                    .is_some_and(|h| h.generation == generation);
                if !current {
                    return None;
                }
                kettle.instance = None;
                kettle.running = false;
                Some(kettle.snapshot())
            })
        };

        match (&failure, snapshot.is_some()) {
            (Some(reason), _) => {
                error!("Kettle {} control loop failed: {}", id, reason);
                self.notifier.notify(
                    &Notification::new(
                        "Auto mode stopped",
                        format!("Kettle {id} control loop failed: {reason}"),
                        Severity::Danger,
                    )
                    .sticky(),
                );
            }
            (None, true) => info!("Kettle {} control loop finished on its own", id),
            (None, false) => debug!("Kettle {} control loop exited after stop", id),
        }

        if let Some(snapshot) = snapshot {
            self.events.emit(&RigEvent::KettleUpdated(snapshot));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}
