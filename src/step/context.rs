//! What a step can see and do while the runner drives it.
//!
//! A [`StepContext`] is built fresh for every hook call and borrows the
//! rig ports, the supervisor and the activation's own timer/advance
//! flag.  Steps never touch kettle bookkeeping directly: auto mode and
//! setpoints go through the [`Supervisor`].

use std::time::Duration;

use chrono::NaiveDate;
use log::{debug, error, warn};

use crate::app::events::{Notification, Severity};
use crate::app::ports::{ActorId, LogArchive, RigPorts};
use crate::control::{AutoMode, Supervisor};
use crate::error::{ActuatorError, ConfigError, ControlError, Error};
use crate::kettle::KettleId;

use super::timer::StepTimer;

pub struct StepContext<'a> {
    ports: &'a RigPorts,
    supervisor: &'a Supervisor,
    timer: &'a mut StepTimer,
    advance: &'a mut bool,
    position: usize,
    name: &'a str,
}

impl<'a> StepContext<'a> {
    pub(crate) fn new(
        ports: &'a RigPorts,
        supervisor: &'a Supervisor,
        timer: &'a mut StepTimer,
        advance: &'a mut bool,
        position: usize,
        name: &'a str,
    ) -> Self {
        Self {
            ports,
            supervisor,
            timer,
            advance,
            position,
            name,
        }
    }

    /// Name of the active step.
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn position(&self) -> usize {
        self.position
    }

    // ── Advancement ───────────────────────────────────────────

    /// Request advancement to the next step.  Repeated requests within one
    /// activation collapse into a single advance.
    pub fn next(&mut self) {
        if !*self.advance {
            debug!("Step {} '{}' requested advance", self.position, self.name);
        }
        *self.advance = true;
    }

    pub fn advance_requested(&self) -> bool {
        *self.advance
    }

    // ── Operator notifications ────────────────────────────────

    pub fn notify(&self, title: impl Into<String>, body: impl Into<String>, severity: Severity) {
        self.send(Notification::new(title, body, severity));
    }

    pub fn send(&self, notification: Notification) {
        self.ports.notifier.notify(&notification);
    }

    // ── Kettles ───────────────────────────────────────────────

    pub fn set_target_temp(&self, kettle: KettleId, celsius: f64) -> Result<(), ControlError> {
        self.supervisor.set_target_temp(kettle, celsius)
    }

    /// Current reading of the kettle's probe.
    pub fn kettle_temp(&self, kettle: KettleId) -> Result<f64, Error> {
        let sensor = self
            .supervisor
            .kettles()
            .sensor_of(kettle)
            .ok_or(ConfigError::UnknownKettle(kettle))?;
        Ok(self.ports.sensors.read_temperature(sensor)?)
    }

    /// Edge-triggered auto-mode request.  A failed transition is logged
    /// and reported to the operator with severity danger before being
    /// returned.
    pub fn set_auto_mode(&self, kettle: KettleId, mode: AutoMode) -> Result<(), ControlError> {
        self.supervisor.auto_mode(kettle, mode).inspect_err(|e| {
            error!("Step '{}': {}", self.name, e);
            self.send(
                Notification::new(
                    "Error",
                    format!("Failed to set Auto mode {}", mode.as_str()),
                    Severity::Danger,
                )
                .sticky(),
            );
        })
    }

    // ── Actors ────────────────────────────────────────────────

    pub fn actor_on(&self, actor: ActorId) -> Result<(), ActuatorError> {
        self.ports.actuators.turn_on(actor)
    }

    pub fn actor_off(&self, actor: ActorId) -> Result<(), ActuatorError> {
        self.ports.actuators.turn_off(actor)
    }

    /// Switch every actor on.  Each call is attempted; failures are logged
    /// and returned together.
    pub fn actors_on(&self, actors: &[ActorId]) -> Vec<ActuatorError> {
        self.fan_out(actors, "on", |a| self.actor_on(a))
    }

    /// Switch every actor off.  A failure on one actor never skips the
    /// rest.
    pub fn actors_off(&self, actors: &[ActorId]) -> Vec<ActuatorError> {
        self.fan_out(actors, "off", |a| self.actor_off(a))
    }

    fn fan_out(
        &self,
        actors: &[ActorId],
        what: &str,
        switch: impl Fn(ActorId) -> Result<(), ActuatorError>,
    ) -> Vec<ActuatorError> {
        let failures: Vec<_> = actors.iter().filter_map(|&a| switch(a).err()).collect();
        for e in &failures {
            warn!("Step '{}': actor {} failed: {}", self.name, what, e);
        }
        failures
    }

    // ── Timer ─────────────────────────────────────────────────

    /// Arm the step timer.  Ignored when already running.
    pub fn start_timer(&mut self, duration: Duration) {
        let now = self.now();
        if self.timer.arm(now, duration) {
            debug!("Step '{}' timer armed for {:?}", self.name, duration);
        }
    }

    /// `None` before the timer is armed, then whether it has elapsed.
    pub fn is_timer_finished(&self) -> Option<bool> {
        self.timer.is_finished(self.now())
    }

    // ── Environment ───────────────────────────────────────────

    /// Monotonic rig time.
    pub fn now(&self) -> Duration {
        self.ports.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.ports.clock.today()
    }

    /// Global configuration parameter, e.g. `brew_name`.
    pub fn parameter(&self, key: &str) -> Option<String> {
        self.ports.properties.parameter(key)
    }

    pub fn logs(&self) -> &dyn LogArchive {
        self.ports.logs.as_ref()
    }
}
