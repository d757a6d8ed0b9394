//! Mock rig adapters for integration tests.
//!
//! Record every actuator call, notification and event so tests can
//! assert on the full history without real hardware, and script probe
//! readings and the clock so step predicates are deterministic.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use brewrig::app::events::{Notification, RigEvent, Severity};
use brewrig::app::ports::{
    ActorId, ActuatorPort, Clock, EventSink, LogArchive, Notifier, RigPorts, SensorId, SensorPort,
};
use brewrig::app::service::BrewService;
use brewrig::config::{ActorConfig, KettleConfig, RecipeStep, RigConfig, SensorConfig};
use brewrig::control::{
    AlgorithmParams, ControlLoop, ControlLoopConfig, ControlLoopFactory, ControllerRegistry,
};
use brewrig::error::{ActuatorError, ConfigError, SensorError};
use brewrig::kettle::KettleId;
use brewrig::step::StepRegistry;
use brewrig::step::kinds::logs::is_device_log;
use brewrig::step::properties::StepProperties;

// ── Well-known rig layout ─────────────────────────────────────

pub const KETTLE: KettleId = KettleId(1);
pub const HEATER: ActorId = ActorId(1);
pub const PUMP: ActorId = ActorId(2);
pub const VALVE: ActorId = ActorId(3);
pub const PROBE: SensorId = SensorId(1);

// ── Actuators ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    On(ActorId),
    Off(ActorId),
}

#[derive(Default)]
pub struct RecordingActuators {
    calls: Mutex<Vec<ActuatorCall>>,
    failing: Mutex<BTreeSet<ActorId>>,
    off_delay: Mutex<Duration>,
}

impl RecordingActuators {
    /// Make every call on `actor` fail (the call is still recorded).
    pub fn fail(&self, actor: ActorId) {
        self.failing.lock().unwrap().insert(actor);
    }

    /// Make every `turn_off` take `delay` before it lands (a slow relay).
    pub fn slow_off(&self, delay: Duration) {
        *self.off_delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<ActuatorCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn is_on(&self, actor: ActorId) -> bool {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|c| match *c {
                ActuatorCall::On(a) if a == actor => Some(true),
                ActuatorCall::Off(a) if a == actor => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    fn record(&self, call: ActuatorCall, actor: ActorId) -> Result<(), ActuatorError> {
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(&actor) {
            Err(ActuatorError::SwitchFailed {
                actor,
                reason: "relay stuck".into(),
            })
        } else {
            Ok(())
        }
    }
}

impl ActuatorPort for RecordingActuators {
    fn turn_on(&self, actor: ActorId) -> Result<(), ActuatorError> {
        self.record(ActuatorCall::On(actor), actor)
    }

    fn turn_off(&self, actor: ActorId) -> Result<(), ActuatorError> {
        let delay = *self.off_delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        self.record(ActuatorCall::Off(actor), actor)
    }
}

// ── Sensors ───────────────────────────────────────────────────

/// Each read pops the next scripted value; the last one repeats.
#[derive(Default)]
pub struct ScriptedSensors {
    readings: Mutex<BTreeMap<SensorId, VecDeque<Option<f64>>>>,
}

impl ScriptedSensors {
    pub fn script(&self, sensor: SensorId, values: &[f64]) {
        self.readings
            .lock()
            .unwrap()
            .insert(sensor, values.iter().copied().map(Some).collect());
    }

    /// Script with failures: `None` entries yield a read error.
    pub fn script_raw(&self, sensor: SensorId, values: &[Option<f64>]) {
        self.readings
            .lock()
            .unwrap()
            .insert(sensor, values.iter().copied().collect());
    }
}

impl SensorPort for ScriptedSensors {
    fn read_temperature(&self, sensor: SensorId) -> Result<f64, SensorError> {
        let mut readings = self.readings.lock().unwrap();
        let queue = readings
            .get_mut(&sensor)
            .ok_or(SensorError::UnknownSensor(sensor))?;
        let value = if queue.len() > 1 {
            queue.pop_front().flatten()
        } else {
            queue.front().copied().flatten()
        };
        value.ok_or(SensorError::ReadFailed(sensor))
    }
}

// ── Notifier / events ─────────────────────────────────────────

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.all().into_iter().map(|n| n.title).collect()
    }

    pub fn with_severity(&self, severity: Severity) -> Vec<Notification> {
        self.all()
            .into_iter()
            .filter(|n| n.severity == severity)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.sent.lock().unwrap().push(notification.clone());
    }
}

#[derive(Default)]
pub struct RecordingEvents {
    pub events: Mutex<Vec<RigEvent>>,
}

impl RecordingEvents {
    pub fn all(&self) -> Vec<RigEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&RigEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }

    pub fn finished_steps(&self) -> Vec<usize> {
        self.all()
            .into_iter()
            .filter_map(|e| match e {
                RigEvent::StepFinished { position, .. } => Some(position),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingEvents {
    fn emit(&self, event: &RigEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── Clock ─────────────────────────────────────────────────────

pub struct ManualClock {
    now: Mutex<Duration>,
    today: NaiveDate,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(Duration::ZERO),
            today: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}

// ── Log archive ───────────────────────────────────────────────

/// In-memory log directory.
#[derive(Default)]
pub struct MemLogArchive {
    pub files: Mutex<BTreeSet<String>>,
    pub broken: Mutex<bool>,
}

impl MemLogArchive {
    pub fn with_files(names: &[&str]) -> Self {
        Self {
            files: Mutex::new(names.iter().map(|s| (*s).to_string()).collect()),
            broken: Mutex::new(false),
        }
    }

    pub fn files(&self) -> Vec<String> {
        self.files.lock().unwrap().iter().cloned().collect()
    }

    fn check(&self) -> io::Result<()> {
        if *self.broken.lock().unwrap() {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        } else {
            Ok(())
        }
    }
}

impl LogArchive for MemLogArchive {
    fn clear_logs(&self) -> io::Result<usize> {
        self.check()?;
        let mut files = self.files.lock().unwrap();
        let before = files.len();
        files.retain(|f| !is_device_log(f));
        Ok(before - files.len())
    }

    fn archive_logs(&self, brew_name: &str) -> io::Result<usize> {
        self.check()?;
        let mut files = self.files.lock().unwrap();
        let copies: Vec<_> = files
            .iter()
            .filter(|f| is_device_log(f))
            .map(|f| format!("{brew_name}-=-{f}"))
            .collect();
        let n = copies.len();
        files.extend(copies);
        Ok(n)
    }
}

// ── Scripted control loop ─────────────────────────────────────

/// Factory for a loop that idles until stopped, counting constructions
/// and exits.
#[derive(Default)]
pub struct CountingFactory {
    pub constructed: Arc<AtomicUsize>,
    pub exited: Arc<AtomicUsize>,
}

struct IdleLoop {
    config: ControlLoopConfig,
    exited: Arc<AtomicUsize>,
}

impl ControlLoop for IdleLoop {
    fn run(&mut self) -> anyhow::Result<()> {
        while !self.config.stop.wait(Duration::from_millis(2)) {}
        self.exited.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl ControlLoopFactory for CountingFactory {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn validate(&self, _params: &AlgorithmParams) -> Result<(), ConfigError> {
        Ok(())
    }

    fn construct(&self, config: ControlLoopConfig) -> anyhow::Result<Box<dyn ControlLoop>> {
        self.constructed.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(IdleLoop {
            config,
            exited: Arc::clone(&self.exited),
        }))
    }
}

/// Factory whose construction always fails.
pub struct BrokenFactory;

impl ControlLoopFactory for BrokenFactory {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn validate(&self, _params: &AlgorithmParams) -> Result<(), ConfigError> {
        Ok(())
    }

    fn construct(&self, _config: ControlLoopConfig) -> anyhow::Result<Box<dyn ControlLoop>> {
        anyhow::bail!("element not detected")
    }
}

// ── Fixture ───────────────────────────────────────────────────

#[derive(Default)]
pub struct Rig {
    pub actuators: Arc<RecordingActuators>,
    pub sensors: Arc<ScriptedSensors>,
    pub notifier: Arc<RecordingNotifier>,
    pub events: Arc<RecordingEvents>,
    pub clock: Arc<ManualClock>,
    pub logs: Arc<MemLogArchive>,
}

impl Rig {
    pub fn new() -> Self {
        let rig = Self::default();
        rig.sensors.script(PROBE, &[20.0]);
        rig
    }

    pub fn with_logs(logs: MemLogArchive) -> Self {
        let mut rig = Self::new();
        rig.logs = Arc::new(logs);
        rig
    }

    pub fn ports(&self, config: &RigConfig) -> RigPorts {
        RigPorts {
            actuators: self.actuators.clone(),
            sensors: self.sensors.clone(),
            notifier: self.notifier.clone(),
            events: self.events.clone(),
            clock: self.clock.clone(),
            properties: Arc::new(config.clone()),
            logs: self.logs.clone(),
        }
    }

    pub fn service(&self, config: &RigConfig) -> BrewService {
        self.service_with(config, controllers())
    }

    pub fn service_with(&self, config: &RigConfig, controllers: ControllerRegistry) -> BrewService {
        BrewService::new(
            config,
            self.ports(config),
            controllers,
            StepRegistry::with_builtins(),
        )
        .expect("valid test config")
    }

    /// Advance the clock by `secs` and run one tick.
    pub fn tick(&self, service: &mut BrewService, secs: u64) {
        self.clock.advance(Duration::from_secs(secs));
        service.tick();
    }
}

/// Built-in algorithms plus the `broken` test factory.
pub fn controllers() -> ControllerRegistry {
    let mut reg = ControllerRegistry::with_builtins();
    reg.register(Box::new(BrokenFactory));
    reg
}

/// One heater kettle, a pump and a valve, and the given recipe.
pub fn config(logic: Option<&str>, recipe: Vec<RecipeStep>) -> RigConfig {
    RigConfig {
        parameters: BTreeMap::from([("brew_name".to_string(), "Pale Ale #3".to_string())]),
        actors: vec![
            actor(HEATER, "Heater"),
            actor(PUMP, "Pump"),
            actor(VALVE, "Valve"),
        ],
        sensors: vec![SensorConfig {
            id: PROBE,
            name: "Kettle probe".into(),
        }],
        kettles: vec![KettleConfig {
            id: KETTLE,
            name: "Boil kettle".into(),
            heater: HEATER,
            sensor: PROBE,
            logic: logic.map(str::to_string),
            logic_params: AlgorithmParams::new(),
            target_temp: 20.0,
        }],
        recipe,
        ..RigConfig::default()
    }
}

fn actor(id: ActorId, name: &str) -> ActorConfig {
    ActorConfig {
        id,
        name: name.into(),
    }
}

pub fn step(name: &str, kind: &str, properties: StepProperties) -> RecipeStep {
    RecipeStep {
        name: name.into(),
        kind: kind.into(),
        properties,
    }
}

/// Poll `cond` until it holds or five seconds pass.
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    false
}
