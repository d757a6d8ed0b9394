//! Unified error types for the brewing rig core.
//!
//! One enum per failure domain, each with a hand-written `Display`, and a
//! crate-wide [`Error`] that every subsystem converts into.  None of these
//! are fatal: callers contain them at the step or kettle boundary and
//! report them to the operator.

use core::fmt;

use crate::app::ports::{ActorId, SensorId};
use crate::kettle::KettleId;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A step or kettle references something that is not configured.
    Config(ConfigError),
    /// An auto-mode transition failed.
    Control(ControlError),
    /// An actuator command failed.
    Actuator(ActuatorError),
    /// A sensor could not be read.
    Sensor(SensorError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Control(e) => write!(f, "control: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A step references a kettle id that is not configured.
    UnknownKettle(KettleId),
    /// A required property was left empty.
    MissingProperty(String),
    /// A property value could not be interpreted.
    InvalidProperty { name: String, reason: String },
    /// The recipe names a step type nobody registered.
    UnknownStepKind(String),
    /// A kettle names a control algorithm nobody registered.
    UnknownAlgorithm(String),
    /// A config field failed range or reference validation.
    ValidationFailed(String),
    /// Stored configuration could not be parsed.
    Corrupted(String),
    /// Generic I/O error from the storage backend.
    Io(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKettle(id) => write!(f, "unknown kettle {id}"),
            Self::MissingProperty(name) => write!(f, "property '{name}' is not set"),
            Self::InvalidProperty { name, reason } => {
                write!(f, "property '{name}' is invalid: {reason}")
            }
            Self::UnknownStepKind(kind) => write!(f, "unknown step type '{kind}'"),
            Self::UnknownAlgorithm(name) => write!(f, "unknown control algorithm '{name}'"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::Corrupted(msg) => write!(f, "config corrupted: {msg}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Auto-mode (control loop) errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// No kettle with this id exists.
    UnknownKettle(KettleId),
    /// The control loop could not be constructed, initialised or spawned.
    /// The kettle is left not-running with no instance attached.
    StartFailed { kettle: KettleId, cause: String },
    /// The stop signal could not be delivered.  The kettle is nonetheless
    /// marked not-running.
    StopFailed { kettle: KettleId, cause: String },
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKettle(id) => write!(f, "unknown kettle {id}"),
            Self::StartFailed { kettle, cause } => {
                write!(f, "failed to start auto mode on kettle {kettle}: {cause}")
            }
            Self::StopFailed { kettle, cause } => {
                write!(f, "failed to stop auto mode on kettle {kettle}: {cause}")
            }
        }
    }
}

impl std::error::Error for ControlError {}

impl From<ControlError> for Error {
    fn from(e: ControlError) -> Self {
        Self::Control(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    /// No actor with this id is wired up.
    UnknownActor(ActorId),
    /// The driver rejected or failed the switch command.
    SwitchFailed { actor: ActorId, reason: String },
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownActor(id) => write!(f, "unknown actor {id}"),
            Self::SwitchFailed { actor, reason } => {
                write!(f, "actor {actor} switch failed: {reason}")
            }
        }
    }
}

impl std::error::Error for ActuatorError {}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// No sensor with this id is wired up.
    UnknownSensor(SensorId),
    /// The read timed out or the bus returned an error.
    ReadFailed(SensorId),
    /// Reading is outside the physically plausible range.
    OutOfRange(SensorId),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSensor(id) => write!(f, "unknown sensor {id}"),
            Self::ReadFailed(id) => write!(f, "sensor {id} read failed"),
            Self::OutOfRange(id) => write!(f, "sensor {id} reading out of range"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
