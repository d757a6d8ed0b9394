//! Outbound events and operator notifications.
//!
//! The core emits [`RigEvent`]s through the
//! [`EventSink`](super::ports::EventSink) port and [`Notification`]s
//! through the [`Notifier`](super::ports::Notifier) port.  Adapters on the
//! other side decide what to do with them.

use std::time::Duration;

use crate::kettle::KettleSnapshot;
use crate::step::StepPhase;
use crate::step::timer::TimerState;

/// Structured events emitted by the scheduler and the supervisor.
#[derive(Debug, Clone, PartialEq)]
pub enum RigEvent {
    /// A kettle's auto-mode flag, instance or setpoint changed.
    KettleUpdated(KettleSnapshot),

    /// The recipe pointer reached a step and its `init` is about to run.
    StepStarted { position: usize, name: String },

    /// A step ran its teardown and the pointer moved past it.
    StepFinished { position: usize, name: String },

    /// A step could not be constructed; the recipe waits at this position
    /// until the operator skips it.
    StepBlocked {
        position: usize,
        name: String,
        reason: String,
    },

    /// The pointer moved past the last step.
    RecipeFinished,

    /// The operator stopped the recipe mid-way.
    RecipeStopped { position: usize },
}

/// Severity of an operator notification.  Mirrors the four styles the
/// brewing UI can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Danger,
}

impl Severity {
    pub const NAMES: [&'static str; 4] = ["success", "info", "warning", "danger"];

    /// Parse a UI style name.  Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "success" => Some(Self::Success),
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "danger" => Some(Self::Danger),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

/// A fire-and-forget message for the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub severity: Severity,
    /// How long the UI should show it; `None` keeps it until dismissed.
    pub timeout: Option<Duration>,
}

impl Notification {
    /// Default display time for informational messages.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(title: impl Into<String>, body: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            severity,
            timeout: Some(Self::DEFAULT_TIMEOUT),
        }
    }

    /// Keep the notification on screen until the operator dismisses it.
    #[must_use]
    pub fn sticky(mut self) -> Self {
        self.timeout = None;
        self
    }
}

/// Point-in-time view of the active step, for telemetry.
#[derive(Debug, Clone, PartialEq)]
pub struct StepStatus {
    pub position: usize,
    pub name: String,
    pub phase: StepPhase,
    pub timer: TimerState,
}

/// Telemetry snapshot of the whole rig.
#[derive(Debug, Clone, PartialEq)]
pub struct Telemetry {
    pub step: Option<StepStatus>,
    pub kettles: Vec<KettleSnapshot>,
    pub finished: bool,
}
