//! Recipe steps and the step scheduler.
//!
//! ```text
//!   Created ──init──▶ Initialized ──execute──▶ Executing ─┐
//!      │                   │                      ▲  │      │ execute (every tick)
//!      │ (bad config)      │ next()               └──┘      │
//!      ▼                   ▼                                │ next()
//!   Blocked          finish, StepFinished ◀─────────────────┘
//!      │ operator next()   │
//!      ▼                   ▼
//!   (skip) ──────────▶ next position
//! ```
//!
//! Finishing and advancing happen inside a single scheduler call, so the
//! phase reported by [`runner::RecipeRunner::status`] is always
//! `Initialized`, `Executing` or `Blocked`.  Completion is observed
//! through the `StepFinished` event instead.
//!
//! A step signals completion by calling [`StepContext::next`], never by a
//! return value.  The [`runner::RecipeRunner`] consumes that request once
//! per activation, runs `finish`, then enters the following step (whose
//! `init` may itself request advancement; the runner keeps settling
//! until a step stays put).

pub mod context;
pub mod kinds;
pub mod properties;
pub mod registry;
pub mod runner;
pub mod timer;

pub use context::StepContext;
pub use registry::{StepKind, StepRegistry};
pub use runner::{RecipeEntry, RecipeRunner};
pub use timer::{StepTimer, TimerState};

/// Lifecycle phase of the active step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    Created,
    Initialized,
    Executing,
    /// Construction failed; waiting for the operator to skip it.
    Blocked,
}

impl StepPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Initialized => "initialized",
            Self::Executing => "executing",
            Self::Blocked => "blocked",
        }
    }
}

/// Behaviour of one step kind.  All hooks default to doing nothing.
///
/// - `init` runs exactly once per activation.
/// - `execute` runs once per scheduler tick until advancement.
/// - `finish` runs exactly once, after advancement was requested.
/// - `reset` re-applies setup after a rewind without repeating one-time
///   side effects (a running timer is left alone).
pub trait Step: Send {
    fn init(&mut self, _ctx: &mut StepContext<'_>) {}

    fn execute(&mut self, _ctx: &mut StepContext<'_>) {}

    fn finish(&mut self, _ctx: &mut StepContext<'_>) {}

    fn reset(&mut self, _ctx: &mut StepContext<'_>) {}
}
