//! Recipe runner: the step scheduler.
//!
//! Drives one step at a time through its lifecycle on the caller's
//! thread.  Each call ([`start`](RecipeRunner::start),
//! [`tick`](RecipeRunner::tick), [`next`](RecipeRunner::next), ...) runs
//! the relevant hook and then *settles*: while the active step has
//! requested advancement, its `finish` runs, it is dropped, and the
//! following step is entered.  A chain of steps that all complete inside
//! `init` is therefore walked within a single call.
//!
//! The runner never blocks on a control loop; auto-mode requests go to
//! the [`Supervisor`] and return immediately.

use log::{info, warn};

use crate::app::events::{Notification, RigEvent, Severity, StepStatus};
use crate::app::ports::RigPorts;
use crate::control::Supervisor;

use super::context::StepContext;
use super::registry::StepRegistry;
use super::timer::StepTimer;
use super::{Step, StepPhase};

/// Name and kind of one recipe position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeEntry {
    pub name: String,
    pub kind: String,
}

/// Runtime state of the step at the recipe pointer.  Discarded on
/// advance.
struct Activation {
    position: usize,
    name: String,
    /// `None` while blocked on a construction error.
    step: Option<Box<dyn Step>>,
    phase: StepPhase,
    timer: StepTimer,
    advance: bool,
}

impl Activation {
    /// Run one hook with a fresh context.  No-op for a blocked step.
    fn call(
        &mut self,
        ports: &RigPorts,
        supervisor: &Supervisor,
        hook: impl FnOnce(&mut dyn Step, &mut StepContext<'_>),
    ) {
        let Some(step) = self.step.as_mut() else {
            return;
        };
        let mut ctx = StepContext::new(
            ports,
            supervisor,
            &mut self.timer,
            &mut self.advance,
            self.position,
            &self.name,
        );
        hook(step.as_mut(), &mut ctx);
    }
}

pub struct RecipeRunner {
    recipe: Vec<RecipeEntry>,
    registry: StepRegistry,
    ports: RigPorts,
    supervisor: Supervisor,
    active: Option<Activation>,
    finished: bool,
}

impl RecipeRunner {
    pub fn new(
        recipe: Vec<RecipeEntry>,
        registry: StepRegistry,
        ports: RigPorts,
        supervisor: Supervisor,
    ) -> Self {
        Self {
            recipe,
            registry,
            ports,
            supervisor,
            active: None,
            finished: false,
        }
    }

    // ── Operator / service entry points ───────────────────────

    /// Enter the first step.  Ignored while a recipe is in progress.
    pub fn start(&mut self) {
        if self.active.is_some() {
            warn!("Recipe already running");
            return;
        }
        self.finished = false;
        info!("Recipe started ({} steps)", self.recipe.len());
        self.enter(0);
        self.settle();
    }

    /// One scheduler tick: run the active step's `execute`.
    pub fn tick(&mut self) {
        let Some(act) = self.active.as_mut() else {
            return;
        };
        match act.phase {
            StepPhase::Initialized | StepPhase::Executing => {
                act.phase = StepPhase::Executing;
                act.call(&self.ports, &self.supervisor, |step, ctx| step.execute(ctx));
            }
            _ => {}
        }
        self.settle();
    }

    /// Operator-requested advance.  Skips a blocked step.
    pub fn next(&mut self) {
        let Some(act) = self.active.as_mut() else {
            warn!("Next requested with no active step");
            return;
        };
        info!("Operator advanced step {} '{}'", act.position, act.name);
        act.advance = true;
        self.settle();
    }

    /// Re-apply the active step's setup.  A blocked step is rebuilt from
    /// its properties.
    pub fn reset_step(&mut self) {
        let Some(act) = self.active.as_mut() else {
            return;
        };
        let phase = act.phase;
        match phase {
            StepPhase::Blocked => {
                let position = act.position;
                info!("Retrying blocked step {}", position);
                self.active = None;
                self.enter(position);
            }
            StepPhase::Initialized | StepPhase::Executing => {
                act.call(&self.ports, &self.supervisor, |step, ctx| step.reset(ctx));
            }
            _ => {}
        }
        self.settle();
    }

    /// Tear down the active step and go idle.
    pub fn stop(&mut self) {
        let Some(mut act) = self.active.take() else {
            return;
        };
        if !matches!(act.phase, StepPhase::Blocked) {
            act.call(&self.ports, &self.supervisor, |step, ctx| step.finish(ctx));
        }
        info!("Recipe stopped at step {} '{}'", act.position, act.name);
        self.ports.events.emit(&RigEvent::RecipeStopped {
            position: act.position,
        });
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> Option<StepStatus> {
        self.active.as_ref().map(|act| StepStatus {
            position: act.position,
            name: act.name.clone(),
            phase: act.phase,
            timer: act.timer.state(self.ports.clock.now()),
        })
    }

    pub fn position(&self) -> Option<usize> {
        self.active.as_ref().map(|act| act.position)
    }

    /// `true` once the pointer moved past the last step.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn recipe(&self) -> &[RecipeEntry] {
        &self.recipe
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Construct and initialise the step at `position`, or finish the
    /// recipe when the pointer ran off the end.
    fn enter(&mut self, position: usize) {
        let Some(entry) = self.recipe.get(position) else {
            self.finished = true;
            info!("Recipe finished");
            self.ports.events.emit(&RigEvent::RecipeFinished);
            return;
        };

        let built = self
            .ports
            .properties
            .step_properties(position)
            .and_then(|props| self.registry.construct(&entry.kind, &props));

        let mut act = Activation {
            position,
            name: entry.name.clone(),
            step: None,
            phase: StepPhase::Created,
            timer: StepTimer::new(),
            advance: false,
        };

        match built {
            Ok(step) => {
                act.step = Some(step);
                self.ports.events.emit(&RigEvent::StepStarted {
                    position,
                    name: act.name.clone(),
                });
                act.call(&self.ports, &self.supervisor, |step, ctx| step.init(ctx));
                act.phase = StepPhase::Initialized;
            }
            Err(e) => {
                warn!("Step {} '{}' blocked: {}", position, act.name, e);
                act.phase = StepPhase::Blocked;
                self.ports.notifier.notify(
                    &Notification::new(
                        "Step configuration error",
                        format!("{}: {}", act.name, e),
                        Severity::Danger,
                    )
                    .sticky(),
                );
                self.ports.events.emit(&RigEvent::StepBlocked {
                    position,
                    name: act.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
        self.active = Some(act);
    }

    /// Consume pending advance requests until the active step stays put.
    fn settle(&mut self) {
        loop {
            if !self.active.as_ref().is_some_and(|act| act.advance) {
                return;
            }
            let Some(mut act) = self.active.take() else {
                return;
            };

            if act.step.is_some() {
                act.call(&self.ports, &self.supervisor, |step, ctx| step.finish(ctx));
                self.ports.events.emit(&RigEvent::StepFinished {
                    position: act.position,
                    name: act.name.clone(),
                });
            } else {
                info!("Skipped blocked step {} '{}'", act.position, act.name);
            }

            // The activation is gone, later requests from it cannot reach
            // the runner.
            let next = act.position + 1;
            drop(act);
            self.enter(next);
        }
    }
}
