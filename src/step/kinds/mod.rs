//! Bundled step kinds.

pub mod actor_timer;
pub mod chill;
pub mod logs;
pub mod manual;
pub mod target;

use log::error;

use crate::app::events::{Notification, Severity};
use crate::app::ports::ActorId;
use crate::error::ConfigError;

use super::context::StepContext;
use super::properties::StepProperties;
use super::registry::StepKind;

/// Most actors a single step may drive.
pub const MAX_STEP_ACTORS: usize = 2;

/// Actors a step turns on in `init` and off in `finish`.
pub type ActorSet = heapless::Vec<ActorId, MAX_STEP_ACTORS>;

pub(super) fn builtins() -> [StepKind; 6] {
    [
        manual::KIND,
        target::KIND,
        actor_timer::KIND,
        chill::KIND,
        logs::CLEAR_KIND,
        logs::SAVE_KIND,
    ]
}

/// Collect the optional actor references stored under `keys`.
fn actor_set(props: &StepProperties, keys: &[&str]) -> Result<ActorSet, ConfigError> {
    let mut set = ActorSet::new();
    for key in keys {
        if let Some(actor) = props.actor(key)? {
            set.push(actor).map_err(|_| ConfigError::InvalidProperty {
                name: (*key).to_string(),
                reason: format!("a step drives at most {MAX_STEP_ACTORS} actors"),
            })?;
        }
    }
    Ok(set)
}

/// The step references no kettle; it stays put until reconfigured or
/// skipped.
fn report_missing_kettle(ctx: &StepContext<'_>) {
    error!("Step '{}' has no kettle configured", ctx.name());
    ctx.send(
        Notification::new(
            "No kettle defined",
            format!("Step '{}' is waiting for a kettle", ctx.name()),
            Severity::Danger,
        )
        .sticky(),
    );
}

fn report_kettle_error(ctx: &StepContext<'_>, err: &dyn core::fmt::Display) {
    error!("Step '{}': {}", ctx.name(), err);
    ctx.send(Notification::new("Kettle error", err.to_string(), Severity::Danger).sticky());
}
