//! Run up to two actors for a fixed number of minutes.

use std::time::Duration;

use crate::app::events::{Notification, Severity};
use crate::error::ConfigError;
use crate::step::context::StepContext;
use crate::step::properties::{PropertyDef, PropertyKind, StepProperties};
use crate::step::registry::StepKind;
use crate::step::Step;

use super::{ActorSet, actor_set};

/// Upper bound on the timer, one week.
const MAX_MINUTES: f64 = 7.0 * 24.0 * 60.0;

const PROPERTIES: &[PropertyDef] = &[
    PropertyDef::new("actor1", "Actor 1", PropertyKind::Actor),
    PropertyDef::new("actor2", "Actor 2", PropertyKind::Actor),
    PropertyDef::new("timer", "Timer in Minutes", PropertyKind::Number)
        .describe("Timer is started immediately."),
];

pub const KIND: StepKind = StepKind {
    id: "actor_timer",
    name: "Actor timer",
    properties: PROPERTIES,
    construct,
};

pub struct ActorTimerStep {
    actors: ActorSet,
    duration: Duration,
}

fn construct(props: &StepProperties) -> Result<Box<dyn Step>, ConfigError> {
    let minutes = props.require_number("timer")?;
    if !(0.0..=MAX_MINUTES).contains(&minutes) {
        return Err(ConfigError::InvalidProperty {
            name: "timer".into(),
            reason: format!("{minutes} is outside 0..={MAX_MINUTES} minutes"),
        });
    }
    Ok(Box::new(ActorTimerStep {
        actors: actor_set(props, &["actor1", "actor2"])?,
        duration: Duration::from_secs_f64(minutes * 60.0),
    }))
}

impl Step for ActorTimerStep {
    fn init(&mut self, ctx: &mut StepContext<'_>) {
        ctx.actors_on(&self.actors);
    }

    fn execute(&mut self, ctx: &mut StepContext<'_>) {
        if ctx.is_timer_finished().is_none() {
            ctx.start_timer(self.duration);
        }
        if ctx.is_timer_finished() == Some(true) {
            ctx.send(
                Notification::new(
                    format!("{} complete", ctx.name()),
                    "Starting the next step",
                    Severity::Info,
                )
                .sticky(),
            );
            ctx.next();
        }
    }

    fn finish(&mut self, ctx: &mut StepContext<'_>) {
        ctx.actors_off(&self.actors);
    }
}
