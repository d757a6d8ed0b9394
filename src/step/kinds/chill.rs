//! Chill a kettle down to a target temperature with up to two actors
//! (pumps, valves) running.

use std::time::Duration;

use log::debug;

use crate::app::events::{Notification, Severity};
use crate::error::ConfigError;
use crate::kettle::KettleId;
use crate::step::context::StepContext;
use crate::step::properties::{PropertyDef, PropertyKind, StepProperties};
use crate::step::registry::StepKind;
use crate::step::Step;

use super::{ActorSet, actor_set, report_kettle_error, report_missing_kettle};

const PROPERTIES: &[PropertyDef] = &[
    PropertyDef::new("actor1", "Actor 1", PropertyKind::Actor)
        .describe("Actor to turn on until target temp is reached"),
    PropertyDef::new("actor2", "Actor 2", PropertyKind::Actor)
        .describe("Actor to turn on until target temp is reached"),
    PropertyDef::new("kettle", "Kettle", PropertyKind::Kettle)
        .describe("Kettle in which the chilling takes place"),
    PropertyDef::new("target", "Temperature", PropertyKind::Number)
        .describe("Target temperature of chill step"),
];

pub const KIND: StepKind = StepKind {
    id: "chill",
    name: "Chill to temperature",
    properties: PROPERTIES,
    construct,
};

pub struct ChillStep {
    actors: ActorSet,
    kettle: Option<KettleId>,
    target: f64,
    /// Set once `init` applied the target and engaged the actors.
    started_at: Option<Duration>,
}

fn construct(props: &StepProperties) -> Result<Box<dyn Step>, ConfigError> {
    Ok(Box::new(ChillStep {
        actors: actor_set(props, &["actor1", "actor2"])?,
        kettle: props.kettle("kettle")?,
        target: props.require_number("target")?,
        started_at: None,
    }))
}

impl Step for ChillStep {
    fn init(&mut self, ctx: &mut StepContext<'_>) {
        let Some(kettle) = self.kettle else {
            report_missing_kettle(ctx);
            return;
        };
        if let Err(e) = ctx.set_target_temp(kettle, self.target) {
            report_kettle_error(ctx, &e);
            return;
        }
        self.started_at = Some(ctx.now());
        ctx.actors_on(&self.actors);
    }

    fn execute(&mut self, ctx: &mut StepContext<'_>) {
        let (Some(kettle), Some(started_at)) = (self.kettle, self.started_at) else {
            return;
        };
        match ctx.kettle_temp(kettle) {
            Ok(temp) if temp <= self.target => {
                let elapsed = ctx.now().saturating_sub(started_at);
                ctx.send(
                    Notification::new(
                        format!("{} complete", ctx.name()),
                        format!("Chill temp reached in {}", format_elapsed(elapsed)),
                        Severity::Info,
                    )
                    .sticky(),
                );
                ctx.next();
            }
            Ok(_) => {}
            // Not satisfied this tick; try again on the next.
            Err(e) => debug!("Step '{}': {}", ctx.name(), e),
        }
    }

    fn reset(&mut self, ctx: &mut StepContext<'_>) {
        let Some(kettle) = self.kettle else {
            return;
        };
        if let Err(e) = ctx.set_target_temp(kettle, self.target) {
            report_kettle_error(ctx, &e);
        }
    }

    fn finish(&mut self, ctx: &mut StepContext<'_>) {
        ctx.actors_off(&self.actors);
    }
}

/// `M:SS`, or `H:MM:SS` from one hour on.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (hours, rem) = (secs / 3600, secs % 3600);
    let (minutes, seconds) = (rem / 60, rem % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
