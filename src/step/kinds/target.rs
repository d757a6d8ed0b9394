//! Set a kettle's target temperature, optionally flip auto mode, and move
//! on.

use crate::control::AutoMode;
use crate::error::ConfigError;
use crate::kettle::KettleId;
use crate::step::context::StepContext;
use crate::step::properties::{PropertyDef, PropertyKind, StepProperties};
use crate::step::registry::StepKind;
use crate::step::Step;

use super::{report_kettle_error, report_missing_kettle};

const PROPERTIES: &[PropertyDef] = &[
    PropertyDef::new("auto_mode", "Auto Mode", PropertyKind::Select(&AutoMode::OPTIONS)),
    PropertyDef::new("kettle", "Kettle", PropertyKind::Kettle),
    PropertyDef::new("target", "Target Temp", PropertyKind::Number),
];

pub const KIND: StepKind = StepKind {
    id: "target",
    name: "Target temperature",
    properties: PROPERTIES,
    construct,
};

pub struct TargetStep {
    kettle: Option<KettleId>,
    target: f64,
    auto_mode: AutoMode,
}

fn construct(props: &StepProperties) -> Result<Box<dyn Step>, ConfigError> {
    Ok(Box::new(TargetStep {
        kettle: props.kettle("kettle")?,
        target: props.require_number("target")?,
        auto_mode: props
            .text("auto_mode")
            .map_or(AutoMode::NoChange, AutoMode::from_label),
    }))
}

impl Step for TargetStep {
    fn init(&mut self, ctx: &mut StepContext<'_>) {
        let Some(kettle) = self.kettle else {
            report_missing_kettle(ctx);
            return;
        };
        if let Err(e) = ctx.set_target_temp(kettle, self.target) {
            report_kettle_error(ctx, &e);
            return;
        }
        // A failed auto-mode transition is reported by the context and
        // does not hold the recipe.
        let _ = ctx.set_auto_mode(kettle, self.auto_mode);
        ctx.next();
    }
}
