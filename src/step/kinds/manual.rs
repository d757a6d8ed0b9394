//! Operator notification step.
//!
//! Shows a sticky notification when entered.  With `proceed = Continue`
//! the recipe moves on immediately, with `Pause` it waits for the
//! operator's `next`.

use crate::app::events::{Notification, Severity};
use crate::error::ConfigError;
use crate::step::context::StepContext;
use crate::step::properties::{PropertyDef, PropertyKind, StepProperties};
use crate::step::registry::StepKind;
use crate::step::Step;

const PROCEED_OPTIONS: &[&str] = &["Pause", "Continue"];

const PROPERTIES: &[PropertyDef] = &[
    PropertyDef::new("heading", "Heading", PropertyKind::Text { default: "Step Alert" })
        .describe("First line of notification."),
    PropertyDef::new(
        "message",
        "Message",
        PropertyKind::Text {
            default: "Press next button to continue",
        },
    )
    .describe("Second line of notification."),
    PropertyDef::new("type", "Type", PropertyKind::Select(&Severity::NAMES)),
    PropertyDef::new("proceed", "Next Step", PropertyKind::Select(PROCEED_OPTIONS))
        .describe("Whether or not to automatically continue to the next brew step."),
];

pub const KIND: StepKind = StepKind {
    id: "manual",
    name: "Manual step",
    properties: PROPERTIES,
    construct,
};

pub struct ManualStep {
    heading: String,
    message: String,
    severity: Severity,
    auto_continue: bool,
}

fn construct(props: &StepProperties) -> Result<Box<dyn Step>, ConfigError> {
    Ok(Box::new(ManualStep {
        heading: props.text_or("heading", "Step Alert").to_string(),
        message: props
            .text_or("message", "Press next button to continue")
            .to_string(),
        // Invalid or missing styles fall back to info.
        severity: props
            .text("type")
            .and_then(Severity::parse)
            .unwrap_or(Severity::Info),
        auto_continue: props.select("proceed", PROCEED_OPTIONS) == Some("Continue"),
    }))
}

impl Step for ManualStep {
    fn init(&mut self, ctx: &mut StepContext<'_>) {
        ctx.send(Notification::new(self.heading.clone(), self.message.clone(), self.severity).sticky());
        if self.auto_continue {
            ctx.next();
        }
    }
}
