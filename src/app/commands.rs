//! Inbound commands to the brewing service.
//!
//! These represent actions requested by the operator (UI buttons, CLI,
//! remote API) that the [`BrewService`](super::service::BrewService)
//! interprets and acts upon.

use crate::control::AutoMode;
use crate::kettle::KettleId;

/// Commands that external adapters can send into the core.
#[derive(Debug, Clone, PartialEq)]
pub enum RigCommand {
    /// Enter the first recipe step.
    Start,

    /// Finish the active step and move to the next one.
    Next,

    /// Re-apply the active step's setup after the recipe was rewound.
    ResetStep,

    /// Tear down the active step and stop the recipe.
    Stop,

    /// Operator toggle of a kettle's automatic control loop.
    SetAutoMode { kettle: KettleId, mode: AutoMode },

    /// Change a kettle's target temperature (°C).
    SetTargetTemp { kettle: KettleId, target: f64 },
}
