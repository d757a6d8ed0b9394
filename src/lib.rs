//! BrewRig library.
//!
//! Step scheduler and kettle auto-mode supervisor for a brewing rig.
//! The core (`app`, `control`, `kettle`, `step`) talks to the outside
//! world only through the port traits in [`app::ports`]; `adapters`
//! holds the host implementations used by the simulator binary.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod kettle;
pub mod step;
