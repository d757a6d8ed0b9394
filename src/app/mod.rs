//! Application core: recipe orchestration, zero I/O.
//!
//! All interaction with hardware, UI and storage happens through the
//! **port traits** defined in [`ports`], keeping this layer fully
//! testable without a real rig.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
