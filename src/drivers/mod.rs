//! OS-level helpers used by the core.

pub mod task;
