//! Named background-thread spawning for control-loop tasks.
//!
//! Each kettle's control loop gets its own OS thread with an explicit
//! stack size and a name that shows up in debuggers and panic messages
//! (`kettle-1-pid`).  Unlike `std::thread::spawn`, spawn failure is
//! returned to the caller so the supervisor can leave its bookkeeping
//! consistent.

use std::io;
use std::thread::{Builder, JoinHandle};

/// Smallest stack we hand to a control loop.
pub const MIN_STACK_KB: usize = 16;

/// Spawn a named thread with an explicit stack size.
pub fn spawn_named(
    name: String,
    stack_kb: usize,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    let stack_kb = stack_kb.max(MIN_STACK_KB);
    log::debug!("Spawning '{}' (stack={}KB)", name, stack_kb);

    Builder::new()
        .name(name)
        .stack_size(stack_kb * 1024)
        .spawn(f)
}
