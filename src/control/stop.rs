//! Cooperative cancellation for control-loop tasks.
//!
//! The supervisor keeps the [`StopSignal`]; the control loop owns the
//! matching [`StopToken`] and polls it every iteration.  Stopping is a
//! request, never a kill: the loop notices on its next poll (or wakes
//! early from [`StopToken::wait`]) and exits on its own.
//!
//! Dropping the signal counts as a stop request, so a loop can never
//! outlive the bookkeeping that owns it by more than one iteration.

use core::cell::Cell;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

/// Create a connected signal/token pair.
pub fn stop_channel() -> (StopSignal, StopToken) {
    let (tx, rx) = mpsc::channel();
    (
        StopSignal { tx },
        StopToken {
            rx,
            stopped: Cell::new(false),
        },
    )
}

/// Supervisor side: requests that the loop exit.
#[derive(Debug)]
pub struct StopSignal {
    tx: Sender<()>,
}

impl StopSignal {
    /// Deliver the stop request.
    ///
    /// Fails when the loop already exited and dropped its token, in which
    /// case there is nobody left to tell.
    pub fn send(&self) -> Result<(), &'static str> {
        self.tx
            .send(())
            .map_err(|_| "control loop is no longer listening")
    }
}

/// Loop side: observed once per iteration.
#[derive(Debug)]
pub struct StopToken {
    rx: Receiver<()>,
    stopped: Cell<bool>,
}

impl StopToken {
    /// `true` once a stop was requested or the signal was dropped.
    pub fn is_stopped(&self) -> bool {
        if self.stopped.get() {
            return true;
        }
        match self.rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => {
                self.stopped.set(true);
                true
            }
            Err(TryRecvError::Empty) => false,
        }
    }

    /// Sleep for up to `timeout`, waking early on a stop request.
    /// Returns `true` if the loop should exit.
    pub fn wait(&self, timeout: Duration) -> bool {
        if self.stopped.get() {
            return true;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                self.stopped.set(true);
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
        }
    }
}
