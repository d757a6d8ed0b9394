//! Per-activation step timer.
//!
//! Arming is idempotent: once started, further `arm` calls are ignored
//! until the timer is cleared.  The timer reads time from the caller
//! (the rig [`Clock`](crate::app::ports::Clock)) so it can be driven
//! deterministically in tests.

use std::time::Duration;

/// Observable timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    NotStarted,
    Running { remaining: Duration },
    Finished,
}

#[derive(Debug, Clone, Default)]
pub struct StepTimer {
    started_at: Option<Duration>,
    duration: Duration,
}

impl StepTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting `duration` from `now`.  Returns `false` (and changes
    /// nothing) when the timer is already armed.
    pub fn arm(&mut self, now: Duration, duration: Duration) -> bool {
        if self.started_at.is_some() {
            return false;
        }
        self.started_at = Some(now);
        self.duration = duration;
        true
    }

    pub fn clear(&mut self) {
        self.started_at = None;
        self.duration = Duration::ZERO;
    }

    pub fn started_at(&self) -> Option<Duration> {
        self.started_at
    }

    pub fn state(&self, now: Duration) -> TimerState {
        match self.started_at {
            None => TimerState::NotStarted,
            Some(start) => {
                let elapsed = now.saturating_sub(start);
                if elapsed >= self.duration {
                    TimerState::Finished
                } else {
                    TimerState::Running {
                        remaining: self.duration - elapsed,
                    }
                }
            }
        }
    }

    /// `None` before arming, then whether the duration has elapsed.
    pub fn is_finished(&self, now: Duration) -> Option<bool> {
        match self.state(now) {
            TimerState::NotStarted => None,
            TimerState::Running { .. } => Some(false),
            TimerState::Finished => Some(true),
        }
    }
}
