//! Host clock adapter.
//!
//! Monotonic time comes from `std::time::Instant` captured at
//! construction; calendar dates come from the local wall clock via
//! `chrono`.

use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};

use crate::app::ports::Clock;

/// [`Clock`] for the host simulator and real deployments.
#[derive(Debug)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
