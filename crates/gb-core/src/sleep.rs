//! Blocking sleeps.
//!
//! The loop is single threaded: a sleep here stops everything. Cadence waits
//! and actuation holds (mister on for N seconds) both go through `Sleeper` so
//! tests run without real delays.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::clock::ManualClock;

pub trait Sleeper: std::fmt::Debug {
    fn sleep(&self, duration: Duration);
}

/// Production sleeper using `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Test sleeper that records every call and optionally advances a manual clock.
#[derive(Debug, Clone, Default)]
pub struct TrackingSleeper {
    calls: Rc<RefCell<Vec<Duration>>>,
    clock: Option<ManualClock>,
}

impl TrackingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each sleep advances `clock` by the slept duration.
    pub fn with_clock(clock: ManualClock) -> Self {
        Self {
            calls: Rc::default(),
            clock: Some(clock),
        }
    }

    pub fn calls(&self) -> Vec<Duration> {
        self.calls.borrow().clone()
    }

    pub fn total(&self) -> Duration {
        self.calls.borrow().iter().sum()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl Sleeper for TrackingSleeper {
    fn sleep(&self, duration: Duration) {
        self.calls.borrow_mut().push(duration);
        if let Some(clock) = &self.clock {
            clock.advance(duration.as_secs_f64());
        }
    }
}
