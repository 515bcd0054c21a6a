//! Monotonic time sources.
//!
//! The control loop and periodic actions read time in seconds through the
//! `Clock` trait so tests can drive time by hand.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic seconds since an arbitrary origin.
pub trait Clock: std::fmt::Debug {
    fn now_s(&self) -> f64;
}

/// Clock backed by `Instant::now()`; the origin is the moment of creation.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for MonotonicClock {
    fn now_s(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_s: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_s)),
        }
    }

    pub fn set(&self, now_s: f64) {
        self.now.set(now_s);
    }

    pub fn advance(&self, dt_s: f64) {
        self.now.set(self.now.get() + dt_s);
    }
}

impl Clock for ManualClock {
    fn now_s(&self) -> f64 {
        self.now.get()
    }
}
