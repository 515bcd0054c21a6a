//! Interval timers.
//!
//! A periodic action fires at most once per poll once its period has elapsed,
//! then rearms relative to the poll time. A long stall therefore produces a
//! single late firing, never a burst of catch-up firings.

use std::fmt;

use crate::error::{ControlError, ControlResult};

pub struct PeriodicAction {
    period_s: f64,
    next_due_s: f64,
    label: Option<String>,
    action: Option<Box<dyn FnMut()>>,
}

impl fmt::Debug for PeriodicAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicAction")
            .field("period_s", &self.period_s)
            .field("next_due_s", &self.next_due_s)
            .field("label", &self.label)
            .field("action", &self.action.is_some())
            .finish()
    }
}

impl PeriodicAction {
    /// First firing is due one period after `now_s`.
    ///
    /// # Arguments
    ///
    /// * `period_s` - Interval in seconds (must be positive and finite)
    /// * `now_s` - Current time from the loop's clock
    pub fn new(period_s: f64, now_s: f64) -> ControlResult<Self> {
        if !(period_s.is_finite() && period_s > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "periodic action period must be positive",
            });
        }
        Ok(Self {
            period_s,
            next_due_s: now_s + period_s,
            label: None,
            action: None,
        })
    }

    pub fn from_minutes(minutes: f64, now_s: f64) -> ControlResult<Self> {
        Self::new(minutes * 60.0, now_s)
    }

    pub fn with_action(mut self, action: impl FnMut() + 'static) -> Self {
        self.action = Some(Box::new(action));
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn period_s(&self) -> f64 {
        self.period_s
    }

    pub fn next_due_s(&self) -> f64 {
        self.next_due_s
    }

    pub fn is_due(&self, now_s: f64) -> bool {
        now_s >= self.next_due_s
    }

    /// Fires if due. Returns whether it fired.
    pub fn poll(&mut self, now_s: f64) -> bool {
        if !self.is_due(now_s) {
            return false;
        }
        let late_s = now_s - self.next_due_s;
        self.next_due_s = now_s + self.period_s;
        tracing::info!(
            timer = self.label.as_deref().unwrap_or("periodic"),
            late_s,
            next_due_s = self.next_due_s,
            "periodic action due"
        );
        if let Some(action) = self.action.as_mut() {
            action();
        }
        true
    }

    pub fn time_until_due(&self, now_s: f64) -> f64 {
        (self.next_due_s - now_s).max(0.0)
    }

    /// Rearm one full period from `now_s`.
    pub fn reset(&mut self, now_s: f64) {
        self.next_due_s = now_s + self.period_s;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn fires_once_period_elapsed() {
        let mut timer = PeriodicAction::new(60.0, 0.0).unwrap();
        assert!(!timer.poll(59.9));
        assert!(timer.poll(60.0));
        assert!(!timer.poll(60.0));
        assert_eq!(timer.next_due_s(), 120.0);
    }

    #[test]
    fn no_catch_up_after_stall() {
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let mut timer = PeriodicAction::new(10.0, 0.0)
            .unwrap()
            .with_action(move || counter.set(counter.get() + 1));
        assert!(timer.poll(55.0));
        assert!(!timer.poll(56.0));
        assert_eq!(fired.get(), 1);
        assert_eq!(timer.next_due_s(), 65.0);
    }

    #[test]
    fn from_minutes_and_time_until_due() {
        let timer = PeriodicAction::from_minutes(20.0, 100.0).unwrap();
        assert_eq!(timer.period_s(), 1200.0);
        assert_eq!(timer.time_until_due(700.0), 600.0);
        assert_eq!(timer.time_until_due(5000.0), 0.0);
    }

    #[test]
    fn reset_rearms_from_now() {
        let mut timer = PeriodicAction::new(30.0, 0.0).unwrap();
        timer.reset(25.0);
        assert!(!timer.is_due(30.0));
        assert!(timer.is_due(55.0));
    }

    #[test]
    fn non_positive_period_rejected() {
        assert!(PeriodicAction::new(0.0, 0.0).is_err());
        assert!(PeriodicAction::new(-5.0, 0.0).is_err());
        assert!(PeriodicAction::new(f64::INFINITY, 0.0).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn rapid_polls_within_one_period_fire_once(
                period in 1.0f64..600.0,
                offsets in proptest::collection::vec(0.0f64..1.0, 1..50),
            ) {
                let fired = Rc::new(Cell::new(0u32));
                let counter = fired.clone();
                let mut timer = PeriodicAction::new(period, 0.0)
                    .unwrap()
                    .with_action(move || counter.set(counter.get() + 1));
                let mut times: Vec<f64> = offsets.iter().map(|f| period + f * period * 0.99).collect();
                times.sort_by(f64::total_cmp);
                let first = times[0];
                for now in times {
                    timer.poll(now);
                }
                prop_assert_eq!(fired.get(), 1);
                prop_assert_eq!(timer.next_due_s(), first + period);
            }

            #[test]
            fn firings_never_exceed_elapsed_periods(
                period in 0.5f64..100.0,
                steps in proptest::collection::vec(0.0f64..50.0, 1..200),
            ) {
                let mut timer = PeriodicAction::new(period, 0.0).unwrap();
                let mut now = 0.0;
                let mut fired = 0u32;
                let mut last_due = timer.next_due_s();
                for dt in steps {
                    now += dt;
                    let due_before = timer.next_due_s();
                    if timer.poll(now) {
                        fired += 1;
                        prop_assert!(timer.next_due_s() >= due_before + period - 1e-9);
                        prop_assert!(timer.next_due_s() > last_due);
                        last_due = timer.next_due_s();
                    }
                }
                prop_assert!(f64::from(fired) * period <= now + 1e-6);
            }
        }
    }
}
