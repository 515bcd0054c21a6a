//! Range thresholds.
//!
//! A threshold judges one scalar against an open interval `(minval, maxval)`.
//! Either bound may be absent, meaning unbounded on that side, but not both.
//!
//! - [`Polarity::Inside`]: the value must stay strictly inside the interval.
//! - [`Polarity::Outside`]: the value must stay out of it; the interval is the
//!   alert band.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    #[default]
    Inside,
    Outside,
}

/// Outcome of judging one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Acceptable,
    /// At or under `minval` of an inside threshold.
    Below,
    /// At or over `maxval` of an inside threshold.
    Above,
    /// Within the alert band of an outside threshold.
    Inside,
}

impl Verdict {
    pub fn is_violation(&self) -> bool {
        !matches!(self, Self::Acceptable)
    }
}

/// Configuration form of a [`Threshold`], as found in project files.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ThresholdSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minval: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxval: Option<f64>,
    #[serde(default)]
    pub polarity: Polarity,
}

impl ThresholdSpec {
    pub fn inside(minval: Option<f64>, maxval: Option<f64>) -> Self {
        Self {
            minval,
            maxval,
            polarity: Polarity::Inside,
        }
    }

    pub fn outside(minval: Option<f64>, maxval: Option<f64>) -> Self {
        Self {
            minval,
            maxval,
            polarity: Polarity::Outside,
        }
    }

    /// Checks the bounds without building a threshold.
    pub fn validate(&self) -> ControlResult<()> {
        let bad = |what: &str| ControlError::Configuration {
            what: what.to_string(),
        };
        if self.minval.is_some_and(f64::is_nan) || self.maxval.is_some_and(f64::is_nan) {
            return Err(bad("threshold bound is NaN"));
        }
        match (self.minval, self.maxval) {
            (None, None) => Err(bad("threshold needs at least one of minval/maxval")),
            (Some(lo), Some(hi)) if lo >= hi => Err(ControlError::Configuration {
                what: format!("threshold minval {lo} must be below maxval {hi}"),
            }),
            _ => Ok(()),
        }
    }

    pub fn build(&self) -> ControlResult<Threshold> {
        self.validate()?;
        Ok(Threshold {
            spec: *self,
            label: None,
            action: None,
        })
    }
}

impl fmt::Display for ThresholdSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: Option<f64>| b.map_or_else(|| "-".to_string(), |v| v.to_string());
        let kind = match self.polarity {
            Polarity::Inside => "inside",
            Polarity::Outside => "outside",
        };
        write!(f, "{kind}({}, {})", bound(self.minval), bound(self.maxval))
    }
}

/// A configured range check with an optional violation callback.
pub struct Threshold {
    spec: ThresholdSpec,
    label: Option<String>,
    action: Option<Box<dyn FnMut()>>,
}

impl fmt::Debug for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Threshold")
            .field("spec", &self.spec)
            .field("label", &self.label)
            .field("action", &self.action.is_some())
            .finish()
    }
}

impl Threshold {
    /// Value must stay strictly between the bounds.
    pub fn inside(minval: Option<f64>, maxval: Option<f64>) -> ControlResult<Self> {
        ThresholdSpec::inside(minval, maxval).build()
    }

    /// Value must stay out of the band between the bounds.
    pub fn outside(minval: Option<f64>, maxval: Option<f64>) -> ControlResult<Self> {
        ThresholdSpec::outside(minval, maxval).build()
    }

    pub fn with_action(mut self, action: impl FnMut() + 'static) -> Self {
        self.action = Some(Box::new(action));
        self
    }

    /// Name used in log lines.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn spec(&self) -> &ThresholdSpec {
        &self.spec
    }

    pub fn minval(&self) -> Option<f64> {
        self.spec.minval
    }

    pub fn maxval(&self) -> Option<f64> {
        self.spec.maxval
    }

    pub fn polarity(&self) -> Polarity {
        self.spec.polarity
    }

    /// Strict interval membership; an absent bound is unbounded.
    pub fn contains(&self, value: f64) -> bool {
        let above_min = self.spec.minval.is_none_or(|lo| value > lo);
        let below_max = self.spec.maxval.is_none_or(|hi| value < hi);
        above_min && below_max
    }

    pub fn evaluate(&self, value: f64) -> Verdict {
        match self.spec.polarity {
            Polarity::Inside => {
                if self.contains(value) {
                    Verdict::Acceptable
                } else if self.spec.minval.is_some_and(|lo| value <= lo) {
                    Verdict::Below
                } else {
                    Verdict::Above
                }
            }
            Polarity::Outside => {
                if self.contains(value) {
                    Verdict::Inside
                } else {
                    Verdict::Acceptable
                }
            }
        }
    }

    /// True iff `value` is acceptable. A violation is logged and fires the action once.
    pub fn check(&mut self, value: f64) -> bool {
        let verdict = self.evaluate(value);
        if verdict.is_violation() {
            tracing::info!(
                threshold = self.label.as_deref().unwrap_or("threshold"),
                value,
                bounds = %self.spec,
                ?verdict,
                "threshold violated"
            );
            if let Some(action) = self.action.as_mut() {
                action();
            }
        }
        !verdict.is_violation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn inside_reports_side_of_violation() {
        let t = Threshold::inside(Some(95.0), Some(100.0)).unwrap();
        assert_eq!(t.evaluate(80.0), Verdict::Below);
        assert_eq!(t.evaluate(95.0), Verdict::Below);
        assert_eq!(t.evaluate(97.0), Verdict::Acceptable);
        assert_eq!(t.evaluate(100.0), Verdict::Above);
    }

    #[test]
    fn outside_band_is_the_alert() {
        let t = Threshold::outside(Some(2000.0), None).unwrap();
        assert_eq!(t.evaluate(2500.0), Verdict::Inside);
        assert_eq!(t.evaluate(2000.0), Verdict::Acceptable);
        assert_eq!(t.evaluate(400.0), Verdict::Acceptable);
    }

    #[test]
    fn missing_bound_is_unbounded() {
        let t = Threshold::inside(None, Some(500.0)).unwrap();
        assert!(t.contains(-1e9));
        assert_eq!(t.evaluate(600.0), Verdict::Above);
    }

    #[test]
    fn no_bounds_is_configuration_error() {
        let err = Threshold::inside(None, None).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn unordered_bounds_rejected() {
        assert!(Threshold::inside(Some(10.0), Some(10.0)).is_err());
        assert!(Threshold::outside(Some(20.0), Some(10.0)).is_err());
        assert!(Threshold::inside(Some(f64::NAN), None).is_err());
    }

    #[test]
    fn check_fires_action_once_per_violation() {
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let mut t = Threshold::inside(Some(95.0), Some(100.0))
            .unwrap()
            .with_action(move || counter.set(counter.get() + 1));
        assert!(!t.check(80.0));
        assert!(t.check(97.0));
        assert!(!t.check(101.0));
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn spec_parses_with_default_polarity() {
        let spec: ThresholdSpec = serde_yaml::from_str("minval: 95\nmaxval: 100\n").unwrap();
        assert_eq!(spec, ThresholdSpec::inside(Some(95.0), Some(100.0)));
        let spec: ThresholdSpec = serde_yaml::from_str("minval: 2000\npolarity: outside\n").unwrap();
        assert_eq!(spec.polarity, Polarity::Outside);
        assert_eq!(spec.to_string(), "outside(2000, -)");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn bounds() -> impl Strategy<Value = (Option<f64>, Option<f64>)> {
            (-1e6f64..1e6, 0.001f64..1e6, any::<bool>(), any::<bool>()).prop_filter_map(
                "at least one bound",
                |(lo, width, has_lo, has_hi)| {
                    let lo_b = has_lo.then_some(lo);
                    let hi_b = has_hi.then_some(lo + width);
                    (lo_b.is_some() || hi_b.is_some()).then_some((lo_b, hi_b))
                },
            )
        }

        proptest! {
            #[test]
            fn inside_acceptable_iff_strictly_within((lo, hi) in bounds(), v in -2e6f64..2e6) {
                let t = Threshold::inside(lo, hi).unwrap();
                let within = lo.is_none_or(|l| v > l) && hi.is_none_or(|h| v < h);
                prop_assert_eq!(t.evaluate(v) == Verdict::Acceptable, within);
            }

            #[test]
            fn polarities_are_complementary((lo, hi) in bounds(), v in -2e6f64..2e6) {
                let inside = Threshold::inside(lo, hi).unwrap();
                let outside = Threshold::outside(lo, hi).unwrap();
                prop_assert_ne!(
                    inside.evaluate(v).is_violation(),
                    outside.evaluate(v).is_violation()
                );
            }

            #[test]
            fn action_fires_iff_violation((lo, hi) in bounds(), v in -2e6f64..2e6, outside in any::<bool>()) {
                let fired = Rc::new(Cell::new(0u32));
                let counter = fired.clone();
                let t = if outside {
                    Threshold::outside(lo, hi)
                } else {
                    Threshold::inside(lo, hi)
                };
                let mut t = t.unwrap().with_action(move || counter.set(counter.get() + 1));
                let ok = t.check(v);
                prop_assert_eq!(fired.get(), u32::from(!ok));
            }
        }
    }
}
