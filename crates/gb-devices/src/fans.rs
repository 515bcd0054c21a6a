//! Upper and lower fan banks.
//!
//! Upper fans pull fresh air in, lower fans push stale (CO2-heavy) air out.
//! An exchange runs both for a fixed hold and then stops them.

use std::rc::Rc;
use std::time::Duration;

use gb_core::{FieldKind, Sleeper, Value};

use crate::device::{Device, Sample};
use crate::error::{DeviceError, DeviceResult};
use crate::switch::Switch;

pub const DEFAULT_EXCHANGE: Duration = Duration::from_secs(60);

pub struct FanBank {
    name: String,
    upper: Vec<Box<dyn Switch>>,
    lower: Vec<Box<dyn Switch>>,
    exchange: Duration,
    sleeper: Rc<dyn Sleeper>,
    upper_on: bool,
    lower_on: bool,
}

impl std::fmt::Debug for FanBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanBank")
            .field("name", &self.name)
            .field("upper", &self.upper.iter().map(|s| s.describe()).collect::<Vec<_>>())
            .field("lower", &self.lower.iter().map(|s| s.describe()).collect::<Vec<_>>())
            .field("exchange", &self.exchange)
            .field("upper_on", &self.upper_on)
            .field("lower_on", &self.lower_on)
            .finish()
    }
}

impl FanBank {
    pub fn new(
        name: impl Into<String>,
        upper: Vec<Box<dyn Switch>>,
        lower: Vec<Box<dyn Switch>>,
        sleeper: Rc<dyn Sleeper>,
    ) -> DeviceResult<Self> {
        let name = name.into();
        if upper.is_empty() && lower.is_empty() {
            return Err(DeviceError::Configuration {
                what: format!("{name}: fan bank has no fans"),
            });
        }
        Ok(Self {
            name,
            upper,
            lower,
            exchange: DEFAULT_EXCHANGE,
            sleeper,
            upper_on: false,
            lower_on: false,
        })
    }

    pub fn with_exchange(mut self, exchange: Duration) -> Self {
        self.exchange = exchange;
        self
    }

    pub fn exchange_duration(&self) -> Duration {
        self.exchange
    }

    pub fn upper_on(&self) -> bool {
        self.upper_on
    }

    pub fn lower_on(&self) -> bool {
        self.lower_on
    }

    fn drive(switches: &mut [Box<dyn Switch>], on: bool) -> DeviceResult<()> {
        for switch in switches {
            switch.set(on)?;
        }
        Ok(())
    }

    pub fn set_upper(&mut self, on: bool) -> DeviceResult<()> {
        Self::drive(&mut self.upper, on)?;
        self.upper_on = on;
        Ok(())
    }

    pub fn set_lower(&mut self, on: bool) -> DeviceResult<()> {
        Self::drive(&mut self.lower, on)?;
        self.lower_on = on;
        Ok(())
    }

    /// Bring in fresh air.
    pub fn add_oxygen(&mut self) -> DeviceResult<()> {
        self.set_upper(true)
    }

    /// Exhaust stale air.
    pub fn remove_co2(&mut self) -> DeviceResult<()> {
        self.set_lower(true)
    }

    pub fn stop(&mut self) -> DeviceResult<()> {
        self.set_upper(false)?;
        self.set_lower(false)
    }

    /// Run both banks for the exchange hold, then stop. Blocks the loop.
    pub fn exchange(&mut self) -> DeviceResult<()> {
        tracing::info!(device = %self.name, hold_s = self.exchange.as_secs_f64(), "air exchange");
        self.add_oxygen()?;
        self.remove_co2()?;
        self.sleeper.sleep(self.exchange);
        self.stop()
    }
}

impl Device for FanBank {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin(&mut self) -> DeviceResult<()> {
        self.stop()
    }

    fn telemetry(&self) -> Vec<FieldKind> {
        vec![FieldKind::Fans]
    }

    fn read(&mut self, field: FieldKind) -> DeviceResult<Sample> {
        if field != FieldKind::Fans {
            return Err(DeviceError::Unsupported {
                device: self.name.clone(),
                field,
            });
        }
        Ok(Sample::Group(vec![
            ("upper_fans".into(), Value::Int(i64::from(self.upper_on))),
            ("lower_fans".into(), Value::Int(i64::from(self.lower_on))),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::switch::SimSwitch;
    use gb_core::TrackingSleeper;

    fn bank() -> (FanBank, SimSwitch, SimSwitch, TrackingSleeper) {
        let up = SimSwitch::new("up");
        let down = SimSwitch::new("down");
        let sleeper = TrackingSleeper::new();
        let bank = FanBank::new(
            "fans",
            vec![Box::new(up.clone()) as Box<dyn Switch>],
            vec![Box::new(down.clone()) as Box<dyn Switch>],
            Rc::new(sleeper.clone()),
        )
        .unwrap()
        .with_exchange(Duration::from_secs(30));
        (bank, up, down, sleeper)
    }

    #[test]
    fn exchange_runs_both_then_stops() {
        let (mut bank, up, down, sleeper) = bank();
        bank.exchange().unwrap();
        assert_eq!(up.history(), vec![true, false]);
        assert_eq!(down.history(), vec![true, false]);
        assert_eq!(sleeper.calls(), vec![Duration::from_secs(30)]);
        assert!(!bank.upper_on() && !bank.lower_on());
    }

    #[test]
    fn telemetry_reports_each_bank() {
        let (mut bank, _up, _down, _sleeper) = bank();
        bank.add_oxygen().unwrap();
        assert_eq!(
            bank.read(FieldKind::Fans).unwrap(),
            Sample::Group(vec![
                ("upper_fans".into(), Value::Int(1)),
                ("lower_fans".into(), Value::Int(0)),
            ])
        );
    }

    #[test]
    fn begin_switches_everything_off() {
        let (mut bank, up, down, _sleeper) = bank();
        bank.begin().unwrap();
        assert_eq!(up.history(), vec![false]);
        assert_eq!(down.history(), vec![false]);
    }

    #[test]
    fn empty_bank_is_rejected() {
        let err = FanBank::new("fans", vec![], vec![], Rc::new(TrackingSleeper::new())).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn other_fields_unsupported() {
        let (mut bank, ..) = bank();
        assert!(matches!(
            bank.read(FieldKind::Lux),
            Err(DeviceError::Unsupported { .. })
        ));
    }
}
