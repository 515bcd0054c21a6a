//! Ultrasonic mister on a single switch.

use std::rc::Rc;
use std::time::Duration;

use gb_core::{FieldKind, Sleeper};

use crate::device::{Device, Sample};
use crate::error::{DeviceError, DeviceResult};
use crate::switch::Switch;

pub const DEFAULT_HUMIDIFY: Duration = Duration::from_secs(10);

pub struct Mister {
    name: String,
    switch: Box<dyn Switch>,
    humidify: Duration,
    sleeper: Rc<dyn Sleeper>,
    on: bool,
}

impl std::fmt::Debug for Mister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mister")
            .field("name", &self.name)
            .field("switch", &self.switch.describe())
            .field("humidify", &self.humidify)
            .field("on", &self.on)
            .finish()
    }
}

impl Mister {
    pub fn new(name: impl Into<String>, switch: Box<dyn Switch>, sleeper: Rc<dyn Sleeper>) -> Self {
        Self {
            name: name.into(),
            switch,
            humidify: DEFAULT_HUMIDIFY,
            sleeper,
            on: false,
        }
    }

    pub fn with_humidify(mut self, humidify: Duration) -> Self {
        self.humidify = humidify;
        self
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn on(&mut self) -> DeviceResult<()> {
        self.switch.set(true)?;
        self.on = true;
        Ok(())
    }

    pub fn off(&mut self) -> DeviceResult<()> {
        self.switch.set(false)?;
        self.on = false;
        Ok(())
    }

    /// Mist for the configured hold, then switch off. Blocks the loop.
    pub fn humidify(&mut self) -> DeviceResult<()> {
        self.humidify_for(self.humidify)
    }

    pub fn humidify_for(&mut self, hold: Duration) -> DeviceResult<()> {
        tracing::info!(device = %self.name, hold_s = hold.as_secs_f64(), "humidify");
        self.on()?;
        self.sleeper.sleep(hold);
        self.off()
    }
}

impl Device for Mister {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin(&mut self) -> DeviceResult<()> {
        self.off()
    }

    fn telemetry(&self) -> Vec<FieldKind> {
        vec![]
    }

    fn read(&mut self, field: FieldKind) -> DeviceResult<Sample> {
        Err(DeviceError::Unsupported {
            device: self.name.clone(),
            field,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::switch::SimSwitch;
    use gb_core::TrackingSleeper;

    #[test]
    fn humidify_holds_then_stops() {
        let sw = SimSwitch::new("mist");
        let sleeper = TrackingSleeper::new();
        let mut mister = Mister::new("mister", Box::new(sw.clone()), Rc::new(sleeper.clone()));
        mister.humidify().unwrap();
        assert_eq!(sw.history(), vec![true, false]);
        assert_eq!(sleeper.calls(), vec![DEFAULT_HUMIDIFY]);
        assert!(!mister.is_on());
    }

    #[test]
    fn explicit_on_off() {
        let sw = SimSwitch::new("mist");
        let mut mister = Mister::new("mister", Box::new(sw.clone()), Rc::new(TrackingSleeper::new()))
            .with_humidify(Duration::from_secs(4));
        mister.on().unwrap();
        assert!(mister.is_on() && sw.is_on());
        mister.off().unwrap();
        assert!(!sw.is_on());
    }
}
