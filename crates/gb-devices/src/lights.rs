//! Grow lights on a single switch.
//!
//! The lamp is not dimmable: brightening switches it on, darkening switches it off.

use gb_core::{FieldKind, Value};

use crate::device::{Device, Sample};
use crate::error::{DeviceError, DeviceResult};
use crate::switch::Switch;

pub struct Lights {
    name: String,
    switch: Box<dyn Switch>,
    on: bool,
}

impl std::fmt::Debug for Lights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lights")
            .field("name", &self.name)
            .field("switch", &self.switch.describe())
            .field("on", &self.on)
            .finish()
    }
}

impl Lights {
    pub fn new(name: impl Into<String>, switch: Box<dyn Switch>) -> Self {
        Self {
            name: name.into(),
            switch,
            on: false,
        }
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

    pub fn brighten(&mut self) -> DeviceResult<()> {
        self.on()
    }

    pub fn darken(&mut self) -> DeviceResult<()> {
        self.off()
    }
}

impl Device for Lights {
    fn name(&self) -> &str {
        &self.name
    }

    fn telemetry(&self) -> Vec<FieldKind> {
        vec![FieldKind::Lights]
    }

    fn read(&mut self, field: FieldKind) -> DeviceResult<Sample> {
        if field != FieldKind::Lights {
            return Err(DeviceError::Unsupported {
                device: self.name.clone(),
                field,
            });
        }
        Ok(Sample::Scalar(Value::Int(i64::from(self.on))))
    }
}
