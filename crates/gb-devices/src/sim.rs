//! Simulated sensor with settable values.

use std::cell::RefCell;
use std::rc::Rc;

use gb_core::{FieldKind, Value};

use crate::device::{Device, Sample};
use crate::error::{DeviceError, DeviceResult};

#[derive(Debug, Default)]
struct SimState {
    values: Vec<(FieldKind, Value)>,
    failures: u32,
    reads: u32,
    begun: u32,
}

/// A sensor whose readings are set from outside.
///
/// Clones share state, so a test (or the dry-run driver) can keep a clone
/// and change what the loop will see on the next cycle.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    name: String,
    state: Rc<RefCell<SimState>>,
}

impl SimulatedSensor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Rc::default(),
        }
    }

    pub fn with_value(self, field: FieldKind, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Sets (or adds) the value reported for `field`.
    pub fn set(&self, field: FieldKind, value: impl Into<Value>) {
        let value = value.into();
        let mut state = self.state.borrow_mut();
        match state.values.iter_mut().find(|(k, _)| *k == field) {
            Some(slot) => slot.1 = value,
            None => state.values.push((field, value)),
        }
    }

    pub fn fields(&self) -> Vec<FieldKind> {
        self.state.borrow().values.iter().map(|(k, _)| *k).collect()
    }

    /// The next `n` reads fail as if the sensor stopped answering.
    pub fn fail_next(&self, n: u32) {
        self.state.borrow_mut().failures = n;
    }

    pub fn reads(&self) -> u32 {
        self.state.borrow().reads
    }

    pub fn begin_calls(&self) -> u32 {
        self.state.borrow().begun
    }
}

impl Device for SimulatedSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin(&mut self) -> DeviceResult<()> {
        self.state.borrow_mut().begun += 1;
        Ok(())
    }

    fn telemetry(&self) -> Vec<FieldKind> {
        self.fields()
    }

    fn supports(&self, field: FieldKind) -> bool {
        self.state.borrow().values.iter().any(|(k, _)| *k == field)
    }

    fn read(&mut self, field: FieldKind) -> DeviceResult<Sample> {
        let mut state = self.state.borrow_mut();
        state.reads += 1;
        if state.failures > 0 {
            state.failures -= 1;
            return Err(DeviceError::InvalidData {
                device: self.name.clone(),
                what: format!("no response reading {field}"),
            });
        }
        state
            .values
            .iter()
            .find(|(k, _)| *k == field)
            .map(|(_, v)| Sample::Scalar(v.clone()))
            .ok_or_else(|| DeviceError::Unsupported {
                device: self.name.clone(),
                field,
            })
    }
}
