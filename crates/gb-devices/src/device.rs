//! Device capability interface.

use std::cell::RefCell;
use std::rc::Rc;

use gb_core::{FieldKind, Value};

use crate::error::DeviceResult;

/// Result of reading one telemetry field.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    /// A single value stored under the field's name.
    Scalar(Value),
    /// Named sub-values merged directly into the reading (e.g. one per relay).
    Group(Vec<(String, Value)>),
}

impl Sample {
    pub fn scalar(value: impl Into<Value>) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<Value> for Sample {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

/// A sensor or actuator owned by the control loop.
pub trait Device {
    fn name(&self) -> &str;

    /// One-time hardware setup. Called once before the first sample.
    fn begin(&mut self) -> DeviceResult<()> {
        Ok(())
    }

    /// Fields this device can report right now.
    fn telemetry(&self) -> Vec<FieldKind>;

    fn read(&mut self, field: FieldKind) -> DeviceResult<Sample>;

    fn supports(&self, field: FieldKind) -> bool {
        self.telemetry().contains(&field)
    }
}

/// Shared handle to a device.
///
/// The loop samples every device while the actuator bundle drives some of
/// the same devices; both hold a handle. Everything runs on one thread.
pub type DeviceHandle = Rc<RefCell<dyn Device>>;

pub fn handle<D: Device + 'static>(device: D) -> Rc<RefCell<D>> {
    Rc::new(RefCell::new(device))
}
