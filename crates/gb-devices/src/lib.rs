//! Device collaborators for the growbox control loop.
//!
//! The loop only sees devices through the [`Device`] trait: a name, a
//! one-time `begin()`, the telemetry fields the device can report, and a
//! `read()` per field. Actuators (relay channels, fans, mister, lights) are
//! devices too, so their state lands in the same reading as the sensors.
//!
//! # Contents
//!
//! - [`QuadRelay`]: four-channel I2C relay board driven through a [`gb_wire::Wire`]
//! - [`QuadRelayBoard`]: bus-level emulation of that board
//! - [`Switch`]: on/off output used by fans, mister and lights
//! - [`FanBank`], [`Mister`], [`Lights`]: actuator facades
//! - [`SimulatedSensor`]: fixed-value sensor for dry runs and tests

pub mod device;
pub mod error;
pub mod fans;
pub mod lights;
pub mod mister;
pub mod relay;
pub mod sim;
pub mod switch;

pub use device::{Device, DeviceHandle, Sample, handle};
pub use error::{DeviceError, DeviceResult};
pub use fans::FanBank;
pub use lights::Lights;
pub use mister::Mister;
pub use relay::{QuadRelay, QuadRelayBoard, QuadRelayCommand, RelayChannel};
pub use sim::SimulatedSensor;
pub use switch::{SimSwitch, Switch};
