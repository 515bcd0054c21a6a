//! Register-level bus access with bounded retry.
//!
//! Every device driver talks to its chip through a [`Wire`]: a bus, a 7-bit
//! address and a [`RetryPolicy`]. Transient bus faults are retried a fixed
//! number of times per call; once the attempts are exhausted the fault
//! surfaces as [`WireError::Transport`].
//!
//! There is deliberately no backoff or circuit breaking: a device that keeps
//! failing is retried and fails again on every poll.

pub mod bus;
pub mod error;
pub mod i2c;
pub mod i2cdev;
pub mod memory;
pub mod retry;
pub mod wire;

pub use bus::{Bus, BusFault, SharedBus, shared};
pub use error::{WireError, WireResult};
pub use i2c::I2cBus;
pub use i2cdev::open_i2cdev;
pub use memory::MemoryBus;
pub use retry::RetryPolicy;
pub use wire::{Payload, Wire};
