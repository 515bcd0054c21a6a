//! Linux i2c-dev buses (`/dev/i2c-N`).
//!
//! Backed by `linux-embedded-hal`, whose `I2cdev` implements the
//! `embedded-hal` I2C trait and so plugs into [`I2cBus`]. On other targets
//! opening a bus is a configuration error.

use std::path::Path;

use crate::bus::{Bus, SharedBus};
use crate::error::{WireError, WireResult};

/// Opens the i2c-dev character device at `path`, ready to share between boards.
#[cfg(target_os = "linux")]
pub fn open_i2cdev(path: &Path) -> WireResult<SharedBus<dyn Bus>> {
    let dev = linux_embedded_hal::I2cdev::new(path).map_err(|e| WireError::Configuration {
        what: format!("cannot open {}: {e}", path.display()),
    })?;
    tracing::info!(path = %path.display(), "i2c bus opened");
    let bus: SharedBus<dyn Bus> = crate::bus::shared(crate::i2c::I2cBus::new(dev));
    Ok(bus)
}

#[cfg(not(target_os = "linux"))]
pub fn open_i2cdev(path: &Path) -> WireResult<SharedBus<dyn Bus>> {
    Err(WireError::Configuration {
        what: format!("{}: i2c-dev buses need Linux", path.display()),
    })
}
