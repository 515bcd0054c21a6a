//! Error types for device operations.

use gb_core::FieldKind;
use gb_wire::WireError;
use thiserror::Error;

pub type DeviceResult<T> = Result<T, DeviceError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeviceError {
    #[error(transparent)]
    Wire(#[from] WireError),

    /// The device answered, but with data that makes no sense.
    #[error("Invalid data from {device}: {what}")]
    InvalidData { device: String, what: String },

    #[error("Device {device} does not report field {field}")]
    Unsupported { device: String, field: FieldKind },

    #[error("Configuration error: {what}")]
    Configuration { what: String },
}

impl DeviceError {
    /// Wiring mistakes that a restart will not fix.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Configuration { .. } | Self::Unsupported { .. } => true,
            Self::Wire(err) => !err.is_transport(),
            Self::InvalidData { .. } => false,
        }
    }
}
