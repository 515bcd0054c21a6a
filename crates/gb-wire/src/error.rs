//! Error types for bus access.

use thiserror::Error;

use crate::bus::BusFault;

/// Result type for wire operations.
pub type WireResult<T> = Result<T, WireError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WireError {
    /// Bus operation still failing after every retry attempt.
    #[error(
        "Transport error: device 0x{address:02X} register 0x{register:02X} failed after {attempts} attempt(s): {source}"
    )]
    Transport {
        address: u8,
        register: u8,
        attempts: u32,
        source: BusFault,
    },

    /// Invalid static wiring (missing address, bad retry policy).
    #[error("Configuration error: {what}")]
    Configuration { what: String },
}

impl WireError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
