//! Error types for evaluation and actuation.

use gb_core::Value;
use thiserror::Error;

use crate::actuation::ActuationError;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while configuring or evaluating a profile.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Static configuration that can never work.
    #[error("Configuration error: {what}")]
    Configuration { what: String },

    /// The profile checks a field the reading does not carry.
    #[error("Field '{field}' is checked by the profile but missing from the reading")]
    MissingField { field: String },

    #[error("Field '{field}' is not numeric: {value}")]
    NonNumeric { field: String, value: Value },

    #[error(transparent)]
    Actuation(#[from] ActuationError),
}

impl ControlError {
    /// Wiring defects: retrying the loop will fail the same way.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::InvalidArg { .. } | Self::Configuration { .. } | Self::MissingField { .. } => {
                true
            }
            Self::NonNumeric { .. } => false,
            Self::Actuation(err) => err.is_configuration(),
        }
    }
}
