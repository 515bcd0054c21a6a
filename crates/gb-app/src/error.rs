//! Error types for the gb-app service layer.

use std::path::PathBuf;

use gb_controls::ControlError;
use gb_devices::DeviceError;
use gb_results::ResultsError;
use gb_wire::WireError;

/// Application error type wrapping the backend crates' errors.
///
/// Loading and compiling a project report plain messages; errors raised
/// while the loop runs keep their type so the supervisor can tell a wiring
/// mistake from a flaky bus.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to read project file: {path}")]
    ProjectFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Runtime compilation failed: {0}")]
    Compile(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error("Results error: {0}")]
    Results(#[from] ResultsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for gb-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<WireError> for AppError {
    fn from(err: WireError) -> Self {
        AppError::Device(DeviceError::Wire(err))
    }
}

impl From<gb_project::ProjectError> for AppError {
    fn from(err: gb_project::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<gb_project::ValidationError> for AppError {
    fn from(err: gb_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl AppError {
    /// Static mistakes a restart cannot fix.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Project(_)
            | Self::ProjectFileRead { .. }
            | Self::Validation(_)
            | Self::Compile(_)
            | Self::Configuration(_) => true,
            Self::Device(err) => err.is_configuration(),
            Self::Control(err) => err.is_configuration(),
            Self::Results(err) => matches!(err, ResultsError::ColumnMismatch { .. }),
            Self::Io(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gb_controls::{ActuationError, Command};
    use gb_wire::BusFault;

    #[test]
    fn transport_failures_are_retryable() {
        let err: AppError = WireError::Transport {
            address: 0x6D,
            register: 0x05,
            attempts: 3,
            source: BusFault::new("nack"),
        }
        .into();
        assert!(!err.is_configuration());
    }

    #[test]
    fn missing_actuator_is_configuration() {
        let err: AppError =
            ControlError::from(ActuationError::Unavailable(Command::Humidify)).into();
        assert!(err.is_configuration());

        let failed: AppError = ControlError::from(ActuationError::Failed {
            command: Command::Humidify,
            reason: "bus down".to_string(),
        })
        .into();
        assert!(!failed.is_configuration());
    }

    #[test]
    fn column_drift_is_configuration() {
        let err: AppError = ResultsError::ColumnMismatch {
            expected: vec!["a".to_string()],
            found: vec!["b".to_string()],
        }
        .into();
        assert!(err.is_configuration());
    }
}
