//! Narrow actuation seam between the profile and the devices.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Corrective actions a profile can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Run the mister for its configured hold.
    Humidify,
    MisterOn,
    MisterOff,
    /// Run both fan banks for the exchange hold.
    FanExchange,
    FansStop,
    LightsBrighter,
    LightsDarker,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Self::Humidify,
        Self::MisterOn,
        Self::MisterOff,
        Self::FanExchange,
        Self::FansStop,
        Self::LightsBrighter,
        Self::LightsDarker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Humidify => "humidify",
            Self::MisterOn => "mister_on",
            Self::MisterOff => "mister_off",
            Self::FanExchange => "fan_exchange",
            Self::FansStop => "fans_stop",
            Self::LightsBrighter => "lights_brighter",
            Self::LightsDarker => "lights_darker",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActuationError {
    #[error("No actuator configured for {0}")]
    Unavailable(Command),

    #[error("{command} failed: {reason}")]
    Failed { command: Command, reason: String },
}

impl ActuationError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Something that can carry out a [`Command`]. Calls may block.
pub trait Actuation {
    fn actuate(&mut self, command: Command) -> Result<(), ActuationError>;

    /// Whether `command` can be carried out at all.
    fn supports(&self, _command: Command) -> bool {
        true
    }
}

/// Records commands instead of acting on them. Used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingActuation {
    pub commands: Vec<Command>,
}

impl RecordingActuation {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Actuation for RecordingActuation {
    fn actuate(&mut self, command: Command) -> Result<(), ActuationError> {
        self.commands.push(command);
        Ok(())
    }
}
