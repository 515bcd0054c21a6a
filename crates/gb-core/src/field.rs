//! Telemetry field kinds.
//!
//! Devices advertise which field kinds they can report, and readings,
//! profiles and project files refer to fields through this enumeration.
//! Field names are resolved once when a project is loaded, so a misspelled
//! field fails at startup rather than at the first poll.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named piece of telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Air temperature in degrees Celsius.
    Celsius,
    /// Air temperature in degrees Fahrenheit.
    Fahrenheit,
    /// Relative humidity in percent.
    Humidity,
    /// Barometric pressure in hPa.
    Pressure,
    /// Equivalent CO2 in ppm.
    Co2,
    /// Total volatile organic compounds in ppb.
    Tvoc,
    /// Illuminance in lux.
    Lux,
    /// Raw infrared light level.
    Infrared,
    /// Raw visible light level.
    Visible,
    /// Raw full spectrum (visible + infrared) level.
    FullSpectrum,
    /// UVA intensity.
    Uva,
    /// UVB intensity.
    Uvb,
    /// UV index.
    UvIndex,
    /// Per-relay status of a relay bank (grouped).
    Relays,
    /// Per-bank fan status (grouped).
    Fans,
    /// Light switch status.
    Lights,
}

impl FieldKind {
    pub const ALL: [FieldKind; 16] = [
        Self::Celsius,
        Self::Fahrenheit,
        Self::Humidity,
        Self::Pressure,
        Self::Co2,
        Self::Tvoc,
        Self::Lux,
        Self::Infrared,
        Self::Visible,
        Self::FullSpectrum,
        Self::Uva,
        Self::Uvb,
        Self::UvIndex,
        Self::Relays,
        Self::Fans,
        Self::Lights,
    ];

    /// Canonical field name, used as the reading key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Celsius => "celsius",
            Self::Fahrenheit => "fahrenheit",
            Self::Humidity => "humidity",
            Self::Pressure => "pressure",
            Self::Co2 => "co2",
            Self::Tvoc => "tvoc",
            Self::Lux => "lux",
            Self::Infrared => "infrared",
            Self::Visible => "visible",
            Self::FullSpectrum => "full_spectrum",
            Self::Uva => "uva",
            Self::Uvb => "uvb",
            Self::UvIndex => "uv_index",
            Self::Relays => "relays",
            Self::Fans => "fans",
            Self::Lights => "lights",
        }
    }

    /// Whether devices report this field as a group of named sub-values.
    pub fn is_grouped(&self) -> bool {
        matches!(self, Self::Relays | Self::Fans)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown field '{}'", self.0)
    }
}

impl std::error::Error for UnknownField {}

impl FromStr for FieldKind {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}
