//! Project schema definitions.

use std::collections::BTreeMap;
use std::path::PathBuf;

use gb_core::{FieldKind, Value};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CADENCE_S: f64 = 10.0;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RELAY_ADDRESS: u8 = 0x6D;
pub const JUMPER_RELAY_ADDRESS: u8 = 0x6C;
pub const RELAY_CHANNELS: u8 = 4;

fn default_cadence() -> f64 {
    DEFAULT_CADENCE_S
}

fn default_retry_attempts() -> u32 {
    DEFAULT_RETRY_ATTEMPTS
}

fn default_relay_address() -> u8 {
    DEFAULT_RELAY_ADDRESS
}

fn default_true() -> bool {
    true
}

fn default_humidify_s() -> f64 {
    10.0
}

fn default_exchange_s() -> f64 {
    60.0
}

fn default_restart_delay_s() -> f64 {
    5.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default = "default_cadence")]
    pub cadence_s: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogDef>,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default)]
    pub devices: Vec<DeviceDef>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub actuators: ActuatorsDef,
    #[serde(default)]
    pub profile: ProfileDef,
    #[serde(default)]
    pub supervisor: SupervisorDef,
}

impl Project {
    pub fn device(&self, id: &str) -> Option<&DeviceDef> {
        self.devices.iter().find(|d| d.id == id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Csv,
    Jsonl,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogDef {
    pub format: LogFormat,
    pub path: PathBuf,
    /// Write a header row when the file is empty (CSV only).
    #[serde(default = "default_true")]
    pub header: bool,
    /// Prefix each row with the local time.
    #[serde(default)]
    pub timestamp: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceDef {
    pub id: String,
    pub kind: DeviceKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceKind {
    /// Sensor reporting fixed values, for dry runs.
    SimulatedSensor {
        #[serde(default)]
        values: BTreeMap<FieldKind, Value>,
    },
    /// Quad relay board. Boards on the same bus share it.
    QuadRelay {
        bus: BusDef,
        #[serde(default = "default_relay_address")]
        address: u8,
        /// Address jumper closed: the board answers at 0x6C instead of `address`.
        #[serde(default)]
        jumper: bool,
    },
}

impl DeviceKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SimulatedSensor { .. } => "simulated_sensor",
            Self::QuadRelay { .. } => "quad_relay",
        }
    }
}

/// The bus a board is attached to.
///
/// A bare name (`bus: main`) is an emulated bus, shared by every board that
/// names it. The long form selects the kind explicitly:
///
/// ```yaml
/// bus: { type: i2c, path: /dev/i2c-1 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum BusDef {
    Named(String),
    Typed(BusKind),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusKind {
    /// In-process board emulation, for dry runs.
    Emulated { name: String },
    /// Linux i2c-dev character device, e.g. `/dev/i2c-1`.
    I2c { path: PathBuf },
}

impl BusDef {
    pub fn emulated(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn i2c(path: impl Into<PathBuf>) -> Self {
        Self::Typed(BusKind::I2c { path: path.into() })
    }

    /// The bus with the short form resolved.
    pub fn kind(&self) -> BusKind {
        match self {
            Self::Named(name) => BusKind::Emulated { name: name.clone() },
            Self::Typed(kind) => kind.clone(),
        }
    }
}

impl std::fmt::Display for BusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Emulated { name } => write!(f, "emulated:{name}"),
            Self::I2c { path } => write!(f, "i2c:{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDef {
    pub field: FieldKind,
    pub device: String,
    /// Column name; defaults to the field kind's name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl FieldDef {
    pub fn column(&self) -> &str {
        self.name.as_deref().unwrap_or(self.field.as_str())
    }

    /// Whether the column is the field kind's own name.
    pub fn is_default_column(&self) -> bool {
        self.column() == self.field.as_str()
    }
}

/// One relay channel, numbered 1..=4 as printed on the board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelDef {
    pub relay: String,
    pub channel: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActuatorsDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mister: Option<MisterDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fans: Option<FansDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lights: Option<LightsDef>,
}

impl ActuatorsDef {
    /// Every relay channel used, with the actuator using it.
    pub fn channels(&self) -> Vec<(&'static str, ChannelDef)> {
        let mut out = Vec::new();
        if let Some(mister) = &self.mister {
            out.push(("mister", mister.channel_def()));
        }
        if let Some(fans) = &self.fans {
            out.extend(fans.upper.iter().map(|c| ("fans.upper", c.clone())));
            out.extend(fans.lower.iter().map(|c| ("fans.lower", c.clone())));
        }
        if let Some(lights) = &self.lights {
            out.push(("lights", lights.channel_def()));
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MisterDef {
    pub relay: String,
    pub channel: u8,
    #[serde(default = "default_humidify_s")]
    pub humidify_s: f64,
}

impl MisterDef {
    pub fn channel_def(&self) -> ChannelDef {
        ChannelDef {
            relay: self.relay.clone(),
            channel: self.channel,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FansDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<ChannelDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<ChannelDef>,
    #[serde(default = "default_exchange_s")]
    pub exchange_s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LightsDef {
    pub relay: String,
    pub channel: u8,
}

impl LightsDef {
    pub fn channel_def(&self) -> ChannelDef {
        ChannelDef {
            relay: self.relay.clone(),
            channel: self.channel,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PolarityDef {
    #[default]
    Inside,
    Outside,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThresholdDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minval: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxval: Option<f64>,
    #[serde(default)]
    pub polarity: PolarityDef,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileDef {
    /// Monitored variable (lux, humidity, co2) to threshold.
    #[serde(default)]
    pub thresholds: BTreeMap<String, ThresholdDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_exchange_s: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupervisorDef {
    #[serde(default = "default_restart_delay_s")]
    pub restart_delay_s: f64,
    /// Unlimited when absent.
    #[serde(default)]
    pub max_restarts: Option<u32>,
}

impl Default for SupervisorDef {
    fn default() -> Self {
        Self {
            restart_delay_s: default_restart_delay_s(),
            max_restarts: None,
        }
    }
}
