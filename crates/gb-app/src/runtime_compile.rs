//! Runtime compilation of a project into a runnable [`GrowBox`].
//!
//! Relay boards on an emulated bus get one [`QuadRelayBoard`] per distinct
//! `(bus, address)` pair, shared by all relay devices that resolve to it.
//! Boards on an i2c bus share one opened i2c-dev handle per path.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use gb_controls::{Polarity, Profile, ProfileConfig, ThresholdSpec};
use gb_core::{Clock, MonotonicClock, Sleeper, ThreadSleeper};
use gb_devices::{
    DeviceHandle, FanBank, Lights, Mister, QuadRelay, QuadRelayBoard, RelayChannel,
    SimulatedSensor, Switch, handle,
};
use gb_project::{
    BusKind, ChannelDef, DeviceKind, JUMPER_RELAY_ADDRESS, LogDef, LogFormat, PolarityDef,
    Project, ThresholdDef,
};
use gb_results::{CsvOptions, SinkSpec};
use gb_wire::{Bus, RetryPolicy, SharedBus, Wire, open_i2cdev, shared};

use crate::actuators::Actuators;
use crate::aggregator::{FieldSpec, SampleAggregator};
use crate::error::{AppError, AppResult};
use crate::growbox::GrowBox;

/// Relay driver over whichever bus the project names.
pub type RelayDriver = QuadRelay<Box<dyn Bus>>;

/// Time, sleeping and output for a compiled loop.
#[derive(Debug, Clone)]
pub struct RuntimeEnv {
    pub clock: Rc<dyn Clock>,
    pub sleeper: Rc<dyn Sleeper>,
    /// Relative log paths resolve against this directory.
    pub base_dir: PathBuf,
    /// Replaces the project's log when set.
    pub sink: Option<SinkSpec>,
}

impl RuntimeEnv {
    pub fn new(clock: Rc<dyn Clock>, sleeper: Rc<dyn Sleeper>) -> Self {
        Self {
            clock,
            sleeper,
            base_dir: PathBuf::from("."),
            sink: None,
        }
    }

    /// Wall-clock time and real sleeps.
    pub fn system() -> Self {
        Self::new(Rc::new(MonotonicClock::new()), Rc::new(ThreadSleeper))
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_sink(mut self, sink: SinkSpec) -> Self {
        self.sink = Some(sink);
        self
    }
}

/// A compiled loop plus handles on its simulated hardware.
#[derive(Debug)]
pub struct CompiledProject {
    pub growbox: GrowBox,
    /// Simulated sensors by device id. Clones share values with the loop.
    pub sensors: BTreeMap<String, SimulatedSensor>,
    /// Emulated board behind each relay device on an emulated bus, by device id.
    pub boards: BTreeMap<String, SharedBus<QuadRelayBoard>>,
    pub actuators: ActuatorHandles,
}

/// The actuator devices handed to the profile.
#[derive(Debug, Default, Clone)]
pub struct ActuatorHandles {
    pub mister: Option<Rc<RefCell<Mister>>>,
    pub fans: Option<Rc<RefCell<FanBank>>>,
    pub lights: Option<Rc<RefCell<Lights>>>,
}

fn seconds(what: &str, value: f64) -> AppResult<Duration> {
    Duration::try_from_secs_f64(value).map_err(|e| AppError::Compile(format!("{what}: {e}")))
}

pub fn threshold_spec(def: &ThresholdDef) -> ThresholdSpec {
    ThresholdSpec {
        minval: def.minval,
        maxval: def.maxval,
        polarity: match def.polarity {
            PolarityDef::Inside => Polarity::Inside,
            PolarityDef::Outside => Polarity::Outside,
        },
    }
}

/// Resolves the project's log relative to `base_dir`. No log discards readings.
pub fn sink_for(log: Option<&LogDef>, base_dir: &Path) -> SinkSpec {
    let Some(log) = log else {
        return SinkSpec::Discard;
    };
    let path = base_dir.join(&log.path);
    match log.format {
        LogFormat::Csv => SinkSpec::Csv {
            path,
            options: CsvOptions {
                header: log.header,
                timestamp: log.timestamp,
            },
        },
        LogFormat::Jsonl => SinkSpec::Jsonl {
            path,
            timestamp: log.timestamp,
        },
    }
}

fn relay_switch(
    relays: &BTreeMap<String, Rc<RefCell<RelayDriver>>>,
    channel: &ChannelDef,
) -> AppResult<Box<dyn Switch>> {
    let relay = relays
        .get(&channel.relay)
        .ok_or_else(|| AppError::Compile(format!("Relay not found: {}", channel.relay)))?;
    let index = usize::from(channel.channel)
        .checked_sub(1)
        .ok_or_else(|| {
            AppError::Compile(format!("Relay channel {} is numbered from 1", channel.channel))
        })?;
    Ok(Box::new(RelayChannel::new(relay.clone(), index)?))
}

/// Compile a project definition into a ready-to-begin loop.
pub fn compile_project(project: &Project, env: &RuntimeEnv) -> AppResult<CompiledProject> {
    gb_project::validate_project(project)?;
    let policy =
        RetryPolicy::new(project.retry_attempts).map_err(|e| AppError::Compile(e.to_string()))?;

    let mut handles: BTreeMap<String, DeviceHandle> = BTreeMap::new();
    let mut ordered: Vec<DeviceHandle> = Vec::new();
    let mut sensors = BTreeMap::new();
    let mut relays = BTreeMap::new();
    let mut boards = BTreeMap::new();
    let mut emulated: BTreeMap<(String, u8), SharedBus<QuadRelayBoard>> = BTreeMap::new();
    let mut hardware: BTreeMap<PathBuf, SharedBus<dyn Bus>> = BTreeMap::new();

    // Build devices
    for def in &project.devices {
        let device: DeviceHandle = match &def.kind {
            DeviceKind::SimulatedSensor { values } => {
                let sensor = values
                    .iter()
                    .fold(SimulatedSensor::new(&def.id), |s, (field, value)| {
                        s.with_value(*field, value.clone())
                    });
                sensors.insert(def.id.clone(), sensor.clone());
                handle(sensor)
            }
            DeviceKind::QuadRelay {
                bus,
                address,
                jumper,
            } => {
                let effective = if *jumper {
                    JUMPER_RELAY_ADDRESS
                } else {
                    *address
                };
                let line: Box<dyn Bus> = match bus.kind() {
                    BusKind::Emulated { name } => {
                        let board = emulated
                            .entry((name, effective))
                            .or_insert_with(|| shared(QuadRelayBoard::new(effective)))
                            .clone();
                        boards.insert(def.id.clone(), board.clone());
                        Box::new(board)
                    }
                    BusKind::I2c { path } => {
                        let path = env.base_dir.join(path);
                        let opened = match hardware.get(&path) {
                            Some(opened) => opened.clone(),
                            None => {
                                let opened = open_i2cdev(&path)
                                    .map_err(|e| AppError::Compile(format!("{}: {e}", def.id)))?;
                                hardware.insert(path, opened.clone());
                                opened
                            }
                        };
                        Box::new(opened)
                    }
                };
                tracing::debug!(device = %def.id, bus = %bus.kind(), address = effective, "relay board bound");
                let wire =
                    Wire::with_jumper(line, *address, JUMPER_RELAY_ADDRESS, *jumper, policy)
                        .map_err(|e| AppError::Compile(format!("{}: {e}", def.id)))?;
                let relay = handle(QuadRelay::new(&def.id, wire));
                relays.insert(def.id.clone(), relay.clone());
                relay
            }
        };
        handles.insert(def.id.clone(), device.clone());
        ordered.push(device);
    }

    // Build fields
    let mut specs = Vec::with_capacity(project.fields.len());
    for field in &project.fields {
        let device = handles
            .get(&field.device)
            .ok_or_else(|| AppError::Compile(format!("Device not found: {}", field.device)))?;
        specs.push(FieldSpec::named(field.column(), field.field, device.clone()));
    }
    let aggregator = SampleAggregator::new(specs)?;

    // Build actuators
    let mut actuators = Actuators::new();
    let mut outputs = ActuatorHandles::default();
    if let Some(def) = &project.actuators.mister {
        let mister = handle(
            Mister::new(
                "mister",
                relay_switch(&relays, &def.channel_def())?,
                env.sleeper.clone(),
            )
            .with_humidify(seconds("actuators.mister.humidify_s", def.humidify_s)?),
        );
        actuators = actuators.with_mister(mister.clone());
        outputs.mister = Some(mister);
    }
    if let Some(def) = &project.actuators.fans {
        let upper = def
            .upper
            .iter()
            .map(|c| relay_switch(&relays, c))
            .collect::<AppResult<Vec<_>>>()?;
        let lower = def
            .lower
            .iter()
            .map(|c| relay_switch(&relays, c))
            .collect::<AppResult<Vec<_>>>()?;
        let fans = handle(
            FanBank::new("fans", upper, lower, env.sleeper.clone())?
                .with_exchange(seconds("actuators.fans.exchange_s", def.exchange_s)?),
        );
        actuators = actuators.with_fans(fans.clone());
        outputs.fans = Some(fans);
    }
    if let Some(def) = &project.actuators.lights {
        let lights = handle(Lights::new(
            "lights",
            relay_switch(&relays, &def.channel_def())?,
        ));
        actuators = actuators.with_lights(lights.clone());
        outputs.lights = Some(lights);
    }

    // Build profile
    let thresholds: Vec<(&str, ThresholdSpec)> = project
        .profile
        .thresholds
        .iter()
        .map(|(name, def)| (name.as_str(), threshold_spec(def)))
        .collect();
    let config = ProfileConfig::from_thresholds(
        thresholds.iter().map(|(name, spec)| (*name, spec)),
        project.profile.air_exchange_s,
    )?;
    let profile = Profile::configure(&config, env.clock.now_s())?;

    let sink = env
        .sink
        .clone()
        .unwrap_or_else(|| sink_for(project.log.as_ref(), &env.base_dir));

    let mut growbox = GrowBox::new(
        aggregator,
        profile,
        Box::new(actuators),
        sink,
        env.clock.clone(),
        env.sleeper.clone(),
    )?
    .with_cadence(seconds("cadence_s", project.cadence_s)?);
    for device in ordered {
        growbox = growbox.with_device(device);
    }
    if let Some(mister) = &outputs.mister {
        growbox = growbox.with_device(mister.clone());
    }
    if let Some(fans) = &outputs.fans {
        growbox = growbox.with_device(fans.clone());
    }
    if let Some(lights) = &outputs.lights {
        growbox = growbox.with_device(lights.clone());
    }

    tracing::info!(
        project = %project.name,
        devices = project.devices.len(),
        fields = project.fields.len(),
        sink = %growbox.sink_spec().describe(),
        "project compiled"
    );

    Ok(CompiledProject {
        growbox,
        sensors,
        boards,
        actuators: outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn missing_log_discards() {
        assert!(matches!(
            sink_for(None, Path::new("/tmp")),
            SinkSpec::Discard
        ));
    }

    #[test]
    fn relative_log_resolves_against_base_dir() {
        let log = LogDef {
            format: LogFormat::Jsonl,
            path: PathBuf::from("logs/box.jsonl"),
            header: true,
            timestamp: false,
        };
        match sink_for(Some(&log), Path::new("/srv/growbox")) {
            SinkSpec::Jsonl { path, timestamp } => {
                assert_eq!(path, Path::new("/srv/growbox/logs/box.jsonl"));
                assert!(!timestamp);
            }
            other => panic!("unexpected sink {other:?}"),
        }
    }

    #[test]
    fn polarity_carries_over() {
        let def = ThresholdDef {
            minval: Some(2000.0),
            maxval: None,
            polarity: PolarityDef::Outside,
        };
        assert_eq!(
            threshold_spec(&def),
            ThresholdSpec::outside(Some(2000.0), None)
        );
    }
}
