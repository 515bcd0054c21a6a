//! The sampling and control loop.
//!
//! Each cycle samples every field, appends the reading to the log, lets the
//! profile evaluate it (actuating as needed) and then sleeps out the rest of
//! the cadence. Nothing inside a cycle is caught: the first error ends the
//! run, and restarting is the supervisor's business.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use gb_controls::{Actuation, Evaluation, Profile};
use gb_core::{Clock, Reading, Sleeper};
use gb_devices::DeviceHandle;
use gb_results::{ReadingSink, SinkSpec};

use crate::aggregator::SampleAggregator;
use crate::error::{AppError, AppResult};
use crate::progress::{CycleStage, LoopEvent, emit};

pub const DEFAULT_CADENCE: Duration = Duration::from_secs(10);

/// Time left in the cadence after a cycle that took `elapsed_s`.
///
/// `None` when the cycle overran the cadence; the next one starts at once
/// and no cycles are skipped to catch up.
pub fn cadence_sleep(cadence: Duration, elapsed_s: f64) -> Option<Duration> {
    let remaining = cadence.as_secs_f64() - elapsed_s;
    if remaining > 0.0 {
        Duration::try_from_secs_f64(remaining).ok()
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u64,
    pub reading: Reading,
    pub evaluation: Evaluation,
    pub elapsed_s: f64,
}

pub struct GrowBox {
    devices: Vec<DeviceHandle>,
    aggregator: SampleAggregator,
    profile: Profile,
    actuation: Box<dyn Actuation>,
    sink_spec: SinkSpec,
    sink: Option<Box<dyn ReadingSink>>,
    clock: Rc<dyn Clock>,
    sleeper: Rc<dyn Sleeper>,
    cadence: Duration,
    begun: bool,
    cycles: u64,
}

impl fmt::Debug for GrowBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let devices: Vec<String> = self
            .devices
            .iter()
            .map(|d| d.borrow().name().to_string())
            .collect();
        f.debug_struct("GrowBox")
            .field("devices", &devices)
            .field("columns", &self.aggregator.columns())
            .field("profile", &self.profile)
            .field("sink", &self.sink_spec.describe())
            .field("cadence", &self.cadence)
            .field("begun", &self.begun)
            .field("cycles", &self.cycles)
            .finish()
    }
}

impl GrowBox {
    /// Wires a loop together, failing fast when the profile needs a field
    /// the aggregator does not sample or a command nothing can carry out.
    ///
    /// Devices behind the sampled fields are registered for `begin()`;
    /// actuator-only devices are added with [`GrowBox::with_device`].
    pub fn new(
        aggregator: SampleAggregator,
        profile: Profile,
        actuation: Box<dyn Actuation>,
        sink: SinkSpec,
        clock: Rc<dyn Clock>,
        sleeper: Rc<dyn Sleeper>,
    ) -> AppResult<Self> {
        for field in profile.required_fields() {
            if !aggregator.provides(field.as_str()) {
                return Err(AppError::Configuration(format!(
                    "profile checks '{field}' but no sampled field is named '{field}'"
                )));
            }
        }
        for command in profile.required_commands() {
            if !actuation.supports(command) {
                return Err(AppError::Configuration(format!(
                    "profile may issue '{command}' but no actuator handles it"
                )));
            }
        }

        let mut growbox = Self {
            devices: Vec::new(),
            aggregator,
            profile,
            actuation,
            sink_spec: sink,
            sink: None,
            clock,
            sleeper,
            cadence: DEFAULT_CADENCE,
            begun: false,
            cycles: 0,
        };
        let sampled: Vec<DeviceHandle> = growbox
            .aggregator
            .fields()
            .iter()
            .map(|f| f.device.clone())
            .collect();
        for device in sampled {
            growbox.register(device);
        }
        Ok(growbox)
    }

    pub fn with_cadence(mut self, cadence: Duration) -> Self {
        self.cadence = cadence;
        self
    }

    /// Adds a device to `begin()`. Registering the same handle twice is a no-op.
    pub fn with_device(mut self, device: DeviceHandle) -> Self {
        self.register(device);
        self
    }

    fn register(&mut self, device: DeviceHandle) {
        if !self.devices.iter().any(|d| Rc::ptr_eq(d, &device)) {
            self.devices.push(device);
        }
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    pub fn aggregator(&self) -> &SampleAggregator {
        &self.aggregator
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn sink_spec(&self) -> &SinkSpec {
        &self.sink_spec
    }

    pub fn is_begun(&self) -> bool {
        self.begun
    }

    /// Cycles completed since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// One-time device setup. Later calls do nothing.
    pub fn begin(&mut self) -> AppResult<()> {
        if self.begun {
            tracing::debug!("devices already initialized");
            return Ok(());
        }
        for device in &self.devices {
            let mut device = device.borrow_mut();
            tracing::debug!(device = %device.name(), "begin");
            device.begin()?;
        }
        self.begun = true;
        tracing::info!(devices = self.devices.len(), "devices initialized");
        Ok(())
    }

    fn open_sink(&mut self) -> AppResult<&mut Box<dyn ReadingSink>> {
        let sink = match self.sink.take() {
            Some(sink) => sink,
            None => {
                tracing::info!(sink = %self.sink_spec.describe(), "opening log");
                self.sink_spec.open()?
            }
        };
        Ok(self.sink.insert(sink))
    }

    /// Runs a single cycle without sleeping afterwards, beginning devices first if needed.
    pub fn cycle(&mut self) -> AppResult<CycleReport> {
        self.begin()?;
        self.cycle_observed(&mut None)
    }

    fn cycle_observed(
        &mut self,
        observer: &mut Option<&mut dyn FnMut(LoopEvent)>,
    ) -> AppResult<CycleReport> {
        let cycle = self.cycles;
        let start = self.clock.now_s();

        emit(observer, LoopEvent::stage(CycleStage::Sampling, cycle, 0.0));
        let reading = self.aggregator.sample()?;

        emit(
            observer,
            LoopEvent::stage(CycleStage::Logging, cycle, self.clock.now_s() - start),
        );
        self.open_sink()?.append(&reading)?;

        let now_s = self.clock.now_s();
        emit(
            observer,
            LoopEvent::stage(CycleStage::Evaluating, cycle, now_s - start),
        );
        let evaluation = self
            .profile
            .evaluate(&reading, now_s, &mut *self.actuation)?;

        let elapsed_s = self.clock.now_s() - start;
        self.cycles += 1;
        tracing::info!(
            cycle,
            elapsed_s,
            commands = ?evaluation.commands,
            "cycle complete"
        );
        Ok(CycleReport {
            cycle,
            reading,
            evaluation,
            elapsed_s,
        })
    }

    /// Loops until an error. Never returns `Ok`.
    ///
    /// Devices are begun first if nobody has done so yet.
    pub fn run(&mut self) -> AppResult<()> {
        self.run_for(None).map(|_| ())
    }

    /// Runs `limit` cycles (forever when `None`) and returns how many completed.
    pub fn run_for(&mut self, limit: Option<u64>) -> AppResult<u64> {
        self.run_with_observer(limit, None)
    }

    /// Like [`GrowBox::run_for`], streaming a [`LoopEvent`] per stage.
    ///
    /// No sleep follows the last cycle of a bounded run.
    pub fn run_with_observer(
        &mut self,
        limit: Option<u64>,
        mut observer: Option<&mut dyn FnMut(LoopEvent)>,
    ) -> AppResult<u64> {
        self.run_observed(limit, &mut observer)
    }

    pub(crate) fn run_observed(
        &mut self,
        limit: Option<u64>,
        observer: &mut Option<&mut dyn FnMut(LoopEvent)>,
    ) -> AppResult<u64> {
        self.begin()?;
        self.open_sink()?;
        tracing::info!(cadence_s = self.cadence.as_secs_f64(), ?limit, "loop started");

        let mut done = 0;
        while limit.is_none_or(|n| done < n) {
            let report = self.cycle_observed(observer)?;
            done += 1;

            let last = limit.is_some_and(|n| done >= n);
            let sleep = if last {
                None
            } else {
                cadence_sleep(self.cadence, report.elapsed_s)
            };

            let mut event = LoopEvent::stage(CycleStage::Completed, report.cycle, report.elapsed_s);
            event.commands = report.evaluation.commands;
            event.sleep = sleep;
            emit(observer, event);

            match sleep {
                Some(duration) => {
                    let mut event =
                        LoopEvent::stage(CycleStage::Sleeping, report.cycle, report.elapsed_s);
                    event.sleep = Some(duration);
                    emit(observer, event);
                    self.sleeper.sleep(duration);
                }
                None if !last => {
                    tracing::warn!(
                        elapsed_s = report.elapsed_s,
                        cadence_s = self.cadence.as_secs_f64(),
                        "cycle overran cadence"
                    );
                }
                None => {}
            }
        }
        Ok(done)
    }
}
