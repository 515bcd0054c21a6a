//! Restart-on-failure wrapper around the loop.
//!
//! Each attempt builds a fresh [`GrowBox`], begins it and runs it. Transport
//! and device failures restart the whole thing after a delay; configuration
//! errors are returned at once since another attempt would fail the same way.

use std::time::Duration;

use gb_core::Sleeper;
use gb_project::SupervisorDef;

use crate::error::{AppError, AppResult};
use crate::growbox::GrowBox;
use crate::progress::{CycleStage, LoopEvent, emit};

pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    pub restart_delay: Duration,
    /// Unlimited when `None`.
    pub max_restarts: Option<u32>,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            restart_delay: DEFAULT_RESTART_DELAY,
            max_restarts: None,
        }
    }
}

impl RestartPolicy {
    pub fn from_def(def: &SupervisorDef) -> AppResult<Self> {
        let restart_delay = Duration::try_from_secs_f64(def.restart_delay_s).map_err(|e| {
            AppError::Configuration(format!("supervisor.restart_delay_s: {e}"))
        })?;
        Ok(Self {
            restart_delay,
            max_restarts: def.max_restarts,
        })
    }

    fn allows(&self, restarts: u32) -> bool {
        self.max_restarts.is_none_or(|max| restarts < max)
    }
}

/// How a supervised run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Cycles completed by the final attempt.
    pub cycles: u64,
    pub restarts: u32,
}

#[derive(Debug)]
pub struct Supervisor<'s> {
    policy: RestartPolicy,
    sleeper: &'s dyn Sleeper,
    cycle_limit: Option<u64>,
}

impl<'s> Supervisor<'s> {
    pub fn new(policy: RestartPolicy, sleeper: &'s dyn Sleeper) -> Self {
        Self {
            policy,
            sleeper,
            cycle_limit: None,
        }
    }

    /// Stop successfully once one attempt completes `cycles` cycles.
    pub fn with_cycle_limit(mut self, cycles: Option<u64>) -> Self {
        self.cycle_limit = cycles;
        self
    }

    /// Runs attempts until one finishes its cycles or a failure is final.
    pub fn run(
        &self,
        mut build: impl FnMut() -> AppResult<GrowBox>,
        mut observer: Option<&mut dyn FnMut(LoopEvent)>,
    ) -> AppResult<RunOutcome> {
        let mut restarts = 0;
        loop {
            let attempt = build().and_then(|mut growbox| {
                emit(&mut observer, LoopEvent::stage(CycleStage::Beginning, 0, 0.0));
                growbox.begin()?;
                growbox.run_observed(self.cycle_limit, &mut observer)
            });
            let err = match attempt {
                Ok(cycles) => {
                    tracing::info!(cycles, restarts, "loop finished");
                    return Ok(RunOutcome { cycles, restarts });
                }
                Err(err) => err,
            };

            if err.is_configuration() {
                tracing::error!(error = %err, "configuration error, not restarting");
                return Err(err);
            }
            if !self.policy.allows(restarts) {
                tracing::error!(error = %err, restarts, "restart limit reached");
                return Err(err);
            }

            restarts += 1;
            tracing::error!(
                error = %err,
                restart = restarts,
                delay_s = self.policy.restart_delay.as_secs_f64(),
                "loop failed, restarting"
            );
            emit(
                &mut observer,
                LoopEvent::stage(CycleStage::Restarting, 0, 0.0).with_message(err.to_string()),
            );
            self.sleeper.sleep(self.policy.restart_delay);
        }
    }
}

/// Build, begin and run forever, restarting on retryable failures.
pub fn supervise(
    build: impl FnMut() -> AppResult<GrowBox>,
    policy: RestartPolicy,
    sleeper: &dyn Sleeper,
) -> AppResult<RunOutcome> {
    Supervisor::new(policy, sleeper).run(build, None)
}
