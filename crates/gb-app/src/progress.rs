use std::time::Duration;

use gb_controls::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    Beginning,
    Sampling,
    Logging,
    Evaluating,
    Sleeping,
    Completed,
    Restarting,
}

#[derive(Debug, Clone)]
pub struct LoopEvent {
    pub stage: CycleStage,
    /// Zero-based index of the cycle since the loop (re)started.
    pub cycle: u64,
    /// Seconds since the cycle started.
    pub elapsed_s: f64,
    pub commands: Vec<Command>,
    pub sleep: Option<Duration>,
    pub message: Option<String>,
}

impl LoopEvent {
    pub fn stage(stage: CycleStage, cycle: u64, elapsed_s: f64) -> Self {
        Self {
            stage,
            cycle,
            elapsed_s,
            commands: Vec::new(),
            sleep: None,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

pub(crate) fn emit(observer: &mut Option<&mut dyn FnMut(LoopEvent)>, event: LoopEvent) {
    if let Some(cb) = observer.as_deref_mut() {
        cb(event);
    }
}
