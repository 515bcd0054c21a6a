//! Shared application service layer for growbox.
//!
//! Turns a project file into a running control loop: runtime compilation
//! of devices, buses and actuators, sample aggregation, the `GrowBox` loop
//! itself, loop events for frontends, and the restart supervisor.

pub mod actuators;
pub mod aggregator;
pub mod error;
pub mod growbox;
pub mod progress;
pub mod project_service;
pub mod run_service;
pub mod runtime_compile;
pub mod supervisor;

// Re-export key types for convenience
pub use actuators::Actuators;
pub use aggregator::{FieldSpec, SampleAggregator};
pub use error::{AppError, AppResult};
pub use growbox::{CycleReport, DEFAULT_CADENCE, GrowBox, cadence_sleep};
pub use progress::{CycleStage, LoopEvent};
pub use project_service::{FieldSummary, list_fields, load_project, validate_project};
pub use run_service::{RunRequest, RunResponse, run_project};
pub use runtime_compile::{CompiledProject, RuntimeEnv, compile_project};
pub use supervisor::{RestartPolicy, RunOutcome, Supervisor, supervise};
