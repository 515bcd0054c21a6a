//! Running a project file end to end.

use std::path::Path;

use crate::error::AppResult;
use crate::progress::LoopEvent;
use crate::project_service::load_project;
use crate::runtime_compile::{RuntimeEnv, compile_project};
use crate::supervisor::{RestartPolicy, RunOutcome, Supervisor};

#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    pub project_path: &'a Path,
    /// Forever when `None`.
    pub cycles: Option<u64>,
    /// Restart on retryable failures per the project's supervisor settings.
    pub supervise: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResponse {
    pub project_name: String,
    pub cycles: u64,
    pub restarts: u32,
}

/// Load, compile and run a project.
///
/// Relative log paths resolve against the project file's directory.
pub fn run_project(
    request: &RunRequest<'_>,
    env: &RuntimeEnv,
    mut observer: Option<&mut dyn FnMut(LoopEvent)>,
) -> AppResult<RunResponse> {
    let project = load_project(request.project_path)?;
    let mut env = env.clone();
    if let Some(dir) = request.project_path.parent() {
        env.base_dir = dir.to_path_buf();
    }

    let outcome = if request.supervise {
        let policy = RestartPolicy::from_def(&project.supervisor)?;
        tracing::info!(
            project = %project.name,
            restart_delay_s = policy.restart_delay.as_secs_f64(),
            max_restarts = ?policy.max_restarts,
            "supervised run"
        );
        Supervisor::new(policy, &*env.sleeper)
            .with_cycle_limit(request.cycles)
            .run(
                || compile_project(&project, &env).map(|compiled| compiled.growbox),
                observer,
            )?
    } else {
        let mut growbox = compile_project(&project, &env)?.growbox;
        growbox.begin()?;
        let cycles = growbox.run_observed(request.cycles, &mut observer)?;
        RunOutcome {
            cycles,
            restarts: 0,
        }
    };

    Ok(RunResponse {
        project_name: project.name.clone(),
        cycles: outcome.cycles,
        restarts: outcome.restarts,
    })
}
