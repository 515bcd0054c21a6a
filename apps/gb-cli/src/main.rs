use clap::{Parser, Subcommand};
use gb_app::{
    AppResult, CycleStage, LoopEvent, RunRequest, RuntimeEnv, compile_project, project_service,
    run_service,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "growbox")]
#[command(about = "Growbox - environmental control loop for grow tents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and structure
    Validate {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// List the fields sampled every cycle
    Fields {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// Begin the devices and run a single cycle
    Once {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// Run the control loop
    Run {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Stop after this many cycles (runs forever when omitted)
        #[arg(long)]
        cycles: Option<u64>,
        /// Exit on the first failure instead of restarting
        #[arg(long)]
        no_supervise: bool,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Fields { project_path } => cmd_fields(&project_path),
        Commands::Once { project_path } => cmd_once(&project_path),
        Commands::Run {
            project_path,
            cycles,
            no_supervise,
        } => cmd_run(&project_path, cycles, !no_supervise),
    }
}

fn project_dir(project_path: &Path) -> PathBuf {
    project_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = project_service::load_project(project_path)?;
    project_service::validate_project(&project)?;
    let env = RuntimeEnv::system().with_base_dir(project_dir(project_path));
    compile_project(&project, &env)?;
    println!("✓ Project is valid");
    Ok(())
}

fn cmd_fields(project_path: &Path) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let fields = project_service::list_fields(&project);

    if fields.is_empty() {
        println!("No fields configured");
    } else {
        println!("Fields in project '{}':", project.name);
        for field in fields {
            println!(
                "  {} <- {} ({} {})",
                field.column, field.field, field.device_type, field.device_id
            );
        }
    }
    Ok(())
}

fn cmd_once(project_path: &Path) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let env = RuntimeEnv::system().with_base_dir(project_dir(project_path));
    let mut growbox = compile_project(&project, &env)?.growbox;

    growbox.begin()?;
    let report = growbox.cycle()?;

    println!("Reading:");
    for (key, value) in report.reading.iter() {
        println!("  {key} = {value}");
    }
    for check in &report.evaluation.checks {
        println!("  {} {} -> {:?}", check.field, check.value, check.verdict);
    }
    if report.evaluation.commands.is_empty() {
        println!("✓ No action needed ({:.1} s)", report.elapsed_s);
    } else {
        let commands: Vec<&str> = report.evaluation.commands.iter().map(|c| c.as_str()).collect();
        println!(
            "✓ Issued {} ({:.1} s)",
            commands.join(", "),
            report.elapsed_s
        );
    }
    Ok(())
}

fn render_event(event: &LoopEvent) {
    match event.stage {
        CycleStage::Completed => {
            let commands: Vec<&str> = event.commands.iter().map(|c| c.as_str()).collect();
            let actions = if commands.is_empty() {
                "-".to_string()
            } else {
                commands.join(", ")
            };
            match event.sleep {
                Some(sleep) => println!(
                    "  cycle {:>5}  {:>6.1} s  actions: {}  (next in {:.1} s)",
                    event.cycle,
                    event.elapsed_s,
                    actions,
                    sleep.as_secs_f64()
                ),
                None => println!(
                    "  cycle {:>5}  {:>6.1} s  actions: {}",
                    event.cycle, event.elapsed_s, actions
                ),
            }
        }
        CycleStage::Restarting => {
            println!(
                "  restarting: {}",
                event.message.as_deref().unwrap_or("unknown failure")
            );
        }
        _ => {}
    }
}

fn cmd_run(project_path: &Path, cycles: Option<u64>, supervise: bool) -> AppResult<()> {
    println!("Running project: {}", project_path.display());
    if let Some(n) = cycles {
        println!("  cycles = {n}");
    }

    let request = RunRequest {
        project_path,
        cycles,
        supervise,
    };
    tracing::debug!(?cycles, supervise, "run requested");
    let env = RuntimeEnv::system();
    let response = run_service::run_project(&request, &env, Some(&mut |event| render_event(&event)))?;

    println!(
        "✓ {} finished {} cycle(s) after {} restart(s)",
        response.project_name, response.cycles, response.restarts
    );
    Ok(())
}
