//! Command-line interface for `plashboard`: `clap`
//! derive, one module's worth of subcommands grouped by concern. The binary
//! stays thin; `cli::run()` does the actual work of wiring config discovery
//! to the scheduler and dispatching subcommands.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use plashboard_runtime::{ApiResult, Scheduler};
use plashboard_utils::exit_codes::ExitCode;
use plashboard_utils::{DisplayProfilePatch, PlashboardError};
use serde::Serialize;

/// plashboard - template-driven dashboard publishing runtime
#[derive(Parser)]
#[command(name = "plashboard")]
#[command(about = "Schedules fill-merge-validate-publish runs against dashboard templates")]
#[command(version)]
pub struct Cli {
    /// Directory to start config discovery from (default: current directory)
    #[arg(long, global = true)]
    pub config_dir: Option<Utf8PathBuf>,

    /// Override the resolved data directory
    #[arg(long, global = true)]
    pub data_dir: Option<Utf8PathBuf>,

    /// Emit human-readable output instead of JSON
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the scheduler and block, ticking until interrupted
    Serve,

    /// Run one template immediately, bypassing the due-time gate
    RunNow {
        /// Template id to run
        id: String,
    },

    /// Show active template, template/enabled counts, and in-flight runs
    Status,

    /// Manage templates
    #[command(subcommand)]
    Template(TemplateCommand),

    /// Manage the display profile
    #[command(subcommand)]
    DisplayProfile(DisplayProfileCommand),
}

#[derive(Subcommand)]
pub enum TemplateCommand {
    /// List all templates
    List,

    /// Show one template by id
    Show {
        id: String,
    },

    /// Create a template from a JSON file
    Create {
        /// Path to a JSON file matching the template shape
        file: Utf8PathBuf,
    },

    /// Copy an existing template under a new id
    Copy {
        src_id: String,
        dst_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        activate: bool,
    },

    /// Delete a template
    Delete {
        id: String,
    },

    /// Activate a template (does not trigger a run)
    Activate {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum DisplayProfileCommand {
    /// Partially override the display profile; unset fields keep their
    /// current effective value
    Set {
        #[arg(long)]
        width_px: Option<u32>,
        #[arg(long)]
        height_px: Option<u32>,
        #[arg(long)]
        safe_top_px: Option<u32>,
        #[arg(long)]
        safe_bottom_px: Option<u32>,
        #[arg(long)]
        safe_side_px: Option<u32>,
        #[arg(long)]
        layout_safety_margin_px: Option<u32>,
    },
}

/// Build the `clap::Command`, used for shell-completion generation and for
/// snapshotting `--help` output in tests.
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}

/// Main CLI execution function. Handles all output, including errors; the
/// binary's `main` only maps the returned `ExitCode` to a process exit.
pub fn run() -> Result<(), ExitCode> {
    plashboard_utils::logging::init();
    let cli = Cli::parse();

    let start_dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => match Utf8PathBuf::from_path_buf(std::env::current_dir().unwrap_or_default()) {
            Ok(dir) => dir,
            Err(_) => {
                eprintln!("current directory is not valid UTF-8");
                return Err(ExitCode::ConfigError);
            }
        },
    };

    let mut config = plashboard_config::discover(&start_dir).map_err(|e| {
        eprintln!("{e}");
        e.to_exit_code()
    })?;
    if let Some(data_dir) = cli.data_dir.clone() {
        config.data_dir = data_dir;
        config.normalize();
    }

    let scheduler = Scheduler::new(config);
    scheduler.init().map_err(|e| {
        eprintln!("{e}");
        e.to_exit_code()
    })?;

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create async runtime: {e}");
            return Err(ExitCode::IoError);
        }
    };

    rt.block_on(async { dispatch(&scheduler, cli.command, cli.pretty).await })
}

async fn dispatch(scheduler: &Scheduler, command: Commands, pretty: bool) -> Result<(), ExitCode> {
    match command {
        Commands::Serve => serve(scheduler).await,
        Commands::RunNow { id } => {
            let artifact = scheduler.run_now(&id).await.map_err(|e| {
                eprintln!("{e}");
                e.to_exit_code()
            })?;
            let failed = !matches!(artifact.status, plashboard_store::RunStatus::Success);
            print_json(&artifact, pretty);
            if failed {
                return Err(ExitCode::RunFailed);
            }
            Ok(())
        }
        Commands::Status => {
            let result = scheduler.status().await;
            print_api_result(&result, pretty)
        }
        Commands::Template(cmd) => template_command(scheduler, cmd, pretty).await,
        Commands::DisplayProfile(cmd) => display_profile_command(scheduler, cmd, pretty),
    }
}

/// Start the tick loop and block until the process receives a shutdown
/// signal (`Ctrl+C`).
async fn serve(scheduler: &Scheduler) -> Result<(), ExitCode> {
    let handle = scheduler.start();
    tracing::info!("scheduler started");
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("failed to listen for shutdown signal");
    }
    Scheduler::stop(&handle);
    tracing::info!("scheduler stopped");
    Ok(())
}

async fn template_command(
    scheduler: &Scheduler,
    cmd: TemplateCommand,
    pretty: bool,
) -> Result<(), ExitCode> {
    match cmd {
        TemplateCommand::List => {
            let templates = scheduler.template_list().map_err(|e| {
                eprintln!("{e}");
                e.to_exit_code()
            })?;
            print_json(&templates, pretty);
            Ok(())
        }
        TemplateCommand::Show { id } => {
            let template = scheduler.template_get(&id).map_err(|e| {
                eprintln!("{e}");
                e.to_exit_code()
            })?;
            match template {
                Some(t) => {
                    print_json(&t, pretty);
                    Ok(())
                }
                None => {
                    let e = PlashboardError::TemplateNotFound { id };
                    eprintln!("{e}");
                    Err(e.to_exit_code())
                }
            }
        }
        TemplateCommand::Create { file } => {
            let text = std::fs::read_to_string(file.as_std_path()).map_err(|e| {
                eprintln!("failed to read {file}: {e}");
                ExitCode::IoError
            })?;
            let candidate: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
                eprintln!("failed to parse {file} as JSON: {e}");
                ExitCode::TemplateError
            })?;
            let result = scheduler.template_create(candidate).await;
            print_api_result(&result, pretty)
        }
        TemplateCommand::Copy {
            src_id,
            dst_id,
            name,
            activate,
        } => {
            let result = scheduler.template_copy(&src_id, &dst_id, name, activate).await;
            print_api_result(&result, pretty)
        }
        TemplateCommand::Delete { id } => {
            let result = scheduler.template_delete(&id);
            print_api_result(&result, pretty)
        }
        TemplateCommand::Activate { id } => {
            let result = scheduler.template_activate(&id);
            print_api_result(&result, pretty)
        }
    }
}

fn display_profile_command(
    scheduler: &Scheduler,
    cmd: DisplayProfileCommand,
    pretty: bool,
) -> Result<(), ExitCode> {
    match cmd {
        DisplayProfileCommand::Set {
            width_px,
            height_px,
            safe_top_px,
            safe_bottom_px,
            safe_side_px,
            layout_safety_margin_px,
        } => {
            let patch = DisplayProfilePatch {
                width_px,
                height_px,
                safe_top_px,
                safe_bottom_px,
                safe_side_px,
                layout_safety_margin_px,
            };
            let result = scheduler.display_profile_set(patch);
            print_api_result(&result, pretty)
        }
    }
}

fn print_api_result<T: Serialize>(result: &ApiResult<T>, pretty: bool) -> Result<(), ExitCode> {
    print_json(result, pretty);
    if result.ok {
        Ok(())
    } else {
        Err(ExitCode::TemplateError)
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match rendered {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("failed to serialize output: {e}"),
    }
}
