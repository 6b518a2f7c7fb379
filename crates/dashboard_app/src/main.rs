mod commands;
mod config;
mod render;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use dashboard_logging::dash_info;

use crate::config::DashboardConfig;

#[derive(Parser)]
#[command(name = "transfer-dashboard", author, version, about, long_about = None)]
struct Cli {
    /// Config file (RON). Defaults to ./transfer-dashboard.ron when present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Poll interval in seconds, overriding the config file
    #[arg(long, global = true)]
    interval: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the service and redraw the job table until Ctrl-C
    Watch,
    /// Fetch once and print the job table
    List,
    /// Start a job
    Start { job_id: String },
    /// Pause a job by switching it to manual triggering
    Pause { job_id: String },
    /// Resume a paused job on its hot-folder trigger
    Resume { job_id: String },
    /// Re-enable the hot-folder trigger without changing the paused flag
    Retrigger { job_id: String },
    /// Delete a job
    Delete {
        job_id: String,
        /// Confirmation text; must be exactly DELETE. Prompted for when omitted.
        #[arg(long)]
        confirm: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    if let Some(interval) = cli.interval {
        config.poll_interval_secs = interval;
    }
    dashboard_logging::initialize(
        config.log_destination(),
        config.log_level(),
        &config.log_file,
    );

    let engine_config = config.to_engine_config()?;
    dash_info!(
        "transfer-dashboard starting against {} (poll every {:?})",
        engine_config.api.base_url,
        engine_config.poll_interval
    );
    let settle_wait = engine_config.reconciler.settle_delay
        + engine_config.transport.request_timeout
        + Duration::from_secs(1);
    let engine = commands::build_engine(engine_config)?;

    match cli.command {
        Commands::Watch => commands::watch(&engine).await,
        Commands::List => commands::list(&engine).await,
        Commands::Start { job_id } => {
            commands::control(&engine, commands::Control::Start, &job_id, settle_wait).await
        }
        Commands::Pause { job_id } => {
            commands::control(&engine, commands::Control::Pause, &job_id, settle_wait).await
        }
        Commands::Resume { job_id } => {
            commands::control(&engine, commands::Control::Resume, &job_id, settle_wait).await
        }
        Commands::Retrigger { job_id } => {
            commands::control(&engine, commands::Control::Retrigger, &job_id, settle_wait).await
        }
        Commands::Delete { job_id, confirm } => {
            let confirmation = match confirm {
                Some(text) => text,
                None => commands::prompt_confirmation(&job_id)?,
            };
            commands::control(
                &engine,
                commands::Control::Delete { confirmation },
                &job_id,
                settle_wait,
            )
            .await
        }
    }
}
