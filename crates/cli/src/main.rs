//! `opsdesk` command line.
//!
//! `dashboard` runs the terminal UI. Every other subcommand makes one REST
//! call and prints the result.

mod commands;
mod logging;
mod output;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use od_core::config::loader::{load_config, validate};
use od_core::config::models::AppConfig;
use od_protocol::{PipelineAction, SyncType};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "opsdesk", version, about = "Watch and control channel sync pipelines")]
struct Cli {
    /// Directory holding `.opsdesk/config.toml`.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Base URL of the REST API. Overrides config and environment.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token for the REST API and the real-time connection.
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open the pipeline panel and task chat.
    Dashboard(DashboardArgs),

    /// Print the current pipeline status of a channel.
    Status {
        #[arg(long)]
        channel: String,
        #[arg(long)]
        sync_type: Option<SyncType>,
        /// Print the raw status as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Start a sync pipeline for a channel.
    Start {
        #[arg(long)]
        channel: String,
        #[arg(long)]
        client: String,
        #[arg(long)]
        sync_type: Option<SyncType>,
        /// First day to sync, for incremental syncs (YYYY-MM-DD).
        #[arg(long)]
        from: Option<NaiveDate>,
    },

    /// Retry a failed pipeline.
    Retry { pipeline_id: String },

    /// Pause a running pipeline.
    Pause { pipeline_id: String },

    /// Resume a paused pipeline.
    Resume { pipeline_id: String },
}

#[derive(Debug, Args)]
struct DashboardArgs {
    #[arg(long)]
    channel: String,
    #[arg(long)]
    client: String,
    #[arg(long)]
    sync_type: Option<SyncType>,
    /// Do not start a pipeline when the channel has none.
    #[arg(long)]
    no_auto_start: bool,
    /// Task whose chat opens right away.
    #[arg(long)]
    task: Option<String>,
}

impl Cli {
    /// Config from file and environment with the command line flags on top.
    fn config(&self) -> Result<AppConfig> {
        let mut config = load_config(&self.root)
            .wrap_err_with(|| format!("loading config from {}", self.root.display()))?;
        if let Some(url) = &self.api_url {
            config.settings.api.base_url = url.clone();
        }
        if let Some(token) = &self.token {
            config.settings.api.auth_token = Some(token.clone());
        }
        validate(&config.settings)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let config = cli.config()?;

    // The dashboard owns the terminal, so its logs go to a file.
    let _guard = match &cli.command {
        Command::Dashboard(_) => Some(logging::init_file(&cli.root)?),
        _ => {
            logging::init_stderr();
            None
        }
    };

    let default_sync = config.settings.pipeline.default_sync_type;
    match cli.command {
        Command::Dashboard(args) => commands::dashboard(&config, args).await,
        Command::Status {
            channel,
            sync_type,
            json,
        } => commands::status(&config, &channel, sync_type.unwrap_or(default_sync), json).await,
        Command::Start {
            channel,
            client,
            sync_type,
            from,
        } => {
            commands::start(
                &config,
                &channel,
                &client,
                sync_type.unwrap_or(default_sync),
                from,
            )
            .await
        }
        Command::Retry { pipeline_id } => {
            commands::pipeline_action(&config, PipelineAction::Retry, &pipeline_id).await
        }
        Command::Pause { pipeline_id } => {
            commands::pipeline_action(&config, PipelineAction::Pause, &pipeline_id).await
        }
        Command::Resume { pipeline_id } => {
            commands::pipeline_action(&config, PipelineAction::Resume, &pipeline_id).await
        }
    }
}
