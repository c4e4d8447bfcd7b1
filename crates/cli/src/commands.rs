//! Subcommand implementations.

use chrono::{NaiveDate, Utc};
use color_eyre::eyre::{eyre, Result};
use colored::Colorize;
use od_core::api::{HttpApiClient, PipelineApi};
use od_core::config::models::AppConfig;
use od_core::realtime::RealtimeClient;
use od_core::session::{Session, SessionOptions};
use od_protocol::{PipelineAction, StartPipelineRequest, SyncType};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::output::format_status;
use crate::DashboardArgs;

/// Capacity of the UI to session op channel.
const OP_CHANNEL_SIZE: usize = 64;
/// Capacity of the session to UI event channel.
const EVENT_CHANNEL_SIZE: usize = 256;

pub async fn dashboard(config: &AppConfig, args: DashboardArgs) -> Result<()> {
    let api = Arc::new(HttpApiClient::new(&config.settings.api)?);
    let realtime = Arc::new(RealtimeClient::new(
        &config.settings.realtime,
        config.settings.api.auth_token.as_deref(),
    )?);
    realtime.connect();

    let mut options = SessionOptions::from_config(config, args.channel, args.client);
    if let Some(sync_type) = args.sync_type {
        options.controller.sync_type = sync_type;
    }
    if args.no_auto_start {
        options.controller.auto_start = false;
    }
    options.task_id = args.task.clone();
    let sync_type = options.controller.sync_type;

    tracing::info!(
        channel_id = %options.controller.channel_id,
        %sync_type,
        "opening dashboard"
    );

    let (op_tx, op_rx) = mpsc::channel(OP_CHANNEL_SIZE);
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
    let session = Session::start(api.clone(), api, realtime.clone(), options, event_tx).await;
    let session_task = tokio::spawn(session.run(op_rx));

    let ui_result =
        od_tui::run_app(op_tx, event_rx, realtime.watch_status(), sync_type, args.task).await;

    // The app dropped its op sender, so the session winds down on its own.
    let session_result = session_task.await;
    realtime.disconnect();

    ui_result.map_err(|err| eyre!(err))?;
    session_result?.map_err(|err| eyre!(err))?;
    Ok(())
}

pub async fn status(config: &AppConfig, channel: &str, sync_type: SyncType, json: bool) -> Result<()> {
    let api = HttpApiClient::new(&config.settings.api)?;
    let status = api.get_pipeline_status(channel, sync_type).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    match status {
        Some(status) => println!("{}", format_status(&status, Utc::now())),
        None => println!(
            "{}",
            format!("No {sync_type} sync pipeline for channel {channel}").dimmed()
        ),
    }
    Ok(())
}

pub async fn start(
    config: &AppConfig,
    channel: &str,
    client: &str,
    sync_type: SyncType,
    from: Option<NaiveDate>,
) -> Result<()> {
    let mut request = StartPipelineRequest::new(channel, client, sync_type);
    if let Some(from) = from {
        request = request.with_sync_from_date(from);
    }

    let api = HttpApiClient::new(&config.settings.api)?;
    match api.start_pipeline(&request).await? {
        Some(status) => println!("{}", format_status(&status, Utc::now())),
        None => println!(
            "{} {sync_type} sync for channel {channel}",
            "Started".green().bold()
        ),
    }
    Ok(())
}

pub async fn pipeline_action(
    config: &AppConfig,
    action: PipelineAction,
    pipeline_id: &str,
) -> Result<()> {
    let api = HttpApiClient::new(&config.settings.api)?;
    let (verb, result) = match action {
        PipelineAction::Retry => ("Retried", api.retry_pipeline(pipeline_id).await),
        PipelineAction::Pause => ("Paused", api.pause_pipeline(pipeline_id).await),
        PipelineAction::Resume => ("Resumed", api.resume_pipeline(pipeline_id).await),
        PipelineAction::Start => return Err(eyre!("use `opsdesk start` to start a pipeline")),
    };
    result?;
    println!("{} pipeline {pipeline_id}", verb.green().bold());
    Ok(())
}
