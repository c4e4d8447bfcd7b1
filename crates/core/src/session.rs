//! Routes UI operations to the pipeline controller and the task chat.

use anyhow::Result;
use od_protocol::ipc::{Event, Op};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::api::{PipelineApi, TaskMessageApi};
use crate::config::models::AppConfig;
use crate::messaging::{ChatOptions, TaskChat};
use crate::pipeline::{ControllerOptions, PipelineController};
use crate::realtime::RealtimeChannel;

/// Everything a session needs besides its clients.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub controller: ControllerOptions,
    pub chat: ChatOptions,
    /// Task to open right away.
    pub task_id: Option<String>,
}

impl SessionOptions {
    /// Options for `channel_id`/`client_id` with intervals and defaults
    /// taken from `config`.
    pub fn from_config(
        config: &AppConfig,
        channel_id: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        let pipeline = &config.settings.pipeline;
        let mut controller = ControllerOptions::new(channel_id, client_id);
        controller.sync_type = pipeline.default_sync_type;
        controller.auto_start = pipeline.auto_start;
        controller.poll_interval = config.poll_interval();

        Self {
            controller,
            chat: ChatOptions {
                typing_timeout: config.typing_timeout(),
            },
            task_id: None,
        }
    }
}

/// One dashboard's worth of state: a mounted pipeline view and a task chat.
pub struct Session {
    controller: PipelineController,
    chat: TaskChat,
    events_tx: mpsc::Sender<Event>,
}

impl Session {
    /// Mount the pipeline view and bind the initial task, if any.
    pub async fn start(
        pipeline_api: Arc<dyn PipelineApi>,
        message_api: Arc<dyn TaskMessageApi>,
        realtime: Arc<dyn RealtimeChannel>,
        options: SessionOptions,
        events_tx: mpsc::Sender<Event>,
    ) -> Self {
        let controller =
            PipelineController::mount(pipeline_api, options.controller, events_tx.clone());
        let mut chat =
            TaskChat::new(message_api, realtime, options.chat).with_events(events_tx.clone());
        if options.task_id.is_some() {
            chat.bind(options.task_id).await;
        }

        Self {
            controller,
            chat,
            events_tx,
        }
    }

    pub fn pipeline(&self) -> &PipelineController {
        &self.controller
    }

    pub fn chat(&self) -> &TaskChat {
        &self.chat
    }

    /// Consume operations until `Shutdown` or until the sender is dropped.
    pub async fn run(mut self, mut ops: mpsc::Receiver<Op>) -> Result<()> {
        while let Some(op) = ops.recv().await {
            if self.handle(op).await.is_break() {
                break;
            }
        }
        self.shutdown().await;
        Ok(())
    }

    /// Apply one operation. Returns `Break` on `Shutdown`.
    pub async fn handle(&mut self, op: Op) -> ControlFlow<()> {
        if let Some(action) = op.pipeline_action() {
            if let Err(err) = self.controller.request(action).await {
                tracing::debug!(%err, "pipeline action not run");
            }
            return ControlFlow::Continue(());
        }

        match op {
            Op::OpenTask { task_id } => self.chat.bind(task_id).await,
            Op::SendMessage { content } => {
                if let Err(err) = self.chat.send_message(&content).await {
                    let _ = self
                        .events_tx
                        .send(Event::SendFailed {
                            content,
                            error: err.to_string(),
                        })
                        .await;
                }
            }
            Op::SetTyping { is_typing } => {
                if let Err(err) = self.chat.set_typing(is_typing) {
                    tracing::debug!(%err, "typing indicator not sent");
                }
            }
            Op::Shutdown => return ControlFlow::Break(()),
            Op::StartPipeline | Op::RetryPipeline | Op::PausePipeline | Op::ResumePipeline => {}
        }
        ControlFlow::Continue(())
    }

    /// Stop polling and release the chat binding.
    pub async fn shutdown(mut self) {
        self.chat.unbind().await;
        self.controller.unmount().await;
        tracing::debug!("session closed");
    }
}
