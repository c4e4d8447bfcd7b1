//! Inter-process communication protocol.
//!
//! This module defines the message types for asynchronous communication
//! between the dashboard (user interface) and the Core (session logic).
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from the dashboard to Core
//! - `Event`: State updates sent from Core to the dashboard
//!
//! Uses tagged enum serialization for TypeScript compatibility:
//! ```json
//! {
//!   "type": "openTask",
//!   "payload": { "task_id": "T-1042" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::message_models::{TaskMessage, TypingIndicator};
use crate::view_models::{PipelineAction, PipelineViewState};

/// Operations sent from the UI to the Core session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Start a pipeline when none exists (or the first load failed).
    StartPipeline,

    /// Retry a failed pipeline.
    RetryPipeline,

    /// Pause an in-progress pipeline.
    PausePipeline,

    /// Resume a paused pipeline.
    ResumePipeline,

    /// Bind the chat to a task, or unbind it with `None`.
    OpenTask { task_id: Option<String> },

    /// Send a chat message to the bound task.
    SendMessage { content: String },

    /// Tell other viewers of the bound task whether this user is typing.
    SetTyping { is_typing: bool },

    /// Shut down the session gracefully.
    Shutdown,
}

impl Op {
    /// The pipeline action an op maps to, if it is one.
    pub fn pipeline_action(&self) -> Option<PipelineAction> {
        match self {
            Self::StartPipeline => Some(PipelineAction::Start),
            Self::RetryPipeline => Some(PipelineAction::Retry),
            Self::PausePipeline => Some(PipelineAction::Pause),
            Self::ResumePipeline => Some(PipelineAction::Resume),
            _ => None,
        }
    }
}

/// Events sent from the Core session to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// The pipeline view state changed.
    PipelineStateChanged { state: PipelineViewState },

    /// The pipeline transitioned into `COMPLETED`.
    PipelineCompleted { pipeline_id: String },

    /// The pipeline transitioned into `FAILED` with an error.
    PipelineFailed { pipeline_id: String, error: String },

    /// An action was refused without contacting the server.
    ActionRejected {
        action: PipelineAction,
        reason: String,
    },

    /// An action request failed. The last known status is still valid.
    ActionFailed {
        action: PipelineAction,
        error: String,
    },

    /// Message history for a task finished loading.
    ChatHistoryLoaded {
        task_id: String,
        messages: Vec<TaskMessage>,
    },

    /// A message not seen before was added to the task chat.
    MessageAppended {
        task_id: String,
        message: TaskMessage,
    },

    /// The typing indicator of a task chat changed.
    TypingChanged {
        task_id: String,
        indicator: TypingIndicator,
    },

    /// Loading the task chat failed.
    ChatError { task_id: String, error: String },

    /// Sending a message failed; `content` is what the user had typed.
    SendFailed { content: String, error: String },
}
