//! Task chat message models.
//!
//! Messages belong to a task and reach the client over two paths: the REST
//! history/send endpoints and the real-time task room. Both paths carry
//! the same server-assigned `id`, which is what de-duplication keys on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// A single chat message attached to a task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct TaskMessage {
    /// Server-assigned identifier, stable across REST and push delivery.
    pub id: String,

    pub sender_id: String,

    pub sender_name: String,

    #[serde(default)]
    pub sender_avatar: Option<String>,

    pub content: String,

    pub timestamp: DateTime<Utc>,

    /// Decides which side of the conversation the message is drawn on.
    #[serde(default)]
    pub is_from_current_user: bool,

    /// Idempotency key attached by the sending client, when the server
    /// echoes it back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub client_message_id: Option<Uuid>,
}

impl TaskMessage {
    /// Whether `other` is the same message delivered through another path.
    pub fn is_same_message(&self, other: &TaskMessage) -> bool {
        if self.id == other.id {
            return true;
        }
        matches!(
            (self.client_message_id, other.client_message_id),
            (Some(a), Some(b)) if a == b
        )
    }
}

/// Body of the send-message endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub content: String,

    #[ts(type = "string")]
    pub client_message_id: Uuid,
}

impl SendMessageRequest {
    /// Build a request with a fresh idempotency key.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            client_message_id: Uuid::new_v4(),
        }
    }
}

/// The user currently typing in a task chat.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct TypingUser {
    pub name: String,
}

/// Ephemeral "someone is typing" state for one viewer of a task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "camelCase")]
pub struct TypingIndicator {
    pub is_typing: bool,
    pub typing_user: Option<TypingUser>,
}

impl TypingIndicator {
    /// Indicator showing `user` as typing.
    pub fn typing(user: TypingUser) -> Self {
        Self {
            is_typing: true,
            typing_user: Some(user),
        }
    }

    /// Cleared indicator.
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Everything a chat view needs to draw one task's conversation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "camelCase")]
pub struct ChatState {
    /// Task the chat is bound to. `None` means no task is open.
    pub task_id: Option<String>,

    /// Messages in arrival order of first sighting.
    pub messages: Vec<TaskMessage>,

    pub typing: TypingIndicator,

    /// True while the history request is outstanding.
    pub loading: bool,

    /// Last history load error, if any.
    pub error: Option<String>,
}
