//! Real-time channel frames.
//!
//! The real-time connection carries JSON text frames in both directions.
//! Frames are scoped by task id; every subscriber sees every inbound frame
//! and keeps only those for its own task.
//!
//! ```json
//! {
//!   "type": "taskTyping",
//!   "payload": { "taskId": "T1", "user": { "name": "Ana" }, "isTyping": true }
//! }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::message_models::{TaskMessage, TypingUser};

/// Frames sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ClientFrame {
    /// Subscribe this connection to a task room.
    #[serde(rename_all = "camelCase")]
    JoinTaskRoom { task_id: String },

    /// Unsubscribe this connection from a task room.
    #[serde(rename_all = "camelCase")]
    LeaveTaskRoom { task_id: String },

    /// Tell the other viewers of a task whether this user is typing.
    #[serde(rename_all = "camelCase")]
    TaskTyping { task_id: String, is_typing: bool },
}

/// Frames pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ServerFrame {
    /// A message was posted to a task.
    #[serde(rename_all = "camelCase")]
    TaskMessage {
        task_id: String,
        message: TaskMessage,
    },

    /// Another viewer started or stopped typing.
    #[serde(rename_all = "camelCase")]
    TaskTyping {
        task_id: String,
        user: TypingUser,
        is_typing: bool,
    },
}

impl ServerFrame {
    /// Task the frame is scoped to.
    pub fn task_id(&self) -> &str {
        match self {
            Self::TaskMessage { task_id, .. } | Self::TaskTyping { task_id, .. } => task_id,
        }
    }
}
