//! Task chat: message history, live updates and the typing indicator.

pub mod chat;
pub mod merge;

pub use chat::{ChatError, ChatOptions, TaskChat};
pub use merge::{append_unique, merge_history};
