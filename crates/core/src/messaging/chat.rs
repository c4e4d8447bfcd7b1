//! Task chat bound to one task at a time.

use od_protocol::ipc::Event;
use od_protocol::message_models::{
    ChatState, SendMessageRequest, TaskMessage, TypingIndicator,
};
use od_protocol::realtime::ServerFrame;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::merge::{append_unique, merge_history};
use crate::api::{ApiError, TaskMessageApi};
use crate::realtime::{ListenerId, RealtimeChannel};
use crate::timer::wait_until;

/// How long a remote typing indicator stays up without a refresh.
pub const DEFAULT_TYPING_TIMEOUT: Duration = Duration::from_millis(3_000);

#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub typing_timeout: Duration,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            typing_timeout: DEFAULT_TYPING_TIMEOUT,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyContent,

    #[error("No task is open")]
    NoTask,

    #[error(transparent)]
    Api(#[from] ApiError),
}

struct Binding {
    task_id: String,
    listener: ListenerId,
    driver: JoinHandle<()>,
}

/// Message list, typing indicator and send path for one task.
///
/// State is published through a [`watch`] channel; every change is also
/// forwarded as an [`Event`] when an event sender was given.
///
/// While bound, the chat holds exactly one room join and one listener on
/// the real-time channel. Both are released by [`unbind`](Self::unbind),
/// by binding another task, or on drop.
pub struct TaskChat {
    api: Arc<dyn TaskMessageApi>,
    realtime: Arc<dyn RealtimeChannel>,
    options: ChatOptions,
    state: Arc<watch::Sender<ChatState>>,
    events_tx: Option<mpsc::Sender<Event>>,
    binding: Option<Binding>,
}

impl TaskChat {
    pub fn new(
        api: Arc<dyn TaskMessageApi>,
        realtime: Arc<dyn RealtimeChannel>,
        options: ChatOptions,
    ) -> Self {
        let (state, _) = watch::channel(ChatState::default());
        Self {
            api,
            realtime,
            options,
            state: Arc::new(state),
            events_tx: None,
            binding: None,
        }
    }

    /// Forward state changes to `events_tx` as [`Event`]s.
    pub fn with_events(mut self, events_tx: mpsc::Sender<Event>) -> Self {
        self.events_tx = Some(events_tx);
        self
    }

    /// Bind the chat to `task_id`, releasing any previous binding first.
    ///
    /// With `None` the chat is cleared and nothing touches the network.
    /// History loads in the background; messages pushed in the meantime are
    /// kept after it.
    pub async fn bind(&mut self, task_id: Option<String>) {
        self.unbind().await;

        let Some(task_id) = task_id else {
            return;
        };

        let listener = self.realtime.subscribe();
        self.realtime.join_task_room(&task_id);
        tracing::debug!(task_id, listener = %listener.id, "chat bound");

        self.state.send_replace(ChatState {
            task_id: Some(task_id.clone()),
            loading: true,
            ..ChatState::default()
        });

        let driver = ChatDriver {
            task_id: task_id.clone(),
            api: Arc::clone(&self.api),
            state: Arc::clone(&self.state),
            events_tx: self.events_tx.clone(),
            typing_timeout: self.options.typing_timeout,
        };
        let driver = tokio::spawn(driver.run(listener.rx));

        self.binding = Some(Binding {
            task_id,
            listener: listener.id,
            driver,
        });
    }

    /// Release the current binding and clear the state.
    pub async fn unbind(&mut self) {
        let Some(binding) = self.binding.take() else {
            return;
        };
        binding.driver.abort();
        // Wait for the driver to stop so it cannot write after the reset.
        let _ = binding.driver.await;
        self.release(&binding.task_id, binding.listener);
        self.state.send_replace(ChatState::default());
    }

    fn release(&self, task_id: &str, listener: ListenerId) {
        self.realtime.remove_listener(listener);
        self.realtime.leave_task_room(task_id);
        tracing::debug!(task_id, "chat unbound");
    }

    /// Task the chat is bound to.
    pub fn task_id(&self) -> Option<&str> {
        self.binding.as_ref().map(|binding| binding.task_id.as_str())
    }

    /// Post `content` to the bound task.
    ///
    /// The stored message is appended unless the task room delivered it
    /// first. On failure the state is left untouched so the caller can
    /// offer the content again.
    pub async fn send_message(&self, content: &str) -> Result<TaskMessage, ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::EmptyContent);
        }
        let task_id = self.task_id().ok_or(ChatError::NoTask)?.to_string();

        let request = SendMessageRequest::new(content);
        let message = match self.api.send_message(&task_id, &request).await {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(task_id, %err, "send message failed");
                return Err(err.into());
            }
        };

        let appended = self.state.send_if_modified(|state| {
            state.task_id.as_deref() == Some(task_id.as_str())
                && append_unique(&mut state.messages, message.clone())
        });
        if appended {
            emit(
                self.events_tx.as_ref(),
                Event::MessageAppended {
                    task_id,
                    message: message.clone(),
                },
            )
            .await;
        }
        Ok(message)
    }

    /// Tell the other viewers whether the local user is typing.
    pub fn set_typing(&self, is_typing: bool) -> Result<(), ChatError> {
        let task_id = self.task_id().ok_or(ChatError::NoTask)?;
        self.realtime.send_task_typing_indicator(task_id, is_typing);
        Ok(())
    }

    pub fn snapshot(&self) -> ChatState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.state.subscribe()
    }
}

impl Drop for TaskChat {
    fn drop(&mut self) {
        if let Some(binding) = self.binding.take() {
            binding.driver.abort();
            self.release(&binding.task_id, binding.listener);
        }
    }
}

/// Background half of a binding: loads history, applies pushed frames and
/// expires the typing indicator.
struct ChatDriver {
    task_id: String,
    api: Arc<dyn TaskMessageApi>,
    state: Arc<watch::Sender<ChatState>>,
    events_tx: Option<mpsc::Sender<Event>>,
    typing_timeout: Duration,
}

impl ChatDriver {
    async fn run(self, mut frames: mpsc::UnboundedReceiver<ServerFrame>) {
        let history = self.api.fetch_messages(&self.task_id);
        tokio::pin!(history);
        let mut history_pending = true;
        let mut typing_deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                result = &mut history, if history_pending => {
                    history_pending = false;
                    self.apply_history(result).await;
                }
                frame = frames.recv() => {
                    let Some(frame) = frame else { break };
                    if frame.task_id() != self.task_id {
                        continue;
                    }
                    self.apply_frame(frame, &mut typing_deadline).await;
                }
                () = wait_until(typing_deadline) => {
                    typing_deadline = None;
                    self.set_typing(TypingIndicator::idle()).await;
                }
            }
        }
    }

    fn update<F>(&self, modify: F) -> bool
    where
        F: FnOnce(&mut ChatState) -> bool,
    {
        self.state.send_if_modified(|state| {
            state.task_id.as_deref() == Some(self.task_id.as_str()) && modify(state)
        })
    }

    async fn apply_history(&self, result: Result<Vec<TaskMessage>, ApiError>) {
        match result {
            Ok(history) => {
                tracing::debug!(task_id = %self.task_id, count = history.len(), "chat history loaded");
                let mut merged = Vec::new();
                self.update(|state| {
                    state.messages = merge_history(history, std::mem::take(&mut state.messages));
                    state.loading = false;
                    state.error = None;
                    merged = state.messages.clone();
                    true
                });
                self.emit(Event::ChatHistoryLoaded {
                    task_id: self.task_id.clone(),
                    messages: merged,
                })
                .await;
            }
            Err(err) => {
                tracing::warn!(task_id = %self.task_id, %err, "chat history failed");
                let error = err.to_string();
                self.update(|state| {
                    state.loading = false;
                    state.error = Some(error.clone());
                    true
                });
                self.emit(Event::ChatError {
                    task_id: self.task_id.clone(),
                    error,
                })
                .await;
            }
        }
    }

    async fn apply_frame(&self, frame: ServerFrame, typing_deadline: &mut Option<Instant>) {
        match frame {
            ServerFrame::TaskMessage { task_id, message } => {
                let appended =
                    self.update(|state| append_unique(&mut state.messages, message.clone()));
                if appended {
                    self.emit(Event::MessageAppended { task_id, message }).await;
                }
            }
            ServerFrame::TaskTyping {
                user, is_typing, ..
            } => {
                if is_typing {
                    *typing_deadline = Some(Instant::now() + self.typing_timeout);
                    self.set_typing(TypingIndicator::typing(user)).await;
                } else {
                    *typing_deadline = None;
                    self.set_typing(TypingIndicator::idle()).await;
                }
            }
        }
    }

    async fn set_typing(&self, indicator: TypingIndicator) {
        let changed = self.update(|state| {
            if state.typing == indicator {
                return false;
            }
            state.typing = indicator.clone();
            true
        });
        if changed {
            self.emit(Event::TypingChanged {
                task_id: self.task_id.clone(),
                indicator,
            })
            .await;
        }
    }

    async fn emit(&self, event: Event) {
        emit(self.events_tx.as_ref(), event).await;
    }
}

async fn emit(events_tx: Option<&mpsc::Sender<Event>>, event: Event) {
    if let Some(events_tx) = events_tx {
        // A closed receiver means the UI is gone; state is still published.
        let _ = events_tx.send(event).await;
    }
}
