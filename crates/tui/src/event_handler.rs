//! Event handling for the dashboard.
//!
//! - Core events (from the session) update the mirrored dashboard state.
//! - Key presses are routed through the widgets and turned into `Op`s.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use od_core::messaging::append_unique;
use od_protocol::{Event, Op};

use crate::app::{DashboardState, Notice};
use crate::widgets::{ChatView, CommandComposer};

/// What the app should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Forward these ops, in order. Often empty.
    Submit(Vec<Op>),
    /// The input could not be parsed; it is kept for correction.
    Invalid(String),
    Quit,
}

/// Apply an event from the session to the dashboard state.
///
/// Chat events for a task other than the open one are stale and dropped.
pub fn handle_core_event(state: &mut DashboardState, event: Event) {
    match event {
        Event::PipelineStateChanged { state: pipeline } => {
            state.pipeline = pipeline;
        }
        Event::PipelineCompleted { pipeline_id } => {
            state.notice = Some(Notice::info(format!("Pipeline {pipeline_id} completed")));
        }
        Event::PipelineFailed { pipeline_id, error } => {
            state.notice = Some(Notice::error(format!(
                "Pipeline {pipeline_id} failed: {error}"
            )));
        }
        Event::ActionRejected { action, reason } => {
            state.notice = Some(Notice::error(format!("Cannot {action}: {reason}")));
        }
        Event::ActionFailed { action, error } => {
            state.notice = Some(Notice::error(format!("{action} failed: {error}")));
        }
        Event::ChatHistoryLoaded { task_id, messages } => {
            if state.is_open(&task_id) {
                state.chat.messages = messages;
                state.chat.loading = false;
                state.chat.error = None;
            }
        }
        Event::MessageAppended { task_id, message } => {
            if state.is_open(&task_id) {
                append_unique(&mut state.chat.messages, message);
            }
        }
        Event::TypingChanged { task_id, indicator } => {
            if state.is_open(&task_id) {
                state.chat.typing = indicator;
            }
        }
        Event::ChatError { task_id, error } => {
            if state.is_open(&task_id) {
                state.chat.loading = false;
                state.chat.error = Some(error);
            }
        }
        Event::SendFailed { error, .. } => {
            state.notice = Some(Notice::error(format!("Message not sent: {error}")));
        }
    }
}

/// Route a key press through the popup, the chat view and the composer.
pub fn handle_keyboard_event(
    key_event: KeyEvent,
    composer: &mut CommandComposer,
    chat_view: &mut ChatView,
) -> KeyAction {
    if key_event.kind != KeyEventKind::Press {
        return KeyAction::Submit(Vec::new());
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c')
    {
        return KeyAction::Quit;
    }

    if composer.handle_popup_key(key_event).is_consumed()
        || chat_view.handle_key_event(key_event).is_consumed()
    {
        return KeyAction::Submit(Vec::new());
    }

    match key_event.code {
        KeyCode::Esc if composer.is_empty() => return KeyAction::Quit,
        KeyCode::Esc => composer.clear(),
        KeyCode::Enter => return submit_command(composer, chat_view),
        KeyCode::Char(c) => composer.insert_char(c),
        KeyCode::Backspace => composer.delete_char(),
        KeyCode::Left => composer.move_cursor_left(),
        KeyCode::Right => composer.move_cursor_right(),
        _ => {}
    }

    KeyAction::Submit(typing_ops(composer))
}

/// Handle a bracketed paste into the composer.
pub fn handle_paste(pasted: &str, composer: &mut CommandComposer) -> Vec<Op> {
    composer.insert_str(pasted);
    typing_ops(composer)
}

fn typing_ops(composer: &mut CommandComposer) -> Vec<Op> {
    composer
        .typing_transition()
        .map(|is_typing| Op::SetTyping { is_typing })
        .into_iter()
        .collect()
}

/// Parse the composer input and clear it on success.
fn submit_command(composer: &mut CommandComposer, chat_view: &mut ChatView) -> KeyAction {
    match composer.parse_command() {
        Ok(Some(op)) => {
            composer.clear();
            if matches!(op, Op::SendMessage { .. }) {
                chat_view.follow();
            }
            let mut ops = typing_ops(composer);
            ops.push(op);
            KeyAction::Submit(ops)
        }
        Ok(None) => KeyAction::Submit(Vec::new()),
        Err(message) => KeyAction::Invalid(message),
    }
}
