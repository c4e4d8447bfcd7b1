//! Input line shared by pipeline commands and chat messages.
//!
//! Text starting with `/` is a command and gets autocomplete suggestions.
//! Anything else is a chat message for the open task. The composer also
//! tracks whether the user is composing a message, so the caller can
//! forward typing start/stop transitions exactly once per burst.

use crossterm::event::{KeyCode, KeyEvent};
use od_protocol::Op;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::event::EventStatus;

/// Available slash commands with their descriptions.
const COMMANDS: &[(&str, &str)] = &[
    ("/start", "Start a sync pipeline for the channel"),
    ("/retry", "Retry the failed pipeline"),
    ("/pause", "Pause the running pipeline"),
    ("/resume", "Resume the paused pipeline"),
    ("/task <id>", "Open the chat of a task"),
    ("/close", "Close the task chat"),
];

#[derive(Debug, Clone, Default)]
pub struct CommandComposer {
    input: String,
    /// Cursor position, in characters.
    cursor_pos: usize,
    show_popup: bool,
    selected_index: usize,
    /// Last typing state reported through [`CommandComposer::typing_transition`].
    typing: bool,
}

impl CommandComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn should_show_popup(&self) -> bool {
        self.show_popup
    }

    /// Filtered command suggestions for the current input.
    pub fn suggestions(&self) -> Vec<(&'static str, &'static str)> {
        if !self.input.starts_with('/') {
            return Vec::new();
        }

        let filter = self.input.trim();
        if filter == "/" {
            return COMMANDS.to_vec();
        }

        COMMANDS
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(filter))
            .copied()
            .collect()
    }

    pub fn selected_suggestion(&self) -> Option<(&'static str, &'static str)> {
        self.suggestions().get(self.selected_index).copied()
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_pos)
            .map_or(self.input.len(), |(index, _)| index)
    }

    pub fn insert_char(&mut self, c: char) {
        let index = self.byte_index();
        self.input.insert(index, c);
        self.cursor_pos += 1;
        self.update_popup_state();
    }

    /// Insert pasted text at the cursor. Line breaks become spaces.
    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars() {
            self.insert_char(if c == '\n' || c == '\r' { ' ' } else { c });
        }
    }

    /// Delete the character before the cursor.
    pub fn delete_char(&mut self) {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            let index = self.byte_index();
            self.input.remove(index);
            self.update_popup_state();
        }
    }

    /// Replace the whole input, e.g. to give a failed message back.
    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
        self.cursor_pos = self.input.chars().count();
        self.selected_index = 0;
        self.update_popup_state();
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor_pos = 0;
        self.show_popup = false;
        self.selected_index = 0;
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_pos < self.input.chars().count() {
            self.cursor_pos += 1;
        }
    }

    pub fn move_selection_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        if self.selected_index + 1 < self.suggestions().len() {
            self.selected_index += 1;
        }
    }

    /// Complete with the selected suggestion (Tab).
    pub fn complete_with_selection(&mut self) {
        if let Some((cmd, _)) = self.selected_suggestion() {
            let cmd_name = cmd.split_whitespace().next().unwrap_or(cmd);
            self.input = format!("{cmd_name} ");
            self.cursor_pos = self.input.chars().count();
            self.show_popup = false;
            self.selected_index = 0;
        }
    }

    /// Navigation keys of the suggestion popup, while it is shown.
    pub fn handle_popup_key(&mut self, key: KeyEvent) -> EventStatus {
        if !self.show_popup || self.suggestions().is_empty() {
            return EventStatus::NotConsumed;
        }
        match key.code {
            KeyCode::Up => self.move_selection_up(),
            KeyCode::Down => self.move_selection_down(),
            KeyCode::Tab => self.complete_with_selection(),
            _ => return EventStatus::NotConsumed,
        }
        EventStatus::Consumed
    }

    fn update_popup_state(&mut self) {
        self.show_popup = self.input.starts_with('/') && !self.input.contains(' ');

        let suggestions = self.suggestions();
        if self.selected_index >= suggestions.len() {
            self.selected_index = suggestions.len().saturating_sub(1);
        }
    }

    /// Whether the current input is a chat message in progress.
    fn is_composing(&self) -> bool {
        !self.input.trim().is_empty() && !self.input.starts_with('/')
    }

    /// Report a change of the composing state since the last call.
    ///
    /// Returns `Some(true)` when a message was started, `Some(false)` when it
    /// was cleared, sent, or turned into a command, and `None` otherwise.
    pub fn typing_transition(&mut self) -> Option<bool> {
        let composing = self.is_composing();
        if composing == self.typing {
            return None;
        }
        self.typing = composing;
        Some(composing)
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Message or /command (Esc to quit)");

        let inner = block.inner(area);
        block.render(area, buf);

        let text = format!("> {}", self.input);
        Paragraph::new(text)
            .style(Style::default().fg(Color::Yellow))
            .render(inner, buf);
    }

    pub fn render_popup(&self, area: Rect, buf: &mut Buffer) {
        if !self.show_popup {
            return;
        }

        let suggestions = self.suggestions();
        if suggestions.is_empty() {
            return;
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Commands")
            .style(Style::default().bg(Color::Black));

        let inner = block.inner(area);
        block.render(area, buf);

        for (i, (cmd, desc)) in suggestions.iter().enumerate() {
            let y = inner.y + i as u16;
            if y >= inner.y + inner.height {
                break;
            }

            let style = if i == self.selected_index {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let line = Line::from(vec![
                Span::styled(format!("{cmd:<14}"), style),
                Span::styled(desc.to_string(), style.fg(Color::Gray)),
            ]);
            buf.set_line(inner.x, y, &line, inner.width);
        }
    }

    /// Parse the current input.
    ///
    /// Returns `Ok(None)` for blank input and `Err` with a message for an
    /// unknown or malformed command. Plain text is a chat message.
    pub fn parse_command(&self) -> Result<Option<Op>, String> {
        let input = self.input.trim();

        if input.is_empty() {
            return Ok(None);
        }

        if !input.starts_with('/') {
            return Ok(Some(Op::SendMessage {
                content: input.to_string(),
            }));
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().ok_or("Empty command")?;

        match *cmd {
            "/start" => Ok(Some(Op::StartPipeline)),
            "/retry" => Ok(Some(Op::RetryPipeline)),
            "/pause" => Ok(Some(Op::PausePipeline)),
            "/resume" => Ok(Some(Op::ResumePipeline)),
            "/task" => {
                let task_id = parts.get(1).ok_or("Missing task id")?;
                Ok(Some(Op::OpenTask {
                    task_id: Some(task_id.to_string()),
                }))
            }
            "/close" => Ok(Some(Op::OpenTask { task_id: None })),
            _ => Err(format!("Unknown command: {cmd}")),
        }
    }
}
