//! Task chat panel with scrolling support.
//!
//! Shows the messages of the bound task, newest at the bottom, plus the
//! typing indicator. The view follows new messages unless the user has
//! scrolled up. The title notes when the real-time connection is down.

use crossterm::event::{KeyCode, KeyEvent};
use od_core::realtime::ConnectionStatus;
use od_protocol::{ChatState, TaskMessage};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

use crate::event::EventStatus;

/// Lines moved by PageUp/PageDown.
const PAGE: usize = 10;

#[derive(Debug, Default)]
pub struct ChatView {
    /// Lines scrolled up from the newest message. Zero follows the tail.
    pub scroll_back: usize,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    /// `connection` is `None` when no real-time client is attached.
    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        chat: &ChatState,
        connection: Option<ConnectionStatus>,
    ) {
        let mut title = match &chat.task_id {
            Some(task_id) => format!("Task {task_id}"),
            None => "Task Chat".to_string(),
        };
        if let Some(status) = connection.filter(|status| *status != ConnectionStatus::Connected) {
            title.push_str(&format!(" ({status})"));
        }
        let block = Block::default().borders(Borders::ALL).title(title);

        let mut lines = body_lines(chat);
        if let Some(line) = typing_line(chat) {
            lines.push(line);
        }

        let total_lines = lines.len();
        let visible_lines = usize::from(area.height.saturating_sub(2));
        let max_offset = total_lines.saturating_sub(visible_lines);
        let scroll_back = self.scroll_back.min(max_offset);
        let top = max_offset - scroll_back;

        let paragraph = Paragraph::new(lines)
            .block(block)
            .scroll((u16::try_from(top).unwrap_or(u16::MAX), 0));
        frame.render_widget(paragraph, area);

        if total_lines > visible_lines {
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(total_lines)
                .viewport_content_length(visible_lines)
                .position(top);

            let scrollbar = Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));

            frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll_back += 1;
    }

    pub fn scroll_down(&mut self) {
        self.scroll_back = self.scroll_back.saturating_sub(1);
    }

    pub fn page_up(&mut self, page: usize) {
        self.scroll_back += page;
    }

    pub fn page_down(&mut self, page: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(page);
    }

    /// Jump back to the newest message.
    pub fn follow(&mut self) {
        self.scroll_back = 0;
    }

    /// Scrolling keys. Everything else is left for the composer.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> EventStatus {
        match key.code {
            KeyCode::Up => self.scroll_up(),
            KeyCode::Down => self.scroll_down(),
            KeyCode::PageUp => self.page_up(PAGE),
            KeyCode::PageDown => self.page_down(PAGE),
            KeyCode::End => self.follow(),
            _ => return EventStatus::NotConsumed,
        }
        EventStatus::Consumed
    }
}

fn body_lines(chat: &ChatState) -> Vec<Line<'static>> {
    if chat.task_id.is_none() {
        return vec![Line::from(Span::styled(
            "No task open. Use /task <id> to open one.",
            Style::default().fg(Color::DarkGray),
        ))];
    }

    let mut lines: Vec<Line<'static>> = chat.messages.iter().map(message_line).collect();
    if chat.loading {
        lines.push(Line::from(Span::styled(
            "Loading messages...",
            Style::default().fg(Color::DarkGray),
        )));
    } else if let Some(error) = &chat.error {
        lines.push(Line::from(Span::styled(
            format!("Failed to load messages: {error}"),
            Style::default().fg(Color::Red),
        )));
    } else if chat.messages.is_empty() {
        lines.push(Line::from(Span::styled(
            "No messages yet.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines
}

fn message_line(message: &TaskMessage) -> Line<'static> {
    let (name, name_style) = if message.is_from_current_user {
        (
            "You".to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    } else {
        (
            message.sender_name.clone(),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )
    };

    Line::from(vec![
        Span::styled(
            message.timestamp.format("%H:%M ").to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(name, name_style),
        Span::raw(format!(": {}", message.content)),
    ])
}

fn typing_line(chat: &ChatState) -> Option<Line<'static>> {
    if !chat.typing.is_typing {
        return None;
    }
    let who = chat
        .typing
        .typing_user
        .as_ref()
        .map_or("Someone", |user| user.name.as_str());
    Some(Line::from(Span::styled(
        format!("{who} is typing..."),
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )))
}
