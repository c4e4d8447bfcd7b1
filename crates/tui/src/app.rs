//! Dashboard application state and event loop.
//!
//! `App` mirrors what the session reports through `Event`s and sends the
//! user's commands back as `Op`s. It never talks to the server itself.

use anyhow::Result;
use chrono::Utc;
use crossterm::event::KeyEvent;
use od_core::pipeline::PipelineView;
use od_core::realtime::ConnectionStatus;
use od_protocol::{ChatState, Event, Op, PipelineViewState, SyncType};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Clear, Paragraph},
    Frame,
};
use tokio::select;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio_stream::StreamExt;

use crate::event_handler::{self, KeyAction};
use crate::tui::{Tui, TuiEvent};
use crate::widgets::{render_pipeline_panel, ChatView, CommandComposer};

/// One-line message under the panels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Everything the dashboard draws, as last reported by the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub pipeline: PipelineViewState,
    pub chat: ChatState,
    pub notice: Option<Notice>,
}

impl DashboardState {
    /// Whether the chat is bound to `task_id`.
    pub fn is_open(&self, task_id: &str) -> bool {
        self.chat.task_id.as_deref() == Some(task_id)
    }
}

pub struct App {
    pub state: DashboardState,
    /// Picks the caption of the start command.
    pub sync_type: SyncType,
    pub composer: CommandComposer,
    pub chat_view: ChatView,
    pub op_tx: mpsc::Sender<Op>,
    pub event_rx: mpsc::Receiver<Event>,
    /// State of the real-time socket, when one is attached.
    pub connection: Option<watch::Receiver<ConnectionStatus>>,
    pub should_exit: bool,
}

impl App {
    pub fn new(op_tx: mpsc::Sender<Op>, event_rx: mpsc::Receiver<Event>, sync_type: SyncType) -> Self {
        Self {
            state: DashboardState::default(),
            sync_type,
            composer: CommandComposer::new(),
            chat_view: ChatView::new(),
            op_tx,
            event_rx,
            connection: None,
            should_exit: false,
        }
    }

    pub fn with_connection(mut self, connection: watch::Receiver<ConnectionStatus>) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Start with the chat already bound, matching a session opened with a task.
    pub fn with_task(mut self, task_id: Option<String>) -> Self {
        self.open_task(task_id);
        self
    }

    /// Main loop: session events, terminal input and redraws.
    pub async fn run(&mut self, tui: &mut Tui) -> Result<()> {
        let mut tui_events = tui.event_stream();
        let frames = tui.frame_requester();

        frames.schedule_frame();

        while !self.should_exit {
            select! {
                event = self.event_rx.recv() => match event {
                    Some(event) => {
                        self.handle_core_event(event);
                        frames.schedule_frame();
                    }
                    None => {
                        tracing::info!("session closed its event channel");
                        self.should_exit = true;
                    }
                },
                changed = connection_changed(&mut self.connection) => {
                    if changed.is_err() {
                        self.connection = None;
                    }
                    frames.schedule_frame();
                }
                Some(tui_event) = tui_events.next() => {
                    match tui_event {
                        TuiEvent::Key(key_event) => {
                            self.handle_key_event(key_event);
                            frames.schedule_frame();
                        }
                        TuiEvent::Paste(pasted) => {
                            let ops = event_handler::handle_paste(&pasted, &mut self.composer);
                            self.send_ops(ops);
                            frames.schedule_frame();
                        }
                        TuiEvent::Tick => frames.schedule_frame(),
                        TuiEvent::Draw => tui.draw(|frame| self.render(frame))?,
                    }
                }
            }
        }

        Ok(())
    }

    fn handle_core_event(&mut self, event: Event) {
        // Give an unsent message back unless the user already typed again.
        if let Event::SendFailed { content, .. } = &event {
            if self.composer.is_empty() {
                self.composer.set_input(content);
            }
        }
        event_handler::handle_core_event(&mut self.state, event);
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) {
        match event_handler::handle_keyboard_event(key_event, &mut self.composer, &mut self.chat_view)
        {
            KeyAction::Submit(ops) => self.send_ops(ops),
            KeyAction::Invalid(message) => self.state.notice = Some(Notice::error(message)),
            KeyAction::Quit => {
                self.send_op(Op::Shutdown);
                self.should_exit = true;
            }
        }
    }

    fn send_ops(&mut self, ops: Vec<Op>) {
        for op in ops {
            self.send_op(op);
        }
    }

    fn send_op(&mut self, op: Op) {
        match &op {
            Op::OpenTask { task_id } => self.open_task(task_id.clone()),
            // Typing only means something inside a task room.
            Op::SetTyping { .. } if self.state.chat.task_id.is_none() => return,
            _ => {}
        }

        match self.op_tx.try_send(op) {
            Ok(()) => {}
            Err(TrySendError::Full(op)) => {
                tracing::warn!(?op, "session is busy, dropping op");
                self.state.notice = Some(Notice::error("Busy, try again"));
            }
            Err(TrySendError::Closed(op)) => {
                tracing::warn!(?op, "session is gone");
                self.should_exit = true;
            }
        }
    }

    /// Reset the mirrored chat for a newly bound task.
    fn open_task(&mut self, task_id: Option<String>) {
        self.state.chat = ChatState {
            loading: task_id.is_some(),
            task_id,
            ..ChatState::default()
        };
        self.chat_view.follow();
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),    // Panels
                Constraint::Length(1), // Notice
                Constraint::Length(3), // Composer
            ])
            .split(area);

        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[0]);

        let view = PipelineView::build(&self.state.pipeline, Utc::now());
        render_pipeline_panel(frame, panels[0], &view, self.sync_type);
        let connection = self.connection.as_ref().map(|rx| *rx.borrow());
        self.chat_view
            .render(frame, panels[1], &self.state.chat, connection);
        self.render_notice(frame, rows[1]);
        self.composer.render(rows[2], frame.buffer_mut());
        self.render_popup(frame, rows[0]);
    }

    fn render_notice(&self, frame: &mut Frame, area: Rect) {
        let Some(notice) = &self.state.notice else {
            return;
        };
        let color = if notice.is_error {
            Color::Red
        } else {
            Color::Green
        };
        frame.render_widget(
            Paragraph::new(Line::from(notice.text.as_str())).style(Style::default().fg(color)),
            area,
        );
    }

    /// Suggestions float over the bottom of the panels.
    fn render_popup(&self, frame: &mut Frame, area: Rect) {
        let count = self.composer.suggestions().len();
        if !self.composer.should_show_popup() || count == 0 {
            return;
        }
        let height = (count as u16 + 2).min(area.height);
        let popup = Rect {
            x: area.x,
            y: area.y + area.height - height,
            width: area.width.min(60),
            height,
        };
        frame.render_widget(Clear, popup);
        self.composer.render_popup(popup, frame.buffer_mut());
    }
}

async fn connection_changed(
    connection: &mut Option<watch::Receiver<ConnectionStatus>>,
) -> Result<(), watch::error::RecvError> {
    match connection {
        Some(rx) => rx.changed().await,
        None => std::future::pending().await,
    }
}
