//! Pipeline status panel.
//!
//! Draws a [`PipelineView`] built by `od-core`: badge, progress bar, step
//! list and the commands currently available.

use od_core::pipeline::view::{
    start_label, ButtonState, PanelBody, ProgressBar, StatusPanel, StepDetail, StepRow, Tone,
};
use od_core::pipeline::PipelineView;
use od_protocol::SyncType;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Wrap;
use ratatui::Frame;

/// Width of the drawn progress bar, in cells.
const BAR_WIDTH: u16 = 30;

pub fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Neutral => Color::Gray,
        Tone::Info => Color::Cyan,
        Tone::Success => Color::Green,
        Tone::Danger => Color::Red,
        Tone::Warning => Color::Yellow,
    }
}

/// Render the pipeline panel.
///
/// `sync_type` only picks the caption of the start command.
pub fn render_pipeline_panel(
    frame: &mut Frame,
    area: Rect,
    view: &PipelineView,
    sync_type: SyncType,
) {
    let mut lines = match &view.body {
        PanelBody::Loading => vec![Line::from("Loading pipeline status...")],
        PanelBody::NoPipeline => vec![Line::from("No sync pipeline for this channel yet.")],
        PanelBody::LoadFailed { error } => vec![Line::from(Span::styled(
            format!("Failed to load pipeline status: {error}"),
            Style::default().fg(Color::Red),
        ))],
        PanelBody::Status(panel) => status_lines(panel),
    };

    lines.push(Line::default());
    lines.push(command_line(view, sync_type));
    if let Some(error) = &view.action_error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Sync Pipeline"),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn status_lines(panel: &StatusPanel) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" {} ", panel.badge.label),
                Style::default()
                    .fg(Color::Black)
                    .bg(tone_color(panel.badge.tone))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  {}", panel.step_caption)),
            Span::styled(
                format!("  {}", panel.duration),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        bar_line(&panel.progress),
    ];

    if let Some(message) = &panel.progress_message {
        lines.push(Line::from(message.clone()));
    }
    if let Some(error) = &panel.last_error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    lines.push(Line::default());
    lines.extend(panel.steps.iter().map(step_line));
    lines
}

fn bar_line(bar: &ProgressBar) -> Line<'static> {
    let filled = bar.filled(BAR_WIDTH);
    let empty = BAR_WIDTH - filled;
    Line::from(vec![
        Span::styled(
            "█".repeat(usize::from(filled)),
            Style::default().fg(tone_color(bar.tone)),
        ),
        Span::styled(
            "░".repeat(usize::from(empty)),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(format!(" {:.0}%", bar.percent)),
    ])
}

fn step_line(row: &StepRow) -> Line<'static> {
    let detail_style = match row.detail {
        StepDetail::Failed { .. } => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::DarkGray),
    };

    let mut spans = vec![
        Span::raw(format!("{} ", row.icon.glyph())),
        Span::raw(format!("{}. {}", row.number, row.label)),
    ];
    let detail = row.detail.text();
    if !detail.is_empty() {
        spans.push(Span::styled(format!("  {detail}"), detail_style));
    }
    match row.detail {
        StepDetail::Running {
            sub_progress: Some(percent),
            ..
        } => spans.push(Span::styled(format!(" ({percent:.0}%)"), detail_style)),
        StepDetail::Done {
            failed: Some(failed),
            ..
        } => spans.push(Span::styled(
            format!(", {failed} failed"),
            Style::default().fg(Color::Red),
        )),
        _ => {}
    }
    Line::from(spans)
}

/// Available commands, or the pending caption while an action is out.
fn command_line(view: &PipelineView, sync_type: SyncType) -> Line<'static> {
    if let Some(pending) = view.pending {
        return Line::from(Span::styled(
            pending,
            Style::default().fg(Color::Yellow),
        ));
    }

    let buttons = [
        ("/start", start_label(sync_type), view.buttons.start),
        ("/retry", "Retry", view.buttons.retry),
        ("/pause", "Pause", view.buttons.pause),
        ("/resume", "Resume", view.buttons.resume),
    ];

    let spans: Vec<Span<'static>> = buttons
        .into_iter()
        .filter(|(_, _, state)| state.is_visible())
        .map(|(command, caption, state)| {
            let style = match state {
                ButtonState::Enabled => Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
                _ => Style::default().fg(Color::DarkGray),
            };
            Span::styled(format!("[{command}] {caption}  "), style)
        })
        .collect();
    Line::from(spans)
}
