//! Colored text rendering of pipeline statuses for one-shot commands.

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use od_core::pipeline::view::{PanelBody, StatusPanel, StepDetail, StepRow, Tone};
use od_core::pipeline::PipelineView;
use od_protocol::{PipelinePhase, PipelineStatus, PipelineViewState};

const BAR_WIDTH: u16 = 20;

fn paint(text: &str, tone: Tone) -> ColoredString {
    match tone {
        Tone::Neutral => text.normal(),
        Tone::Info => text.cyan(),
        Tone::Success => text.green(),
        Tone::Danger => text.red(),
        Tone::Warning => text.yellow(),
    }
}

/// Multi-line description of `status` as of `now`.
pub fn format_status(status: &PipelineStatus, now: DateTime<Utc>) -> String {
    let state = PipelineViewState {
        phase: PipelinePhase::Displaying {
            status: status.clone(),
        },
        ..PipelineViewState::default()
    };
    match PipelineView::build(&state, now).body {
        PanelBody::Status(panel) => format_panel(&panel),
        _ => String::new(),
    }
}

fn format_panel(panel: &StatusPanel) -> String {
    let mut lines = vec![format!(
        "Pipeline {}  {}",
        panel.pipeline_id.bold(),
        paint(&format!("[{}]", panel.badge.label), panel.badge.tone).bold()
    )];

    let filled = panel.progress.filled(BAR_WIDTH);
    let bar = format!(
        "{}{}",
        "█".repeat(usize::from(filled)),
        "░".repeat(usize::from(BAR_WIDTH - filled))
    );
    let mut summary = format!(
        "{} {:.0}%  {}",
        paint(&bar, panel.progress.tone),
        panel.progress.percent,
        panel.step_caption
    );
    if !panel.duration.is_empty() {
        summary.push_str(&format!("  {}", panel.duration.dimmed()));
    }
    lines.push(summary);

    if let Some(message) = &panel.progress_message {
        lines.push(message.clone());
    }
    if let Some(error) = &panel.last_error {
        lines.push(format!("{} {}", "Error:".red().bold(), error));
    }
    lines.extend(panel.steps.iter().map(format_step));
    lines.join("\n")
}

fn format_step(row: &StepRow) -> String {
    let mut line = format!("  {} {}. {}", row.icon.glyph(), row.number, row.label);
    let detail = row.detail.text();
    match &row.detail {
        StepDetail::None => {}
        StepDetail::Failed { .. } => line.push_str(&format!("  {}", detail.red())),
        StepDetail::Running {
            sub_progress: Some(percent),
            ..
        } => line.push_str(&format!("  {detail} ({percent:.0}%)")),
        StepDetail::Done {
            failed: Some(failed),
            ..
        } => line.push_str(&format!("  {detail}, {}", format!("{failed} failed").red())),
        _ => line.push_str(&format!("  {detail}")),
    }
    line
}
