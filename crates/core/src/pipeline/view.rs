//! Renderer-independent description of the pipeline panel.
//!
//! Everything a renderer needs is derived here from a [`PipelineViewState`]
//! with pure functions, so the terminal layer only maps [`Tone`]s to colors
//! and [`StepIcon`]s to glyphs.

use chrono::{DateTime, Utc};
use od_protocol::pipeline_models::{
    PipelineRunStatus, PipelineStatus, PipelineStep, StepStatus, SyncType,
};
use od_protocol::view_models::{PendingAction, PipelinePhase, PipelineViewState};

use crate::api::get_step_label;

/// Color role of a badge or bar. One per pipeline status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Neutral,
    Info,
    Success,
    Danger,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBadge {
    pub label: &'static str,
    pub tone: Tone,
}

pub fn status_badge(status: PipelineRunStatus) -> StatusBadge {
    let (label, tone) = match status {
        PipelineRunStatus::Pending => ("Pending", Tone::Neutral),
        PipelineRunStatus::InProgress => ("In progress", Tone::Info),
        PipelineRunStatus::Completed => ("Completed", Tone::Success),
        PipelineRunStatus::Failed => ("Failed", Tone::Danger),
        PipelineRunStatus::Paused => ("Paused", Tone::Warning),
    };
    StatusBadge { label, tone }
}

/// Clamp a server-reported percentage into `[0, 100]`. NaN becomes 0.
pub fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        return 0.0;
    }
    progress.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressBar {
    /// Always within `[0, 100]`.
    pub percent: f64,
    pub tone: Tone,
}

impl ProgressBar {
    /// Filled cells out of `width`.
    pub fn filled(&self, width: u16) -> u16 {
        let filled = (f64::from(width) * self.percent / 100.0).round();
        // percent is clamped, so filled is within [0, width].
        filled as u16
    }
}

pub fn progress_bar(status: &PipelineStatus) -> ProgressBar {
    let tone = match status.status {
        PipelineRunStatus::Failed => Tone::Danger,
        PipelineRunStatus::Completed => Tone::Success,
        PipelineRunStatus::Paused => Tone::Warning,
        PipelineRunStatus::Pending | PipelineRunStatus::InProgress => Tone::Info,
    };
    ProgressBar {
        percent: clamp_progress(status.progress),
        tone,
    }
}

/// Elapsed run time: `completed_at` (or `now`) minus `started_at`.
///
/// `"{m}m {s}s"` from one minute up, `"{s}s"` below, empty without a start.
pub fn format_duration(
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> String {
    let Some(started_at) = started_at else {
        return String::new();
    };
    let end = completed_at.unwrap_or(now);
    let seconds = (end - started_at).num_seconds().max(0);

    if seconds >= 60 {
        let minutes = seconds / 60;
        let seconds = seconds % 60;
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Per-step icon. Distinct from the pipeline-level badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepIcon {
    Waiting,
    Spinner,
    Check,
    Cross,
    Skipped,
}

impl StepIcon {
    pub fn for_status(status: StepStatus) -> Self {
        match status {
            StepStatus::Pending => Self::Waiting,
            StepStatus::InProgress => Self::Spinner,
            StepStatus::Completed => Self::Check,
            StepStatus::Failed => Self::Cross,
            StepStatus::Skipped => Self::Skipped,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::Waiting => "○",
            Self::Spinner => "◐",
            Self::Check => "✓",
            Self::Cross => "✗",
            Self::Skipped => "⊘",
        }
    }
}

/// Secondary line of a step row.
#[derive(Debug, Clone, PartialEq)]
pub enum StepDetail {
    None,
    Running {
        processed: u64,
        /// `None` when the total is unknown.
        total: Option<u64>,
        /// Sub-progress percent, only with a known total.
        sub_progress: Option<f64>,
    },
    Done {
        processed: u64,
        /// Only set when non-zero.
        failed: Option<u64>,
    },
    Failed {
        message: Option<String>,
    },
}

impl StepDetail {
    /// Plain text of the detail, without the failed-item count.
    pub fn text(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Running {
                processed, total, ..
            } => match total {
                Some(total) => format!("{processed} / {total}"),
                None => format!("{processed} / ?"),
            },
            Self::Done { processed, .. } => format!("{processed} processed"),
            Self::Failed { message } => message.clone().unwrap_or_else(|| "Step failed".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepRow {
    pub number: u32,
    pub label: String,
    pub icon: StepIcon,
    pub detail: StepDetail,
}

pub fn step_row(step: &PipelineStep) -> StepRow {
    let detail = match step.status {
        StepStatus::InProgress => {
            let total = (step.items_total > 0).then_some(step.items_total);
            StepDetail::Running {
                processed: step.items_processed,
                total,
                sub_progress: total.map(|total| {
                    clamp_progress(step.items_processed as f64 * 100.0 / total as f64)
                }),
            }
        }
        StepStatus::Completed => StepDetail::Done {
            processed: step.items_processed,
            failed: (step.items_failed > 0).then_some(step.items_failed),
        },
        StepStatus::Failed => StepDetail::Failed {
            message: step.error_message.clone(),
        },
        StepStatus::Pending | StepStatus::Skipped => StepDetail::None,
    };

    StepRow {
        number: step.step_number,
        label: get_step_label(&step.step_name).to_string(),
        icon: StepIcon::for_status(step.status),
        detail,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Hidden,
    Enabled,
    Disabled,
}

impl ButtonState {
    fn shown(visible: bool, pending: PendingAction) -> Self {
        match (visible, pending.is_idle()) {
            (false, _) => Self::Hidden,
            (true, true) => Self::Enabled,
            (true, false) => Self::Disabled,
        }
    }

    pub fn is_visible(self) -> bool {
        self != Self::Hidden
    }

    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionButtons {
    pub start: ButtonState,
    pub retry: ButtonState,
    pub pause: ButtonState,
    pub resume: ButtonState,
}

/// Button visibility follows the phase and held status only; every visible
/// button is disabled while an action is pending.
pub fn action_buttons(state: &PipelineViewState) -> ActionButtons {
    let pending = state.pending_action;
    let status = state.phase.status().map(|status| status.status);
    let can_start = matches!(
        state.phase,
        PipelinePhase::NoPipeline | PipelinePhase::LoadFailed { .. }
    );

    ActionButtons {
        start: ButtonState::shown(can_start, pending),
        retry: ButtonState::shown(status == Some(PipelineRunStatus::Failed), pending),
        pause: ButtonState::shown(status == Some(PipelineRunStatus::InProgress), pending),
        resume: ButtonState::shown(status == Some(PipelineRunStatus::Paused), pending),
    }
}

/// Caption of the start button, e.g. "Start Initial Sync".
pub fn start_label(sync_type: SyncType) -> &'static str {
    match sync_type {
        SyncType::Initial => "Start Initial Sync",
        SyncType::Full => "Start Full Sync",
        SyncType::Incremental => "Start Incremental Sync",
    }
}

/// Text shown while an action is outstanding.
pub fn pending_label(pending: PendingAction) -> Option<&'static str> {
    match pending {
        PendingAction::Idle => None,
        PendingAction::Starting => Some("Starting..."),
        PendingAction::Retrying => Some("Retrying..."),
        PendingAction::Pausing => Some("Pausing..."),
        PendingAction::Resuming => Some("Resuming..."),
    }
}

/// Body of the panel, by phase.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelBody {
    Loading,
    NoPipeline,
    LoadFailed { error: String },
    Status(StatusPanel),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusPanel {
    pub pipeline_id: String,
    pub badge: StatusBadge,
    pub progress: ProgressBar,
    /// "Step 2 of 5".
    pub step_caption: String,
    pub duration: String,
    pub progress_message: Option<String>,
    pub last_error: Option<String>,
    pub steps: Vec<StepRow>,
}

/// Complete panel description for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineView {
    pub body: PanelBody,
    pub buttons: ActionButtons,
    pub pending: Option<&'static str>,
    pub action_error: Option<String>,
}

impl PipelineView {
    pub fn build(state: &PipelineViewState, now: DateTime<Utc>) -> Self {
        let body = match &state.phase {
            PipelinePhase::Loading => PanelBody::Loading,
            PipelinePhase::NoPipeline => PanelBody::NoPipeline,
            PipelinePhase::LoadFailed { error } => PanelBody::LoadFailed {
                error: error.clone(),
            },
            PipelinePhase::Displaying { status } => PanelBody::Status(StatusPanel {
                pipeline_id: status.pipeline_id.clone(),
                badge: status_badge(status.status),
                progress: progress_bar(status),
                step_caption: format!("Step {} of {}", status.current_step, status.total_steps),
                duration: format_duration(status.started_at, status.completed_at, now),
                progress_message: status.progress_message.clone(),
                last_error: status.last_error.clone(),
                steps: status.steps.iter().map(step_row).collect(),
            }),
        };

        Self {
            body,
            buttons: action_buttons(state),
            pending: pending_label(state.pending_action),
            action_error: state.action_error.clone(),
        }
    }
}
