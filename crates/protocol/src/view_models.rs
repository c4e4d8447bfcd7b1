//! View state for the pipeline status panel.
//!
//! These are the client-side states of a mounted pipeline view. They are
//! produced by the controller in `od-core` and consumed by any renderer.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::pipeline_models::PipelineStatus;

/// A user action against the pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "camelCase")]
pub enum PipelineAction {
    Start,
    Retry,
    Pause,
    Resume,
}

impl PipelineAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Retry => "retry",
            Self::Pause => "pause",
            Self::Resume => "resume",
        }
    }
}

impl std::fmt::Display for PipelineAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which action request, if any, is currently outstanding.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, TS)]
#[serde(rename_all = "camelCase")]
pub enum PendingAction {
    #[default]
    Idle,
    Starting,
    Retrying,
    Pausing,
    Resuming,
}

impl PendingAction {
    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }
}

impl From<PipelineAction> for PendingAction {
    fn from(action: PipelineAction) -> Self {
        match action {
            PipelineAction::Start => Self::Starting,
            PipelineAction::Retry => Self::Retrying,
            PipelineAction::Pause => Self::Pausing,
            PipelineAction::Resume => Self::Resuming,
        }
    }
}

/// Lifecycle phase of a pipeline view.
///
/// ```text
/// Loading --found--------------------------> Displaying
///         --not found, auto-start, found---> Displaying
///         --not found----------------------> NoPipeline
///         --transport error----------------> LoadFailed
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum PipelinePhase {
    /// First fetch has not resolved yet.
    Loading,

    /// The server has no pipeline for this channel and sync type.
    NoPipeline,

    /// The first fetch failed before any status was known.
    LoadFailed { error: String },

    /// A status is known and shown.
    Displaying { status: PipelineStatus },
}

impl PipelinePhase {
    /// The held status, if any.
    pub fn status(&self) -> Option<&PipelineStatus> {
        match self {
            Self::Displaying { status } => Some(status),
            _ => None,
        }
    }
}

/// Full renderable state of a pipeline view.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct PipelineViewState {
    pub phase: PipelinePhase,

    pub pending_action: PendingAction,

    /// Error from the last failed action. Does not replace the held status.
    pub action_error: Option<String>,
}

impl Default for PipelineViewState {
    fn default() -> Self {
        Self {
            phase: PipelinePhase::Loading,
            pending_action: PendingAction::Idle,
            action_error: None,
        }
    }
}
