//! Sync pipeline status models.
//!
//! A sync pipeline is a server-side, multi-step process that onboards or
//! refreshes a sales channel. The client only observes and minimally
//! controls it, so these types mirror what the status endpoint returns.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Overall lifecycle status of a pipeline run.
///
/// The status progresses through these states during normal execution:
/// Pending -> InProgress -> Completed
///
/// Special states:
/// - Paused: Manually paused by the user
/// - Failed: Execution stopped on an error, can be retried
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineRunStatus {
    /// Run has been created but no step has started yet.
    Pending,

    /// A step is actively executing.
    InProgress,

    /// All steps finished.
    Completed,

    /// A step failed and the run stopped.
    Failed,

    /// Run was paused by user request.
    Paused,
}

impl PipelineRunStatus {
    /// Whether a view holding this status should keep re-fetching it.
    pub fn is_polling(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Paused => "PAUSED",
        }
    }
}

/// Status of a single step inside a pipeline run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

/// One discrete unit of work within a pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStep {
    /// 1-based position, matching the order of `PipelineStatus::steps`.
    pub step_number: u32,

    /// Machine identifier, mapped to a display label by the client.
    pub step_name: String,

    #[serde(default)]
    pub step_description: Option<String>,

    pub status: StepStatus,

    #[serde(default)]
    pub items_processed: u64,

    #[serde(default)]
    pub items_failed: u64,

    /// Total number of items for this step. `0` means the total is unknown.
    #[serde(default)]
    pub items_total: u64,

    /// Present when `status` is `Failed`.
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Snapshot of a pipeline run as reported by the server.
///
/// The server guarantees at most one step is in progress at a time, with
/// completed or skipped steps before it and pending steps after it. The
/// client does not rely on that and renders whatever it receives.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStatus {
    /// Opaque identifier used by the retry/pause/resume endpoints.
    pub pipeline_id: String,

    pub status: PipelineRunStatus,

    pub current_step: u32,

    pub total_steps: u32,

    /// Overall percentage. Expected in `[0, 100]` but not trusted.
    pub progress: f64,

    #[serde(default)]
    pub progress_message: Option<String>,

    /// Steps in execution order.
    #[serde(default)]
    pub steps: Vec<PipelineStep>,

    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    /// Only set once the run reached a terminal state.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,

    /// Present when `status` is `Failed`.
    #[serde(default)]
    pub last_error: Option<String>,
}

/// Kind of sync a pipeline performs for a channel.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum SyncType {
    /// First onboarding of a channel.
    #[default]
    Initial,
    /// Full re-sync of everything.
    Full,
    /// Only changes since `sync_from_date`.
    Incremental,
}

impl SyncType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Full => "full",
            Self::Incremental => "incremental",
        }
    }
}

impl std::fmt::Display for SyncType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SyncType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "initial" => Ok(Self::Initial),
            "full" => Ok(Self::Full),
            "incremental" => Ok(Self::Incremental),
            other => Err(format!(
                "unknown sync type '{other}', expected initial, full or incremental"
            )),
        }
    }
}

/// Payload for starting a new pipeline run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct StartPipelineRequest {
    pub channel_id: String,

    pub client_id: String,

    /// Lower bound for an incremental sync. Ignored for other sync types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_from_date: Option<NaiveDate>,

    pub sync_type: SyncType,
}

impl StartPipelineRequest {
    /// Create a request without a `sync_from_date`.
    pub fn new(
        channel_id: impl Into<String>,
        client_id: impl Into<String>,
        sync_type: SyncType,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            client_id: client_id.into(),
            sync_from_date: None,
            sync_type,
        }
    }

    /// Set the lower bound date for an incremental sync.
    pub fn with_sync_from_date(mut self, date: NaiveDate) -> Self {
        self.sync_from_date = Some(date);
        self
    }

    /// Check the fields the server requires.
    pub fn validate(&self) -> Result<(), String> {
        if self.channel_id.trim().is_empty() {
            return Err("channelId is required".to_string());
        }
        if self.client_id.trim().is_empty() {
            return Err("clientId is required".to_string());
        }
        Ok(())
    }

    /// Copy of the request with `sync_from_date` dropped unless the sync
    /// is incremental.
    pub fn normalized(&self) -> Self {
        let mut request = self.clone();
        if request.sync_type != SyncType::Incremental {
            request.sync_from_date = None;
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polling_statuses() {
        assert!(PipelineRunStatus::Pending.is_polling());
        assert!(PipelineRunStatus::InProgress.is_polling());
        assert!(!PipelineRunStatus::Paused.is_polling());
        assert!(!PipelineRunStatus::Completed.is_polling());
        assert!(!PipelineRunStatus::Failed.is_polling());
    }

    #[test]
    fn test_sync_type_from_str() {
        assert_eq!("Initial".parse::<SyncType>(), Ok(SyncType::Initial));
        assert_eq!(" incremental ".parse::<SyncType>(), Ok(SyncType::Incremental));
        assert!("delta".parse::<SyncType>().is_err());
    }

    #[test]
    fn test_start_request_validation() {
        assert!(StartPipelineRequest::new("ch-1", "cl-1", SyncType::Full)
            .validate()
            .is_ok());
        assert!(StartPipelineRequest::new(" ", "cl-1", SyncType::Full)
            .validate()
            .is_err());
        assert!(StartPipelineRequest::new("ch-1", "", SyncType::Full)
            .validate()
            .is_err());
    }

    #[test]
    fn test_normalized_drops_date_for_non_incremental() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
        let full = StartPipelineRequest::new("ch", "cl", SyncType::Full).with_sync_from_date(date);
        assert_eq!(full.normalized().sync_from_date, None);

        let incremental =
            StartPipelineRequest::new("ch", "cl", SyncType::Incremental).with_sync_from_date(date);
        assert_eq!(incremental.normalized().sync_from_date, Some(date));
    }
}
