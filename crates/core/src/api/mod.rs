//! REST clients for the sync pipeline and task message endpoints.
//!
//! The traits are the seam the controller and chat depend on; the
//! [`http::HttpApiClient`] is the production implementation. Neither
//! retries nor caches: callers decide when to call again.

pub mod error;
pub mod http;
pub mod labels;

use async_trait::async_trait;
use od_protocol::message_models::{SendMessageRequest, TaskMessage};
use od_protocol::pipeline_models::{PipelineStatus, StartPipelineRequest, SyncType};

pub use error::ApiError;
pub use http::HttpApiClient;
pub use labels::get_step_label;

/// Operations against the sync pipeline service.
///
/// Mutating calls are fire-and-forget from the caller's point of view: the
/// response is not trusted as final state and callers re-fetch afterwards.
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Fetch the pipeline for a channel and sync type.
    ///
    /// Returns `Ok(None)` when the server has no such pipeline. That is an
    /// expected outcome, not an error.
    async fn get_pipeline_status(
        &self,
        channel_id: &str,
        sync_type: SyncType,
    ) -> Result<Option<PipelineStatus>, ApiError>;

    /// Start a new pipeline run.
    ///
    /// Returns the status if the server includes one in its response.
    async fn start_pipeline(
        &self,
        request: &StartPipelineRequest,
    ) -> Result<Option<PipelineStatus>, ApiError>;

    /// Retry a failed pipeline. The server rejects other states.
    async fn retry_pipeline(&self, pipeline_id: &str) -> Result<(), ApiError>;

    /// Pause an in-progress pipeline. The server rejects other states.
    async fn pause_pipeline(&self, pipeline_id: &str) -> Result<(), ApiError>;

    /// Resume a paused pipeline. The server rejects other states.
    async fn resume_pipeline(&self, pipeline_id: &str) -> Result<(), ApiError>;
}

/// Operations against the task message service.
#[async_trait]
pub trait TaskMessageApi: Send + Sync {
    /// Full message history of a task, oldest first.
    async fn fetch_messages(&self, task_id: &str) -> Result<Vec<TaskMessage>, ApiError>;

    /// Post a message and return the stored copy.
    async fn send_message(
        &self,
        task_id: &str,
        request: &SendMessageRequest,
    ) -> Result<TaskMessage, ApiError>;
}
