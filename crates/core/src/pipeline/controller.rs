//! Pipeline status controller.
//!
//! One controller per mounted pipeline view. A driver task owns the view
//! state and is the only thing that talks to the API:
//!
//! ```text
//!           mount
//!             │
//!        initial load ──(auto-start)──> start + fetch
//!             │
//!   ┌────── select! ───────┐
//!   │ command  │ poll tick │ poll done │ action done
//!   └──────────┴───────────┴───────────┘
//! ```
//!
//! Polling runs only while the held status is `PENDING` or `IN_PROGRESS`.
//! The next fetch is scheduled one interval after the previous one
//! finished, so requests never overlap. Fetches run beside the command
//! arm, so an action can be accepted while a poll is outstanding. An
//! accepted action drops that poll; its own re-fetch replaces the result.
//! While an action request is outstanding the poll timer is held back.

use chrono::NaiveDate;
use od_protocol::ipc::Event;
use od_protocol::pipeline_models::{
    PipelineRunStatus, PipelineStatus, StartPipelineRequest, SyncType,
};
use od_protocol::view_models::{
    PendingAction, PipelineAction, PipelinePhase, PipelineViewState,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::api::{ApiError, PipelineApi};
use crate::timer::wait_until;

/// Default delay between the end of one status fetch and the next.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2_000);

/// What a controller watches and how.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub channel_id: String,
    pub client_id: String,
    pub sync_type: SyncType,
    /// Only sent when `sync_type` is incremental.
    pub sync_from_date: Option<NaiveDate>,
    /// Start a pipeline when the first fetch finds none.
    pub auto_start: bool,
    pub poll_interval: Duration,
}

impl ControllerOptions {
    pub fn new(channel_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            client_id: client_id.into(),
            sync_type: SyncType::default(),
            sync_from_date: None,
            auto_start: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    fn start_request(&self) -> StartPipelineRequest {
        let request =
            StartPipelineRequest::new(&self.channel_id, &self.client_id, self.sync_type);
        match self.sync_from_date {
            Some(date) => request.with_sync_from_date(date),
            None => request,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    #[error("Cannot {action}: {reason}")]
    Rejected {
        action: PipelineAction,
        reason: String,
    },

    #[error("Pipeline view is no longer mounted")]
    Unmounted,
}

/// Why `action` cannot run in the given state, if it cannot.
pub fn rejection_reason(
    phase: &PipelinePhase,
    pending: PendingAction,
    action: PipelineAction,
) -> Option<&'static str> {
    if !pending.is_idle() {
        return Some("another action is in progress");
    }

    let status = phase.status().map(|status| status.status);
    match action {
        PipelineAction::Start => match phase {
            PipelinePhase::NoPipeline | PipelinePhase::LoadFailed { .. } => None,
            PipelinePhase::Loading => Some("status is still loading"),
            PipelinePhase::Displaying { .. } => Some("a pipeline already exists"),
        },
        PipelineAction::Retry => {
            (status != Some(PipelineRunStatus::Failed)).then_some("pipeline has not failed")
        }
        PipelineAction::Pause => {
            (status != Some(PipelineRunStatus::InProgress)).then_some("pipeline is not running")
        }
        PipelineAction::Resume => {
            (status != Some(PipelineRunStatus::Paused)).then_some("pipeline is not paused")
        }
    }
}

/// Whether `action` may be requested in the given state.
pub fn action_allowed(phase: &PipelinePhase, pending: PendingAction, action: PipelineAction) -> bool {
    rejection_reason(phase, pending, action).is_none()
}

struct Command {
    action: PipelineAction,
    reply: oneshot::Sender<Result<(), ControllerError>>,
}

/// Handle to a mounted pipeline view.
///
/// Dropping the handle stops the driver; no timer or request outlives it.
pub struct PipelineController {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<PipelineViewState>,
    driver: Option<JoinHandle<()>>,
}

impl PipelineController {
    /// Spawn the driver and begin the initial load.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount(
        api: Arc<dyn PipelineApi>,
        options: ControllerOptions,
        events_tx: mpsc::Sender<Event>,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(16);
        let (state_tx, state_rx) = watch::channel(PipelineViewState::default());

        tracing::debug!(
            channel_id = %options.channel_id,
            sync_type = %options.sync_type,
            "mounting pipeline view"
        );
        let driver = Driver {
            api,
            options,
            state: state_tx,
            events_tx,
            poll_deadline: None,
        };
        let driver = tokio::spawn(driver.run(commands_rx));

        Self {
            commands: commands_tx,
            state: state_rx,
            driver: Some(driver),
        }
    }

    pub async fn start(&self) -> Result<(), ControllerError> {
        self.request(PipelineAction::Start).await
    }

    pub async fn retry(&self) -> Result<(), ControllerError> {
        self.request(PipelineAction::Retry).await
    }

    pub async fn pause(&self) -> Result<(), ControllerError> {
        self.request(PipelineAction::Pause).await
    }

    pub async fn resume(&self) -> Result<(), ControllerError> {
        self.request(PipelineAction::Resume).await
    }

    /// Ask the driver to run `action`.
    ///
    /// Returns once the action was accepted or rejected; the outcome shows
    /// up in the view state.
    pub async fn request(&self, action: PipelineAction) -> Result<(), ControllerError> {
        let (reply, accepted) = oneshot::channel();
        self.commands
            .send(Command { action, reply })
            .await
            .map_err(|_| ControllerError::Unmounted)?;
        accepted.await.map_err(|_| ControllerError::Unmounted)?
    }

    pub fn snapshot(&self) -> PipelineViewState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineViewState> {
        self.state.clone()
    }

    /// Stop the driver and wait for it to finish.
    pub async fn unmount(mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
            let _ = driver.await;
        }
    }
}

impl Drop for PipelineController {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

/// Result of an action request followed by a status re-fetch.
enum ActionOutcome {
    Failed(ApiError),
    Done {
        /// Status returned by the start call, if any.
        started: Option<PipelineStatus>,
        refetch: Result<Option<PipelineStatus>, ApiError>,
    },
}

type ActionFuture = Pin<Box<dyn Future<Output = (PipelineAction, ActionOutcome)> + Send>>;
type PollFuture = Pin<Box<dyn Future<Output = Result<Option<PipelineStatus>, ApiError>> + Send>>;

struct Driver {
    api: Arc<dyn PipelineApi>,
    options: ControllerOptions,
    state: watch::Sender<PipelineViewState>,
    events_tx: mpsc::Sender<Event>,
    poll_deadline: Option<Instant>,
}

impl Driver {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        let mut in_flight: Option<ActionFuture> = None;
        let mut polling: Option<PollFuture> = Some(self.begin_poll());
        let mut loaded = false;
        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(Command { action, reply }) = command else { break };
                    let result = match self.accept(action).await {
                        Ok(future) => {
                            if polling.take().is_some() {
                                tracing::debug!(%action, "dropping status poll superseded by action");
                            }
                            in_flight = Some(future);
                            Ok(())
                        }
                        Err(err) => Err(err),
                    };
                    let _ = reply.send(result);
                }
                (action, outcome) = next_outcome(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    self.finish_action(action, outcome).await;
                }
                fetched = next_poll(&mut polling), if polling.is_some() => {
                    polling = None;
                    if loaded {
                        self.finish_poll(fetched).await;
                    } else {
                        loaded = true;
                        in_flight = self.finish_initial_load(fetched).await;
                    }
                }
                () = wait_until(self.poll_deadline), if in_flight.is_none() && polling.is_none() => {
                    self.poll_deadline = None;
                    polling = Some(self.begin_poll());
                }
            }
        }
        tracing::debug!(channel_id = %self.options.channel_id, "pipeline view stopped");
    }

    /// Apply the first fetch. Returns the start request when the channel
    /// has no pipeline and auto-start is on.
    async fn finish_initial_load(
        &mut self,
        fetched: Result<Option<PipelineStatus>, ApiError>,
    ) -> Option<ActionFuture> {
        match fetched {
            Ok(Some(status)) => self.show(status).await,
            Ok(None) if self.options.auto_start => {
                tracing::info!(channel_id = %self.options.channel_id, "no pipeline found, starting one");
                self.update(|state| state.pending_action = PendingAction::Starting)
                    .await;
                return Some(self.action_future(PipelineAction::Start, String::new()));
            }
            Ok(None) => {
                tracing::info!(channel_id = %self.options.channel_id, "no pipeline found");
                self.update(|state| state.phase = PipelinePhase::NoPipeline).await;
            }
            Err(err) => {
                tracing::warn!(channel_id = %self.options.channel_id, %err, "initial status load failed");
                let error = err.to_string();
                self.update(|state| state.phase = PipelinePhase::LoadFailed { error })
                    .await;
            }
        }
        None
    }

    fn begin_poll(&self) -> PollFuture {
        let api = Arc::clone(&self.api);
        let channel_id = self.options.channel_id.clone();
        let sync_type = self.options.sync_type;
        Box::pin(async move { api.get_pipeline_status(&channel_id, sync_type).await })
    }

    async fn finish_poll(&mut self, fetched: Result<Option<PipelineStatus>, ApiError>) {
        match fetched {
            Ok(Some(status)) => self.show(status).await,
            Ok(None) => {
                tracing::warn!(channel_id = %self.options.channel_id, "pipeline not found while polling");
                self.reschedule();
            }
            Err(err) => {
                tracing::warn!(channel_id = %self.options.channel_id, %err, "status poll failed");
                self.reschedule();
            }
        }
    }

    /// Validate `action` against the current state and, if allowed, mark
    /// it pending and build its request.
    async fn accept(&mut self, action: PipelineAction) -> Result<ActionFuture, ControllerError> {
        let (reason, pipeline_id) = {
            let state = self.state.borrow();
            (
                rejection_reason(&state.phase, state.pending_action, action),
                state
                    .phase
                    .status()
                    .map(|status| status.pipeline_id.clone())
                    .unwrap_or_default(),
            )
        };

        if let Some(reason) = reason {
            tracing::debug!(%action, reason, "pipeline action rejected");
            self.emit(Event::ActionRejected {
                action,
                reason: reason.to_string(),
            })
            .await;
            return Err(ControllerError::Rejected {
                action,
                reason: reason.to_string(),
            });
        }

        self.update(|state| {
            state.pending_action = action.into();
            state.action_error = None;
        })
        .await;

        Ok(self.action_future(action, pipeline_id))
    }

    fn action_future(&self, action: PipelineAction, pipeline_id: String) -> ActionFuture {
        let api = Arc::clone(&self.api);
        let options = self.options.clone();
        Box::pin(async move {
            let outcome = run_action(api.as_ref(), &options, action, &pipeline_id).await;
            (action, outcome)
        })
    }

    async fn finish_action(&mut self, action: PipelineAction, outcome: ActionOutcome) {
        let first_load = matches!(self.state.borrow().phase, PipelinePhase::Loading);
        match outcome {
            // Auto-start during the first load: there is nothing to keep.
            ActionOutcome::Failed(err) if first_load => {
                tracing::warn!(channel_id = %self.options.channel_id, %err, "auto-start failed");
                let error = err.to_string();
                self.update(|state| {
                    state.pending_action = PendingAction::Idle;
                    state.phase = PipelinePhase::LoadFailed { error };
                })
                .await;
            }
            ActionOutcome::Failed(err) => {
                tracing::warn!(%action, %err, "pipeline action failed");
                let error = err.to_string();
                self.emit(Event::ActionFailed {
                    action,
                    error: error.clone(),
                })
                .await;
                self.update(|state| {
                    state.pending_action = PendingAction::Idle;
                    state.action_error = Some(error);
                })
                .await;
                self.reschedule();
            }
            ActionOutcome::Done { started, refetch } => {
                tracing::info!(%action, channel_id = %self.options.channel_id, "pipeline action accepted");
                self.update(|state| state.pending_action = PendingAction::Idle)
                    .await;
                self.apply_refetch(started, refetch).await;
            }
        }
    }

    /// Show the status fetched after an action. Falls back to the status
    /// the start call returned, then to the held status.
    async fn apply_refetch(
        &mut self,
        started: Option<PipelineStatus>,
        refetch: Result<Option<PipelineStatus>, ApiError>,
    ) {
        let (status, error) = match refetch {
            Ok(found) => (found.or(started), None),
            Err(err) => {
                tracing::warn!(channel_id = %self.options.channel_id, %err, "status refresh failed");
                (started, Some(err.to_string()))
            }
        };

        match status {
            Some(status) => self.show(status).await,
            None if self.held_status().is_some() => self.reschedule(),
            None => {
                let phase = match error {
                    Some(error) => PipelinePhase::LoadFailed { error },
                    None => PipelinePhase::NoPipeline,
                };
                self.update(|state| state.phase = phase).await;
            }
        }
    }

    /// Replace the held status, announce transitions and re-arm polling.
    async fn show(&mut self, status: PipelineStatus) {
        let previous = self.held_status();
        let pipeline_id = status.pipeline_id.clone();
        let completed =
            status.status == PipelineRunStatus::Completed && previous != Some(PipelineRunStatus::Completed);
        let failed = if status.status == PipelineRunStatus::Failed
            && previous != Some(PipelineRunStatus::Failed)
        {
            status.last_error.clone()
        } else {
            None
        };

        self.update(|state| state.phase = PipelinePhase::Displaying { status })
            .await;

        if completed {
            tracing::info!(%pipeline_id, "pipeline completed");
            self.emit(Event::PipelineCompleted { pipeline_id }).await;
        } else if let Some(error) = failed {
            tracing::warn!(%pipeline_id, %error, "pipeline failed");
            self.emit(Event::PipelineFailed { pipeline_id, error }).await;
        }
        self.reschedule();
    }

    fn held_status(&self) -> Option<PipelineRunStatus> {
        self.state.borrow().phase.status().map(|status| status.status)
    }

    fn reschedule(&mut self) {
        self.poll_deadline = self
            .held_status()
            .filter(|status| status.is_polling())
            .map(|_| Instant::now() + self.options.poll_interval);
    }

    /// Apply `modify` and publish the new state if it changed.
    async fn update<F>(&mut self, modify: F)
    where
        F: FnOnce(&mut PipelineViewState),
    {
        let changed = self.state.send_if_modified(|state| {
            let before = state.clone();
            modify(state);
            *state != before
        });
        if changed {
            let state = self.state.borrow().clone();
            self.emit(Event::PipelineStateChanged { state }).await;
        }
    }

    async fn emit(&self, event: Event) {
        // A closed receiver means the UI is gone; the watch still updates.
        let _ = self.events_tx.send(event).await;
    }
}

async fn next_outcome(in_flight: &mut Option<ActionFuture>) -> (PipelineAction, ActionOutcome) {
    match in_flight {
        Some(future) => future.await,
        None => std::future::pending().await,
    }
}

async fn next_poll(polling: &mut Option<PollFuture>) -> Result<Option<PipelineStatus>, ApiError> {
    match polling {
        Some(future) => future.await,
        None => std::future::pending().await,
    }
}

/// Send the action request, then re-fetch the status.
async fn run_action(
    api: &dyn PipelineApi,
    options: &ControllerOptions,
    action: PipelineAction,
    pipeline_id: &str,
) -> ActionOutcome {
    let result = match action {
        PipelineAction::Start => api.start_pipeline(&options.start_request()).await,
        PipelineAction::Retry => api.retry_pipeline(pipeline_id).await.map(|()| None),
        PipelineAction::Pause => api.pause_pipeline(pipeline_id).await.map(|()| None),
        PipelineAction::Resume => api.resume_pipeline(pipeline_id).await.map(|()| None),
    };

    match result {
        Ok(started) => ActionOutcome::Done {
            started,
            refetch: api
                .get_pipeline_status(&options.channel_id, options.sync_type)
                .await,
        },
        Err(err) => ActionOutcome::Failed(err),
    }
}
