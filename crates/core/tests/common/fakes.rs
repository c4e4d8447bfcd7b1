//! In-memory fakes of the REST clients.
//!
//! [`FakePipelineApi`] behaves like a tiny pipeline server: actions move the
//! held status the way the real service would. Individual responses can be
//! scripted on top of that to inject not-found results and failures.

use async_trait::async_trait;
use chrono::Utc;
use od_core::api::{ApiError, PipelineApi, TaskMessageApi};
use od_protocol::message_models::{SendMessageRequest, TaskMessage};
use od_protocol::pipeline_models::{
    PipelineRunStatus, PipelineStatus, StartPipelineRequest, SyncType,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// One call received by [`FakePipelineApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    GetStatus { at: Instant },
    Start(StartPipelineRequest),
    Retry(String),
    Pause(String),
    Resume(String),
}

#[derive(Default)]
struct PipelineServer {
    current: Option<PipelineStatus>,
    /// Responses returned by the next status fetches, ahead of `current`.
    scripted: VecDeque<Result<Option<PipelineStatus>, ApiError>>,
    next_action_error: Option<ApiError>,
    /// How long each status fetch takes to answer.
    fetch_delay: Option<Duration>,
    calls: Vec<ApiCall>,
}

#[derive(Default)]
pub struct FakePipelineApi {
    server: Mutex<PipelineServer>,
    /// When set, action calls wait for a notification before answering.
    action_gate: Option<Arc<Notify>>,
}

#[allow(dead_code)]
impl FakePipelineApi {
    /// A server with no pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// A server holding `status`.
    pub fn with_status(status: PipelineStatus) -> Self {
        let api = Self::new();
        api.set_status(Some(status));
        api
    }

    /// Hold every action call until the returned handle is notified.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.action_gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn set_status(&self, status: Option<PipelineStatus>) {
        self.server.lock().unwrap().current = status;
    }

    /// Queue the response of an upcoming status fetch.
    pub fn script(&self, response: Result<Option<PipelineStatus>, ApiError>) {
        self.server.lock().unwrap().scripted.push_back(response);
    }

    /// Make every later status fetch take `delay` before answering.
    pub fn slow_fetches(&self, delay: Duration) {
        self.server.lock().unwrap().fetch_delay = Some(delay);
    }

    /// Make the next action call fail with `err`.
    pub fn fail_next_action(&self, err: ApiError) {
        self.server.lock().unwrap().next_action_error = Some(err);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.server.lock().unwrap().calls.clone()
    }

    pub fn fetch_times(&self) -> Vec<Instant> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::GetStatus { at } => Some(at),
                _ => None,
            })
            .collect()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_times().len()
    }

    pub fn action_calls(&self) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, ApiCall::GetStatus { .. }))
            .collect()
    }

    async fn action(
        &self,
        call: ApiCall,
        apply: impl FnOnce(&mut Option<PipelineStatus>),
    ) -> Result<(), ApiError> {
        self.server.lock().unwrap().calls.push(call);
        if let Some(gate) = &self.action_gate {
            gate.notified().await;
        }

        let mut server = self.server.lock().unwrap();
        if let Some(err) = server.next_action_error.take() {
            return Err(err);
        }
        apply(&mut server.current);
        Ok(())
    }
}

fn set_run_status(current: &mut Option<PipelineStatus>, run: PipelineRunStatus) {
    if let Some(status) = current {
        status.status = run;
        if run != PipelineRunStatus::Failed {
            status.last_error = None;
        }
    }
}

#[async_trait]
impl PipelineApi for FakePipelineApi {
    async fn get_pipeline_status(
        &self,
        _channel_id: &str,
        _sync_type: SyncType,
    ) -> Result<Option<PipelineStatus>, ApiError> {
        let delay = {
            let mut server = self.server.lock().unwrap();
            server.calls.push(ApiCall::GetStatus { at: Instant::now() });
            server.fetch_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut server = self.server.lock().unwrap();
        match server.scripted.pop_front() {
            Some(response) => response,
            None => Ok(server.current.clone()),
        }
    }

    async fn start_pipeline(
        &self,
        request: &StartPipelineRequest,
    ) -> Result<Option<PipelineStatus>, ApiError> {
        self.action(ApiCall::Start(request.clone()), |current| {
            let mut status = super::fixtures::create_status(PipelineRunStatus::Pending, 0.0);
            status.current_step = 0;
            *current = Some(status);
        })
        .await?;
        // The start endpoint only acknowledges; the status comes from a fetch.
        Ok(None)
    }

    async fn retry_pipeline(&self, pipeline_id: &str) -> Result<(), ApiError> {
        self.action(ApiCall::Retry(pipeline_id.to_string()), |current| {
            set_run_status(current, PipelineRunStatus::InProgress);
        })
        .await
    }

    async fn pause_pipeline(&self, pipeline_id: &str) -> Result<(), ApiError> {
        self.action(ApiCall::Pause(pipeline_id.to_string()), |current| {
            set_run_status(current, PipelineRunStatus::Paused);
        })
        .await
    }

    async fn resume_pipeline(&self, pipeline_id: &str) -> Result<(), ApiError> {
        self.action(ApiCall::Resume(pipeline_id.to_string()), |current| {
            set_run_status(current, PipelineRunStatus::InProgress);
        })
        .await
    }
}

#[derive(Default)]
struct MessageStore {
    history: HashMap<String, Vec<TaskMessage>>,
    history_error: Option<ApiError>,
    send_error: Option<ApiError>,
    fetches: Vec<String>,
    sent: Vec<(String, SendMessageRequest)>,
}

/// Task message service keeping everything in memory.
#[derive(Default)]
pub struct FakeMessageApi {
    store: Mutex<MessageStore>,
    /// When set, history fetches wait for a notification before answering.
    history_gate: Option<Arc<Notify>>,
}

#[allow(dead_code)]
impl FakeMessageApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every history fetch until the returned handle is notified.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.history_gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn with_history(self, task_id: &str, messages: Vec<TaskMessage>) -> Self {
        self.store
            .lock()
            .unwrap()
            .history
            .insert(task_id.to_string(), messages);
        self
    }

    pub fn fail_history(&self, err: ApiError) {
        self.store.lock().unwrap().history_error = Some(err);
    }

    pub fn fail_send(&self, err: ApiError) {
        self.store.lock().unwrap().send_error = Some(err);
    }

    pub fn fetches(&self) -> Vec<String> {
        self.store.lock().unwrap().fetches.clone()
    }

    pub fn sent(&self) -> Vec<(String, SendMessageRequest)> {
        self.store.lock().unwrap().sent.clone()
    }
}

#[async_trait]
impl TaskMessageApi for FakeMessageApi {
    async fn fetch_messages(&self, task_id: &str) -> Result<Vec<TaskMessage>, ApiError> {
        self.store.lock().unwrap().fetches.push(task_id.to_string());
        if let Some(gate) = &self.history_gate {
            gate.notified().await;
        }

        let store = self.store.lock().unwrap();
        if let Some(err) = &store.history_error {
            return Err(err.clone());
        }
        Ok(store.history.get(task_id).cloned().unwrap_or_default())
    }

    async fn send_message(
        &self,
        task_id: &str,
        request: &SendMessageRequest,
    ) -> Result<TaskMessage, ApiError> {
        let mut store = self.store.lock().unwrap();
        if let Some(err) = store.send_error.take() {
            return Err(err);
        }
        store.sent.push((task_id.to_string(), request.clone()));

        let message = TaskMessage {
            id: format!("m-{}", store.sent.len()),
            sender_id: "me".to_string(),
            sender_name: "Me".to_string(),
            sender_avatar: None,
            content: request.content.clone(),
            timestamp: Utc::now(),
            is_from_current_user: true,
            client_message_id: Some(request.client_message_id),
        };
        store
            .history
            .entry(task_id.to_string())
            .or_default()
            .push(message.clone());
        Ok(message)
    }
}
