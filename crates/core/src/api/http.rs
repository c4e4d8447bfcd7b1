//! HTTP implementation of the REST clients.
//!
//! Endpoints, relative to the configured base URL:
//!
//! | operation            | request                                              |
//! |----------------------|------------------------------------------------------|
//! | pipeline status      | `GET  channels/{channelId}/sync-pipeline?syncType=…` |
//! | start pipeline       | `POST channels/{channelId}/sync-pipeline`            |
//! | retry/pause/resume   | `POST sync-pipelines/{pipelineId}/{action}`          |
//! | message history      | `GET  tasks/{taskId}/messages`                       |
//! | send message         | `POST tasks/{taskId}/messages`                       |
//!
//! Response bodies may be bare JSON or wrapped as `{"data": …}`.

use async_trait::async_trait;
use od_protocol::config_models::ApiSettings;
use od_protocol::message_models::{SendMessageRequest, TaskMessage};
use od_protocol::pipeline_models::{PipelineStatus, StartPipelineRequest, SyncType};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use super::error::ApiError;
use super::{PipelineApi, TaskMessageApi};

/// Longest server error body carried into an [`ApiError::Http`].
const MAX_ERROR_BODY: usize = 200;

/// REST client for the pipeline and task message endpoints.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpApiClient {
    /// Build a client from the `[api]` settings.
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(&settings.base_url).map_err(|err| {
            ApiError::InvalidRequest(format!("invalid base URL {}: {err}", settings.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidRequest(format!(
                "base URL {base_url} cannot take a path"
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url,
            auth_token: settings.auth_token.clone(),
        })
    }

    /// Absolute URL for a path below the base URL. Segments are
    /// percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ApiError::InvalidRequest(format!("base URL {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        tracing::debug!(url = %response.url(), status = status.as_u16(), "api response");

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }
        Ok(response)
    }

    async fn post_pipeline_action(&self, pipeline_id: &str, action: &str) -> Result<(), ApiError> {
        if pipeline_id.trim().is_empty() {
            return Err(ApiError::InvalidRequest("pipelineId is required".to_string()));
        }
        let url = self.endpoint(&["sync-pipelines", pipeline_id, action])?;
        self.send(self.request(Method::POST, url)).await?;
        Ok(())
    }
}

#[async_trait]
impl PipelineApi for HttpApiClient {
    async fn get_pipeline_status(
        &self,
        channel_id: &str,
        sync_type: SyncType,
    ) -> Result<Option<PipelineStatus>, ApiError> {
        let url = self.endpoint(&["channels", channel_id, "sync-pipeline"])?;
        let builder = self
            .request(Method::GET, url)
            .query(&[("syncType", sync_type.as_str())]);

        match self.send(builder).await {
            Ok(response) => decode_optional(&response.text().await?),
            Err(ApiError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn start_pipeline(
        &self,
        request: &StartPipelineRequest,
    ) -> Result<Option<PipelineStatus>, ApiError> {
        request.validate().map_err(ApiError::InvalidRequest)?;
        let body = request.normalized();
        let url = self.endpoint(&["channels", &body.channel_id, "sync-pipeline"])?;

        let response = self.send(self.request(Method::POST, url).json(&body)).await?;
        let text = response.text().await?;
        // Some deployments answer with an acknowledgement instead of a status.
        Ok(decode_optional(&text).unwrap_or(None))
    }

    async fn retry_pipeline(&self, pipeline_id: &str) -> Result<(), ApiError> {
        self.post_pipeline_action(pipeline_id, "retry").await
    }

    async fn pause_pipeline(&self, pipeline_id: &str) -> Result<(), ApiError> {
        self.post_pipeline_action(pipeline_id, "pause").await
    }

    async fn resume_pipeline(&self, pipeline_id: &str) -> Result<(), ApiError> {
        self.post_pipeline_action(pipeline_id, "resume").await
    }
}

#[async_trait]
impl TaskMessageApi for HttpApiClient {
    async fn fetch_messages(&self, task_id: &str) -> Result<Vec<TaskMessage>, ApiError> {
        let url = self.endpoint(&["tasks", task_id, "messages"])?;
        let response = self.send(self.request(Method::GET, url)).await?;
        Ok(decode_optional(&response.text().await?)?.unwrap_or_default())
    }

    async fn send_message(
        &self,
        task_id: &str,
        request: &SendMessageRequest,
    ) -> Result<TaskMessage, ApiError> {
        let url = self.endpoint(&["tasks", task_id, "messages"])?;
        let response = self
            .send(self.request(Method::POST, url).json(request))
            .await?;
        decode_optional(&response.text().await?)?
            .ok_or_else(|| ApiError::Decode("empty response to send message".to_string()))
    }
}

/// Decode a response body that may be empty, bare, or wrapped in `data`.
pub(crate) fn decode_optional<T: DeserializeOwned>(body: &str) -> Result<Option<T>, ApiError> {
    if body.trim().is_empty() {
        return Ok(None);
    }

    let value: Value =
        serde_json::from_str(body).map_err(|err| ApiError::Decode(err.to_string()))?;
    let payload = match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };

    if payload.is_null() {
        return Ok(None);
    }
    serde_json::from_value(payload)
        .map(Some)
        .map_err(|err| ApiError::Decode(err.to_string()))
}

/// Pull a readable message out of an error response body.
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["message", "error"]
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
    });
    if let Some(message) = from_json {
        return message;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }
    trimmed.chars().take(MAX_ERROR_BODY).collect()
}
