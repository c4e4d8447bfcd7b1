//! Configuration models for `.opsdesk/config.toml`.
//!
//! This module defines the structure of the configuration file that
//! tells the client where the API and real-time endpoints live and how
//! the pipeline view and task chat behave.

use serde::Deserialize;
use serde::Serialize;
use ts_rs::TS;

use crate::pipeline_models::SyncType;

/// Represents all settings from `.opsdesk/config.toml`.
///
/// Every section is optional; missing values fall back to defaults.
///
/// # Example
///
/// ```toml
/// # .opsdesk/config.toml
/// [api]
/// base-url = "https://ops.example.com/api"
/// request-timeout-ms = 10000
///
/// [realtime]
/// url = "wss://ops.example.com/realtime"
///
/// [pipeline]
/// poll-interval-ms = 2000
/// auto-start = true
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClientConfig {
    pub api: ApiSettings,
    pub realtime: RealtimeSettings,
    pub pipeline: PipelineSettings,
    pub chat: ChatSettings,
}

/// REST API endpoint settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(default, rename_all = "kebab-case")]
pub struct ApiSettings {
    /// Base URL that endpoint paths are appended to.
    pub base_url: String,

    /// Bearer token sent with every request.
    ///
    /// Usually supplied through `OPSDESK_AUTH_TOKEN` rather than the file.
    pub auth_token: Option<String>,

    pub request_timeout_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api".to_string(),
            auth_token: None,
            request_timeout_ms: 10_000,
        }
    }
}

/// Real-time (push) connection settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(default, rename_all = "kebab-case")]
pub struct RealtimeSettings {
    /// WebSocket URL of the real-time endpoint.
    pub url: String,

    /// Delay before reconnecting after the connection drops.
    pub reconnect_delay_ms: u64,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080/realtime".to_string(),
            reconnect_delay_ms: 3_000,
        }
    }
}

/// Pipeline view behaviour.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(default, rename_all = "kebab-case")]
pub struct PipelineSettings {
    /// Delay between status fetches while the pipeline is pending or running.
    pub poll_interval_ms: u64,

    /// Start a pipeline automatically when the view finds none.
    pub auto_start: bool,

    pub default_sync_type: SyncType,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2_000,
            auto_start: false,
            default_sync_type: SyncType::Initial,
        }
    }
}

/// Task chat behaviour.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(default, rename_all = "kebab-case")]
pub struct ChatSettings {
    /// How long a typing indicator stays up without a follow-up event.
    pub typing_timeout_ms: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            typing_timeout_ms: 3_000,
        }
    }
}
