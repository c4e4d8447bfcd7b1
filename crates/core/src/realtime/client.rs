//! WebSocket transport for the real-time hub.

use futures_util::{SinkExt, StreamExt};
use od_protocol::config_models::RealtimeSettings;
use od_protocol::realtime::{ClientFrame, ServerFrame};
use reqwest::Url;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use super::hub::RealtimeHub;
use super::{ConnectionStatus, ListenerId, RealtimeChannel, RealtimeListener};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RealtimeError {
    #[error("Invalid real-time URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// The process-wide real-time connection.
///
/// Constructed once and handed to every view that needs it. Room joins made
/// before [`connect`](Self::connect) are remembered and announced as soon as
/// the socket opens, and again after every reconnect.
pub struct RealtimeClient {
    hub: Arc<RealtimeHub>,
    url: Url,
    reconnect_delay: Duration,
    status: Arc<watch::Sender<ConnectionStatus>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl RealtimeClient {
    pub fn new(
        settings: &RealtimeSettings,
        auth_token: Option<&str>,
    ) -> Result<Self, RealtimeError> {
        let url = connection_url(&settings.url, auth_token)?;
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);

        Ok(Self {
            hub: Arc::new(RealtimeHub::new()),
            url,
            reconnect_delay: Duration::from_millis(settings.reconnect_delay_ms),
            status: Arc::new(status),
            pump: Mutex::new(None),
        })
    }

    /// Start the connection pump. Calling it while already running is a no-op.
    pub fn connect(&self) {
        let mut pump = self.pump.lock().unwrap_or_else(PoisonError::into_inner);
        if pump.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let url = self.url.clone();
        let hub = Arc::clone(&self.hub);
        let status = Arc::clone(&self.status);
        let delay = self.reconnect_delay;
        *pump = Some(tokio::spawn(run_pump(url, hub, status, delay)));
    }

    /// Stop the pump and close the socket. Room counts survive so a later
    /// [`connect`](Self::connect) rejoins them.
    pub fn disconnect(&self) {
        let handle = self
            .pump
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
        self.hub.detach_outbound();
        self.status.send_replace(ConnectionStatus::Disconnected);
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    pub fn hub(&self) -> &Arc<RealtimeHub> {
        &self.hub
    }
}

impl Drop for RealtimeClient {
    fn drop(&mut self) {
        if let Some(handle) = self
            .pump
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

impl RealtimeChannel for RealtimeClient {
    fn join_task_room(&self, task_id: &str) {
        self.hub.join_task_room(task_id);
    }

    fn leave_task_room(&self, task_id: &str) {
        self.hub.leave_task_room(task_id);
    }

    fn send_task_typing_indicator(&self, task_id: &str, is_typing: bool) {
        self.hub.send_task_typing_indicator(task_id, is_typing);
    }

    fn subscribe(&self) -> RealtimeListener {
        self.hub.subscribe()
    }

    fn remove_listener(&self, id: ListenerId) {
        self.hub.remove_listener(id);
    }
}

/// Socket URL with the auth token, if any, in the `token` query parameter.
pub fn connection_url(raw: &str, auth_token: Option<&str>) -> Result<Url, RealtimeError> {
    let invalid = |reason: String| RealtimeError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if let Some(token) = auth_token.filter(|token| !token.is_empty()) {
        url.query_pairs_mut().append_pair("token", token);
    }
    Ok(url)
}

async fn run_pump(
    url: Url,
    hub: Arc<RealtimeHub>,
    status: Arc<watch::Sender<ConnectionStatus>>,
    reconnect_delay: Duration,
) {
    loop {
        status.send_replace(ConnectionStatus::Connecting);
        match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((socket, _)) => {
                tracing::info!(host = url.host_str().unwrap_or_default(), "realtime connected");
                status.send_replace(ConnectionStatus::Connected);

                let (mut sink, mut stream) = socket.split();
                let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ClientFrame>();
                hub.attach_outbound(outbound_tx);

                loop {
                    tokio::select! {
                        Some(frame) = outbound_rx.recv() => {
                            let text = match serde_json::to_string(&frame) {
                                Ok(text) => text,
                                Err(err) => {
                                    tracing::warn!(%err, "failed to encode realtime frame");
                                    continue;
                                }
                            };
                            if let Err(err) = sink.send(Message::Text(text)).await {
                                tracing::warn!(%err, "realtime write failed");
                                break;
                            }
                        }
                        message = stream.next() => match message {
                            Some(Ok(Message::Text(text))) => {
                                match serde_json::from_str::<ServerFrame>(&text) {
                                    Ok(frame) => hub.dispatch(&frame),
                                    Err(err) => tracing::debug!(%err, "ignoring realtime frame"),
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Ok(_)) => {}
                            Some(Err(err)) => {
                                tracing::warn!(%err, "realtime stream error");
                                break;
                            }
                        }
                    }
                }

                hub.detach_outbound();
            }
            Err(err) => {
                tracing::warn!(%err, "realtime connect failed");
            }
        }

        status.send_replace(ConnectionStatus::Disconnected);
        tokio::time::sleep(reconnect_delay).await;
    }
}
