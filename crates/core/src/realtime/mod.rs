//! Shared real-time connection.
//!
//! One [`RealtimeClient`] per process carries every room subscription. Views
//! never talk to the socket directly: they go through the
//! [`RealtimeChannel`] seam, which the [`RealtimeHub`] implements with
//! reference-counted rooms and per-listener fan-out.

pub mod client;
pub mod hub;

use od_protocol::realtime::ServerFrame;
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;

pub use client::RealtimeClient;
pub use hub::RealtimeHub;

/// Handle identifying one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// A registered listener and the frames delivered to it.
///
/// Every listener receives every server frame; filtering by task id is the
/// listener's job.
#[derive(Debug)]
pub struct RealtimeListener {
    pub id: ListenerId,
    pub rx: mpsc::UnboundedReceiver<ServerFrame>,
}

/// State of the underlying socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Room membership and listener registration on a real-time connection.
///
/// Calls never block on the network. Frames sent while the socket is down
/// are either replayed on reconnect (room joins) or dropped (typing).
pub trait RealtimeChannel: Send + Sync {
    /// Join the room for `task_id`. Must be balanced by one
    /// [`leave_task_room`](Self::leave_task_room).
    fn join_task_room(&self, task_id: &str);

    /// Leave the room for `task_id`.
    fn leave_task_room(&self, task_id: &str);

    /// Tell the other participants whether the local user is typing.
    fn send_task_typing_indicator(&self, task_id: &str, is_typing: bool);

    /// Register a listener for server frames.
    fn subscribe(&self) -> RealtimeListener;

    /// Unregister a listener. Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId);
}
