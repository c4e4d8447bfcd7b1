//! Process-local fan-out between views and the socket.

use od_protocol::realtime::{ClientFrame, ServerFrame};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

use super::{ListenerId, RealtimeChannel, RealtimeListener};

#[derive(Default)]
struct HubInner {
    /// Room name to number of outstanding joins.
    rooms: HashMap<String, usize>,
    listeners: HashMap<ListenerId, mpsc::UnboundedSender<ServerFrame>>,
    /// Writer half of the live socket, if any.
    outbound: Option<mpsc::UnboundedSender<ClientFrame>>,
    next_listener: u64,
}

impl HubInner {
    fn send(&mut self, frame: ClientFrame) {
        let Some(outbound) = &self.outbound else {
            tracing::trace!(?frame, "realtime offline, frame not sent");
            return;
        };
        if outbound.send(frame).is_err() {
            tracing::debug!("realtime writer closed");
            self.outbound = None;
        }
    }
}

/// Room bookkeeping and listener registry shared by all views.
///
/// The socket side attaches an outbound sender when connected and feeds
/// inbound frames through [`dispatch`](Self::dispatch).
#[derive(Default)]
pub struct RealtimeHub {
    inner: Mutex<HubInner>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Route client frames to `outbound` and re-announce every joined room.
    pub fn attach_outbound(&self, outbound: mpsc::UnboundedSender<ClientFrame>) {
        let mut inner = self.lock();
        inner.outbound = Some(outbound);

        let mut rooms: Vec<String> = inner.rooms.keys().cloned().collect();
        rooms.sort();
        for task_id in rooms {
            inner.send(ClientFrame::JoinTaskRoom { task_id });
        }
    }

    /// Forget the outbound sender. Room counts are kept for the next attach.
    pub fn detach_outbound(&self) {
        self.lock().outbound = None;
    }

    /// Deliver a server frame to every listener. Listeners whose receiver
    /// is gone are dropped from the registry.
    pub fn dispatch(&self, frame: &ServerFrame) {
        let mut inner = self.lock();
        inner
            .listeners
            .retain(|_, listener| listener.send(frame.clone()).is_ok());
    }

    /// Rooms with at least one outstanding join, sorted.
    pub fn joined_rooms(&self) -> Vec<String> {
        let mut rooms: Vec<String> = self.lock().rooms.keys().cloned().collect();
        rooms.sort();
        rooms
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }
}

impl RealtimeChannel for RealtimeHub {
    fn join_task_room(&self, task_id: &str) {
        let mut inner = self.lock();
        let count = inner.rooms.entry(task_id.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            tracing::debug!(task_id, "joining task room");
            inner.send(ClientFrame::JoinTaskRoom {
                task_id: task_id.to_string(),
            });
        }
    }

    fn leave_task_room(&self, task_id: &str) {
        let mut inner = self.lock();
        let Some(count) = inner.rooms.get_mut(task_id) else {
            tracing::warn!(task_id, "leave for a room that was never joined");
            return;
        };
        *count -= 1;
        if *count == 0 {
            inner.rooms.remove(task_id);
            tracing::debug!(task_id, "leaving task room");
            inner.send(ClientFrame::LeaveTaskRoom {
                task_id: task_id.to_string(),
            });
        }
    }

    fn send_task_typing_indicator(&self, task_id: &str, is_typing: bool) {
        self.lock().send(ClientFrame::TaskTyping {
            task_id: task_id.to_string(),
            is_typing,
        });
    }

    fn subscribe(&self) -> RealtimeListener {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        inner.next_listener += 1;
        let id = ListenerId(inner.next_listener);
        inner.listeners.insert(id, tx);
        RealtimeListener { id, rx }
    }

    fn remove_listener(&self, id: ListenerId) {
        self.lock().listeners.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use od_protocol::message_models::TypingUser;

    fn drain(rx: &mut mpsc::UnboundedReceiver<ClientFrame>) -> Vec<ClientFrame> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    fn join(task_id: &str) -> ClientFrame {
        ClientFrame::JoinTaskRoom {
            task_id: task_id.to_string(),
        }
    }

    fn leave(task_id: &str) -> ClientFrame {
        ClientFrame::LeaveTaskRoom {
            task_id: task_id.to_string(),
        }
    }

    #[test]
    fn test_rooms_are_reference_counted() {
        let hub = RealtimeHub::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.attach_outbound(tx);

        hub.join_task_room("T1");
        hub.join_task_room("T1");
        assert_eq!(drain(&mut rx), vec![join("T1")]);

        hub.leave_task_room("T1");
        assert!(drain(&mut rx).is_empty());
        assert_eq!(hub.joined_rooms(), vec!["T1".to_string()]);

        hub.leave_task_room("T1");
        assert_eq!(drain(&mut rx), vec![leave("T1")]);
        assert!(hub.joined_rooms().is_empty());
    }

    #[test]
    fn test_unbalanced_leave_is_ignored() {
        let hub = RealtimeHub::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.attach_outbound(tx);

        hub.leave_task_room("ghost");
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_attach_replays_joined_rooms() {
        let hub = RealtimeHub::new();
        hub.join_task_room("T2");
        hub.join_task_room("T1");
        hub.send_task_typing_indicator("T1", true);

        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.attach_outbound(tx);

        // Typing sent while offline is not replayed.
        assert_eq!(drain(&mut rx), vec![join("T1"), join("T2")]);
    }

    #[test]
    fn test_dispatch_reaches_every_listener_and_prunes_closed() {
        let hub = RealtimeHub::new();
        let mut first = hub.subscribe();
        let second = hub.subscribe();
        assert_ne!(first.id, second.id);
        drop(second.rx);

        hub.dispatch(&ServerFrame::TaskTyping {
            task_id: "T1".to_string(),
            user: TypingUser {
                name: "Dana".to_string(),
            },
            is_typing: true,
        });

        assert!(first.rx.try_recv().is_ok());
        assert_eq!(hub.listener_count(), 1);

        hub.remove_listener(first.id);
        assert_eq!(hub.listener_count(), 0);
    }
}
