//! Event and state helpers.

use od_protocol::ipc::Event;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Upper bound for any wait in a test. Time is paused in most suites, so
/// this only trips when the awaited state never comes.
#[allow(dead_code)]
pub const WAIT_LIMIT: Duration = Duration::from_secs(60);

/// Drain every event currently queued.
#[allow(dead_code)]
pub fn drain_events(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Wait until `predicate` holds for the watched value and return a copy.
#[allow(dead_code)]
pub async fn wait_for_state<T, F>(rx: &mut watch::Receiver<T>, predicate: F) -> T
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    tokio::time::timeout(WAIT_LIMIT, rx.wait_for(predicate))
        .await
        .expect("state was never reached")
        .expect("state sender dropped")
        .clone()
}

/// Number of `PipelineCompleted` events in `events`.
#[allow(dead_code)]
pub fn count_completed(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::PipelineCompleted { .. }))
        .count()
}
