//! De-duplicating message list operations.
//!
//! A message can arrive twice: once as the response to our own send and
//! once pushed through the task room, in either order. Lists keep the
//! arrival order of the first copy seen.

use od_protocol::message_models::TaskMessage;

/// Append `message` unless the list already holds it.
///
/// Returns `true` if the list changed.
pub fn append_unique(messages: &mut Vec<TaskMessage>, message: TaskMessage) -> bool {
    if messages.iter().any(|known| known.is_same_message(&message)) {
        return false;
    }
    messages.push(message);
    true
}

/// Put loaded `history` in front of messages that arrived while it was
/// loading, dropping duplicates.
pub fn merge_history(history: Vec<TaskMessage>, arrived: Vec<TaskMessage>) -> Vec<TaskMessage> {
    let mut merged = Vec::with_capacity(history.len() + arrived.len());
    for message in history.into_iter().chain(arrived) {
        append_unique(&mut merged, message);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn message(id: &str, content: &str) -> TaskMessage {
        TaskMessage {
            id: id.to_string(),
            sender_id: "u1".to_string(),
            sender_name: "Ana".to_string(),
            sender_avatar: None,
            content: content.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            is_from_current_user: false,
            client_message_id: None,
        }
    }

    #[test]
    fn test_append_unique_skips_known_id() {
        let mut messages = vec![message("m1", "hi")];

        assert!(!append_unique(&mut messages, message("m1", "hi again")));
        assert!(append_unique(&mut messages, message("m2", "there")));

        let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2"]);
        assert_eq!(messages[0].content, "hi");
    }

    #[test]
    fn test_append_unique_matches_client_message_id() {
        let key = Uuid::new_v4();
        let mut sent = message("m1", "hello");
        sent.client_message_id = Some(key);
        let mut pushed = message("srv-77", "hello");
        pushed.client_message_id = Some(key);

        let mut messages = vec![sent];
        assert!(!append_unique(&mut messages, pushed));
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_merge_history_keeps_history_first() {
        let history = vec![message("m1", "a"), message("m2", "b")];
        let arrived = vec![message("m3", "c"), message("m2", "b")];

        let merged = merge_history(history, arrived);

        let ids: Vec<&str> = merged.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2", "m3"]);
    }

    #[test]
    fn test_order_is_arrival_not_timestamp() {
        let mut late = message("m1", "late");
        late.timestamp = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let early = message("m2", "early");

        let mut messages = Vec::new();
        append_unique(&mut messages, late);
        append_unique(&mut messages, early);

        assert_eq!(messages[0].id, "m1");
    }
}
