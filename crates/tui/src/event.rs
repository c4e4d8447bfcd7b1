//! Key routing result shared by the widgets.

/// Whether a widget handled a key or left it for the next handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Consumed,
    NotConsumed,
}

impl EventStatus {
    pub fn is_consumed(self) -> bool {
        self == Self::Consumed
    }
}
