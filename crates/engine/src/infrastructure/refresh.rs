//! Broadcast-based client refresh notifier.

use tokio::sync::broadcast;

use crate::infrastructure::ports::RefreshPort;

const CHANNEL_CAPACITY: usize = 256;

/// A client-state refresh request raised by a dispatched callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshEvent {
    /// Id given when the callback was offered, if any.
    pub callback_id: Option<String>,
}

/// Fans refresh requests out to whatever renders client state.
pub struct RefreshNotifier {
    tx: broadcast::Sender<RefreshEvent>,
}

impl RefreshNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.tx.subscribe()
    }
}

impl Default for RefreshNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshPort for RefreshNotifier {
    fn mark_dirty(&self, callback_id: Option<String>) {
        let event = RefreshEvent { callback_id };
        match self.tx.send(event) {
            Ok(receivers) => tracing::debug!(receivers, "Broadcast client refresh"),
            // No renderer attached; nothing to refresh
            Err(_) => tracing::trace!("Client refresh requested without subscribers"),
        }
    }
}
