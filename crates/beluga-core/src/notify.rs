//! Notification callbacks fired on every timer transition.

use tokio::sync::broadcast;
use tracing::info;

use crate::broadcast::Update;
use crate::events::Event;

/// Receives every event a timer session produces, from commands and from
/// the ticker alike. Called outside the session lock; must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &Event);
}

/// Writes each event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &Event) {
        info!(target: "beluga::notification", "{}", event.message());
    }
}

/// Logs each event and forwards it to live-update subscribers.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: broadcast::Sender<Update>,
}

impl ChannelNotifier {
    pub fn new(tx: broadcast::Sender<Update>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, event: &Event) {
        LogNotifier.notify(event);
        // No subscribers is not an error.
        let _ = self.tx.send(Update::notification(event));
    }
}
