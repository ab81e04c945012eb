//! Periodic status fan-out for live dashboards.
//!
//! The broadcaster reads [`TimerSession::snapshot`] on its own interval and
//! publishes the result on a `tokio::sync::broadcast` channel. Its cadence
//! is independent of the ticker, and it works with zero or many
//! subscribers.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::events::Event;
use crate::timer::{StatusSnapshot, TimerSession};

/// Slow subscribers lag and skip ahead rather than hold up the sender.
pub const UPDATE_CAPACITY: usize = 64;

/// Message delivered to live-update subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Update {
    TimerUpdate { snapshot: StatusSnapshot },
    Notification { message: String, event: Event },
}

impl Update {
    pub fn notification(event: &Event) -> Self {
        Update::Notification {
            message: event.message(),
            event: event.clone(),
        }
    }

    /// Event name used on the wire (SSE `event:` field).
    pub fn kind(&self) -> &'static str {
        match self {
            Update::TimerUpdate { .. } => "timer_update",
            Update::Notification { .. } => "notification",
        }
    }
}

/// Create the channel shared by the broadcaster and a [`ChannelNotifier`].
///
/// [`ChannelNotifier`]: crate::notify::ChannelNotifier
pub fn update_channel() -> broadcast::Sender<Update> {
    broadcast::channel(UPDATE_CAPACITY).0
}

pub struct StatusBroadcaster {
    tx: broadcast::Sender<Update>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl StatusBroadcaster {
    /// Start publishing snapshots of `session` every `period`.
    pub fn spawn(
        session: Arc<TimerSession>,
        tx: broadcast::Sender<Update>,
        period: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(publish_loop(
            session,
            tx.clone(),
            period,
            cancel.clone(),
        ));
        Self { tx, cancel, handle }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Update> {
        self.tx.subscribe()
    }

    /// Stop publishing and wait for the task to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

async fn publish_loop(
    session: Arc<TimerSession>,
    tx: broadcast::Sender<Update>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let snapshot = session.snapshot().await;
                let _ = tx.send(Update::TimerUpdate { snapshot });
            }
        }
    }
    debug!("status broadcaster exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::LogNotifier;
    use crate::timer::{DeepFocusRoll, Phase, TimerSettings};

    fn session() -> Arc<TimerSession> {
        Arc::new(TimerSession::new(
            TimerSettings::default(),
            DeepFocusRoll::seeded(1),
            Arc::new(LogNotifier),
        )
        .unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_to_every_subscriber() {
        let session = session();
        let broadcaster =
            StatusBroadcaster::spawn(session.clone(), update_channel(), Duration::from_secs(1));
        let mut first = broadcaster.subscribe();
        let mut second = broadcaster.subscribe();

        session.start_focus(Some("deck".into())).await;
        time::sleep(Duration::from_millis(1500)).await;

        for rx in [&mut first, &mut second] {
            let mut last = None;
            while let Ok(update) = rx.try_recv() {
                last = Some(update);
            }
            match last {
                Some(Update::TimerUpdate { snapshot }) => {
                    assert_eq!(snapshot.phase, Phase::Focus);
                    assert_eq!(snapshot.current_task.as_deref(), Some("deck"));
                }
                other => panic!("expected timer update, got {other:?}"),
            }
        }

        broadcaster.shutdown().await;
        session.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn runs_without_subscribers() {
        let session = session();
        let broadcaster =
            StatusBroadcaster::spawn(session.clone(), update_channel(), Duration::from_secs(1));
        time::sleep(Duration::from_secs(5)).await;

        let mut late = broadcaster.subscribe();
        time::sleep(Duration::from_secs(1)).await;
        assert!(matches!(late.try_recv(), Ok(Update::TimerUpdate { .. })));
        broadcaster.shutdown().await;
    }

    #[test]
    fn update_kinds_and_wire_format() {
        let update = Update::notification(&Event::TimerStopped {
            at: chrono::Utc::now(),
        });
        assert_eq!(update.kind(), "notification");
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["kind"], "notification");
        assert_eq!(json["message"], "Timer stopped");
    }
}
