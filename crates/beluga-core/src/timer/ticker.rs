//! Background countdown task.
//!
//! One ticker runs per session. It sleeps on a watch channel while the
//! session is idle or paused and on a tokio interval while it is counting
//! down. Every tick takes the engine lock, so commands and ticks never
//! interleave mid-transition.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::TimerEngine;
use crate::notify::Notifier;

/// Whether the ticker should be counting. Mirrors the engine's
/// `running`/`paused` flags and is only updated under the engine lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Gate {
    pub running: bool,
    pub paused: bool,
    /// Changes whenever the engine enters a new phase.
    pub epoch: u64,
}

impl Gate {
    pub fn of(engine: &TimerEngine) -> Self {
        Self {
            running: engine.is_running(),
            paused: engine.is_paused(),
            epoch: engine.phase_epoch(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.running && !self.paused
    }
}

/// Publish the engine's current gate. Call with the engine lock held.
pub(crate) fn sync_gate(gate: &watch::Sender<Gate>, engine: &TimerEngine) {
    let next = Gate::of(engine);
    gate.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}

pub(crate) struct Ticker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Ticker {
    pub fn spawn(
        engine: Arc<Mutex<TimerEngine>>,
        gate: Arc<watch::Sender<Gate>>,
        notifier: Arc<dyn Notifier>,
        period: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(engine, gate, notifier, period, cancel.clone()));
        Self { cancel, handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the task and wait until it has exited.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.handle).await {
            if e.is_panic() {
                tracing::error!("ticker task panicked: {e}");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn wait_until_open(rx: &mut watch::Receiver<Gate>) -> bool {
    rx.wait_for(Gate::is_open).await.is_ok()
}

async fn run(
    engine: Arc<Mutex<TimerEngine>>,
    gate: Arc<watch::Sender<Gate>>,
    notifier: Arc<dyn Notifier>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut gate_rx = gate.subscribe();
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    'outer: loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            open = wait_until_open(&mut gate_rx) => if !open { break },
        }
        // A full period passes before the first decrement after (re)starting.
        interval.reset();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break 'outer,
                changed = gate_rx.changed() => {
                    if changed.is_err() {
                        break 'outer;
                    }
                    let open = gate_rx.borrow_and_update().is_open();
                    if !open {
                        continue 'outer;
                    }
                    // A command started a new phase; its first second starts now.
                    interval.reset();
                }
                _ = interval.tick() => {
                    let (event, open) = {
                        let mut engine = engine.lock().await;
                        if cancel.is_cancelled() {
                            break 'outer;
                        }
                        let event = engine.tick();
                        sync_gate(&gate, &engine);
                        // Expiry transitions stay on the current cadence.
                        let _ = gate_rx.borrow_and_update();
                        (event, Gate::of(&engine).is_open())
                    };
                    if let Some(event) = event {
                        debug!(?event, "ticker transition");
                        notifier.notify(&event);
                    }
                    if !open {
                        continue 'outer;
                    }
                }
            }
        }
    }
    debug!("ticker exited");
}
