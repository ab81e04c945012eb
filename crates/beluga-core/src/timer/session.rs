//! A timer engine shared between command handlers and its ticker task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use super::ticker::{sync_gate, Gate, Ticker};
use super::{DeepFocusRoll, StatusSnapshot, TimerEngine, TimerSettings};
use crate::error::{ConfigError, TransitionError};
use crate::events::Event;
use crate::notify::Notifier;
use crate::stats::SessionStatistics;
use crate::storage::TimerConfig;

/// One focus timer: the engine, its lock, and at most one ticker task.
///
/// All operations take `&self`; share the session behind an `Arc`.
pub struct TimerSession {
    id: Uuid,
    settings: TimerSettings,
    engine: Arc<Mutex<TimerEngine>>,
    gate: Arc<watch::Sender<Gate>>,
    /// Held for the whole of `start_*` and `stop` so they never interleave.
    ticker: Mutex<Option<Ticker>>,
    notifier: Arc<dyn Notifier>,
    tick_interval: Duration,
}

impl TimerSession {
    /// Create an idle session.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `settings` fail validation.
    pub fn new(
        settings: TimerSettings,
        roll: DeepFocusRoll,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        let engine = TimerEngine::new(settings.clone(), roll)?;
        let (gate, _) = watch::channel(Gate::of(&engine));
        Ok(Self {
            id: Uuid::new_v4(),
            settings,
            engine: Arc::new(Mutex::new(engine)),
            gate: Arc::new(gate),
            ticker: Mutex::new(None),
            notifier,
            tick_interval: Duration::from_secs(1),
        })
    }

    /// Build a session from the `[timer]` config section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if any duration is zero.
    pub fn from_config(
        config: &TimerConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        Self::new(
            config.settings()?,
            DeepFocusRoll::from_seed(config.seed),
            notifier,
        )
    }

    /// Change the countdown step. Takes effect for tickers started later.
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub async fn snapshot(&self) -> StatusSnapshot {
        self.engine.lock().await.snapshot()
    }

    pub async fn statistics(&self) -> SessionStatistics {
        self.engine.lock().await.statistics().clone()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub async fn start_focus(&self, task: Option<String>) -> Event {
        self.start_with(|engine| engine.start_focus(task)).await
    }

    pub async fn start_auto_run(&self, task: Option<String>) -> Event {
        self.start_with(|engine| engine.start_auto_run(task)).await
    }

    pub async fn pause(&self) -> Result<Event, TransitionError> {
        self.transition(TimerEngine::pause).await
    }

    pub async fn resume(&self) -> Result<Event, TransitionError> {
        self.transition(TimerEngine::resume).await
    }

    pub async fn complete_cycle(&self) -> Result<Event, TransitionError> {
        self.transition(TimerEngine::complete_cycle).await
    }

    pub async fn take_micro_break(&self) -> Result<Event, TransitionError> {
        self.transition(TimerEngine::take_micro_break).await
    }

    /// Halt the ticker, wait for it to exit, and return to Idle.
    ///
    /// No decrement can happen once this returns. Safe to call when idle.
    pub async fn stop(&self) -> Event {
        let mut slot = self.ticker.lock().await;
        if let Some(ticker) = slot.take() {
            ticker.shutdown().await;
        }

        let event = {
            let mut engine = self.engine.lock().await;
            let event = engine.stop();
            sync_gate(&self.gate, &engine);
            event
        };
        drop(slot);

        info!(session = %self.id, "session stopped");
        self.notifier.notify(&event);
        event
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn start_with(&self, start: impl FnOnce(&mut TimerEngine) -> Event) -> Event {
        let mut slot = self.ticker.lock().await;

        let event = {
            let mut engine = self.engine.lock().await;
            let event = start(&mut *engine);
            sync_gate(&self.gate, &engine);
            event
        };

        let alive = slot.as_ref().is_some_and(|ticker| !ticker.is_finished());
        if !alive {
            *slot = Some(Ticker::spawn(
                self.engine.clone(),
                self.gate.clone(),
                self.notifier.clone(),
                self.tick_interval,
            ));
            info!(session = %self.id, "ticker started");
        }
        drop(slot);

        self.notifier.notify(&event);
        event
    }

    async fn transition(
        &self,
        op: impl FnOnce(&mut TimerEngine) -> Result<Event, TransitionError>,
    ) -> Result<Event, TransitionError> {
        let result = {
            let mut engine = self.engine.lock().await;
            let result = op(&mut *engine);
            sync_gate(&self.gate, &engine);
            result
        };

        match &result {
            Ok(event) => self.notifier.notify(event),
            Err(e) => warn!(session = %self.id, "rejected: {e}"),
        }
        result
    }
}
