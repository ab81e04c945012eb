//! Phase state machine for the Beluga technique.
//!
//! The engine has no threads and no clock of its own. [`TimerEngine::tick`]
//! advances the countdown by one second; the session's ticker task calls it
//! once per interval. Every other operation is a synchronous transition.
//!
//! ## Phase Transitions
//!
//! ```text
//! Idle ──start──> Focus | DeepFocus ──complete/expiry──> ShortBreak | LongBreak
//!                     │    ^                                   │
//!                   micro  expiry                    expiry (manual) ──> Idle
//!                     v    │                         expiry (auto-run) ──> next Focus
//!                  MicroBreak
//! ```
//!
//! `stop` returns to Idle from anywhere.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::deep_focus::DeepFocusRoll;
use super::snapshot::StatusSnapshot;
use super::Phase;
use crate::error::{ConfigError, TransitionError};
use crate::events::Event;
use crate::stats::SessionStatistics;

/// Number of focus/break pairs in one auto-run.
pub const AUTO_RUN_CYCLES: u32 = 3;

/// Phase lengths in seconds plus the cycle rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSettings {
    pub focus_secs: u64,
    pub short_break_secs: u64,
    pub long_break_secs: u64,
    pub micro_break_secs: u64,
    pub deep_focus_secs: u64,
    pub cycles_before_long_break: u32,
    pub deep_focus_probability: f64,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_secs: 30 * 60,
            short_break_secs: 7 * 60,
            long_break_secs: 20 * 60,
            micro_break_secs: 2 * 60,
            deep_focus_secs: 45 * 60,
            cycles_before_long_break: 3,
            deep_focus_probability: 0.4,
        }
    }
}

impl TimerSettings {
    /// Every phase must last at least one second and the cycle rules must
    /// be usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("focus_secs", self.focus_secs),
            ("short_break_secs", self.short_break_secs),
            ("long_break_secs", self.long_break_secs),
            ("micro_break_secs", self.micro_break_secs),
            ("deep_focus_secs", self.deep_focus_secs),
        ];
        for (key, secs) in durations {
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "duration must be positive".to_string(),
                });
            }
        }
        if self.cycles_before_long_break == 0 {
            return Err(ConfigError::InvalidValue {
                key: "cycles_before_long_break".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.deep_focus_probability) {
            return Err(ConfigError::InvalidValue {
                key: "deep_focus_probability".to_string(),
                message: format!("{} is not between 0 and 1", self.deep_focus_probability),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// One phase per command; a break that runs out returns to Idle.
    Manual,
    /// Three unattended cycles; `cycle` is 1-based.
    AutoRun { cycle: u32 },
}

/// Focus phase parked while a micro-break runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SuspendedFocus {
    phase: Phase,
    remaining_secs: u64,
    total_secs: u64,
}

/// Core timer state machine.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    settings: TimerSettings,
    phase: Phase,
    remaining_secs: u64,
    /// Full length of the current phase, for elapsed-time accounting.
    phase_total_secs: u64,
    running: bool,
    paused: bool,
    current_task: Option<String>,
    completed_cycles: u32,
    consecutive_focus_sessions: u32,
    mode: RunMode,
    suspended: Option<SuspendedFocus>,
    phase_epoch: u64,
    stats: SessionStatistics,
    roll: DeepFocusRoll,
}

impl TimerEngine {
    /// Create an idle engine.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `settings` fail
    /// [`TimerSettings::validate`].
    pub fn new(settings: TimerSettings, roll: DeepFocusRoll) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            settings,
            phase: Phase::Idle,
            remaining_secs: 0,
            phase_total_secs: 0,
            running: false,
            paused: false,
            current_task: None,
            completed_cycles: 0,
            consecutive_focus_sessions: 0,
            mode: RunMode::Manual,
            suspended: None,
            phase_epoch: 0,
            stats: SessionStatistics::default(),
            roll,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn current_task(&self) -> Option<&str> {
        self.current_task.as_deref()
    }

    pub fn completed_cycles(&self) -> u32 {
        self.completed_cycles
    }

    pub fn consecutive_focus_sessions(&self) -> u32 {
        self.consecutive_focus_sessions
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Incremented every time a phase begins, including a restart of the
    /// same phase and a return to Idle.
    pub fn phase_epoch(&self) -> u64 {
        self.phase_epoch
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn statistics(&self) -> &SessionStatistics {
        &self.stats
    }

    /// True while the countdown should advance.
    pub fn is_ticking(&self) -> bool {
        self.running && !self.paused
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            phase: self.phase,
            remaining_seconds: self.remaining_secs,
            phase_total_seconds: self.phase_total_secs,
            current_task: self.current_task.clone(),
            running: self.running,
            paused: self.paused,
            can_resume: self.paused,
            completed_cycles: self.completed_cycles,
            auto_run_cycle: match self.mode {
                RunMode::AutoRun { cycle } => Some(cycle),
                RunMode::Manual => None,
            },
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a single focus phase. Valid from any state.
    pub fn start_focus(&mut self, task: Option<String>) -> Event {
        self.mode = RunMode::Manual;
        self.current_task = normalize_task(task);
        self.begin_focus()
    }

    /// Begin the first focus phase of a three-cycle auto-run.
    pub fn start_auto_run(&mut self, task: Option<String>) -> Event {
        self.mode = RunMode::AutoRun { cycle: 1 };
        self.current_task = normalize_task(task);
        self.begin_focus()
    }

    pub fn pause(&mut self) -> Result<Event, TransitionError> {
        if !self.running || self.paused {
            return Err(TransitionError::NothingToPause);
        }
        self.paused = true;
        info!(phase = %self.phase, remaining = self.remaining_secs, "timer paused");
        Ok(Event::TimerPaused {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Result<Event, TransitionError> {
        if !self.paused {
            return Err(TransitionError::NotPaused);
        }
        self.paused = false;
        info!(phase = %self.phase, remaining = self.remaining_secs, "timer resumed");
        Ok(Event::TimerResumed {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Return to Idle. Counters and statistics are kept.
    pub fn stop(&mut self) -> Event {
        self.go_idle();
        info!("timer stopped");
        Event::TimerStopped { at: Utc::now() }
    }

    /// Commit the current focus phase and move to its break.
    pub fn complete_cycle(&mut self) -> Result<Event, TransitionError> {
        if !self.phase.is_focus() {
            return Err(TransitionError::NotInFocus { phase: self.phase });
        }
        Ok(self.finish_focus(false))
    }

    /// Interrupt a running focus phase with a short micro-break.
    pub fn take_micro_break(&mut self) -> Result<Event, TransitionError> {
        if !self.phase.is_focus() || self.paused {
            return Err(TransitionError::MicroBreakUnavailable);
        }
        self.suspended = Some(SuspendedFocus {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            total_secs: self.phase_total_secs,
        });
        self.stats.record_micro_break();
        let duration = self.settings.micro_break_secs;
        self.enter(Phase::MicroBreak, duration);
        info!(duration, "micro-break started");
        Ok(Event::MicroBreakStarted {
            duration_secs: duration,
            at: Utc::now(),
        })
    }

    /// Advance the countdown by one second.
    ///
    /// Returns the transition event when the current phase runs out.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.is_ticking() {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return None;
        }
        debug!(phase = %self.phase, "phase expired");
        Some(self.expire())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin_focus(&mut self) -> Event {
        let deep = self.roll.roll(
            self.consecutive_focus_sessions,
            self.settings.deep_focus_probability,
        );
        let (phase, duration) = if deep {
            (Phase::DeepFocus, self.settings.deep_focus_secs)
        } else {
            (Phase::Focus, self.settings.focus_secs)
        };

        self.suspended = None;
        self.running = true;
        self.enter(phase, duration);

        let auto_run_cycle = match self.mode {
            RunMode::AutoRun { cycle } => Some(cycle),
            RunMode::Manual => None,
        };
        info!(%phase, duration, ?auto_run_cycle, task = ?self.current_task, "focus started");
        Event::PhaseStarted {
            phase,
            duration_secs: duration,
            task: self.current_task.clone(),
            auto_run_cycle,
            at: Utc::now(),
        }
    }

    fn finish_focus(&mut self, expired: bool) -> Event {
        let focus_phase = self.phase;
        let elapsed = self.phase_total_secs.saturating_sub(self.remaining_secs);
        self.stats.record_focus(focus_phase, elapsed);
        self.completed_cycles = self.completed_cycles.saturating_add(1);
        self.consecutive_focus_sessions = self.consecutive_focus_sessions.saturating_add(1);

        let long = match self.mode {
            RunMode::AutoRun { cycle } => cycle >= AUTO_RUN_CYCLES,
            RunMode::Manual => {
                self.completed_cycles % self.settings.cycles_before_long_break == 0
            }
        };
        let (break_phase, break_secs) = if long {
            (Phase::LongBreak, self.settings.long_break_secs)
        } else {
            (Phase::ShortBreak, self.settings.short_break_secs)
        };
        self.enter(break_phase, break_secs);

        info!(
            %focus_phase,
            elapsed,
            completed_cycles = self.completed_cycles,
            %break_phase,
            "cycle completed"
        );
        Event::CycleCompleted {
            focus_phase,
            focus_minutes: elapsed as f64 / 60.0,
            completed_cycles: self.completed_cycles,
            break_phase,
            break_secs,
            expired,
            at: Utc::now(),
        }
    }

    fn expire(&mut self) -> Event {
        match self.phase {
            Phase::Focus | Phase::DeepFocus => self.finish_focus(true),
            Phase::MicroBreak => self.end_micro_break(),
            Phase::ShortBreak | Phase::LongBreak => match self.mode {
                RunMode::AutoRun { cycle } if cycle < AUTO_RUN_CYCLES => {
                    self.mode = RunMode::AutoRun { cycle: cycle + 1 };
                    self.begin_focus()
                }
                RunMode::AutoRun { cycle } => {
                    self.go_idle();
                    info!(cycles = cycle, "auto-run finished");
                    Event::AutoRunFinished {
                        cycles: cycle,
                        at: Utc::now(),
                    }
                }
                RunMode::Manual => {
                    let break_phase = self.phase;
                    self.go_idle();
                    info!(%break_phase, "break over");
                    Event::BreakEnded {
                        break_phase,
                        at: Utc::now(),
                    }
                }
            },
            // Idle never ticks; treat a stray expiry as a stop.
            Phase::Idle => self.stop(),
        }
    }

    fn end_micro_break(&mut self) -> Event {
        match self.suspended.take() {
            Some(saved) => {
                self.phase = saved.phase;
                self.remaining_secs = saved.remaining_secs;
                self.phase_total_secs = saved.total_secs;
                self.phase_epoch = self.phase_epoch.wrapping_add(1);
                info!(phase = %saved.phase, remaining = saved.remaining_secs, "micro-break over");
                Event::MicroBreakEnded {
                    resumed_phase: saved.phase,
                    remaining_secs: saved.remaining_secs,
                    at: Utc::now(),
                }
            }
            // A micro-break without a parked phase has nothing to return to.
            None => self.begin_focus(),
        }
    }

    fn enter(&mut self, phase: Phase, duration_secs: u64) {
        self.phase_epoch = self.phase_epoch.wrapping_add(1);
        self.phase = phase;
        self.remaining_secs = duration_secs;
        self.phase_total_secs = duration_secs;
        self.paused = false;
    }

    fn go_idle(&mut self) {
        self.phase_epoch = self.phase_epoch.wrapping_add(1);
        self.phase = Phase::Idle;
        self.running = false;
        self.paused = false;
        self.current_task = None;
        self.remaining_secs = 0;
        self.phase_total_secs = 0;
        self.mode = RunMode::Manual;
        self.suspended = None;
    }
}

fn normalize_task(task: Option<String>) -> Option<String> {
    task.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
