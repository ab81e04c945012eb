use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every state change of a timer session produces an Event.
/// The notifier receives them; the chat and API surfaces show `message()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A focus or deep-focus phase began.
    PhaseStarted {
        phase: Phase,
        duration_secs: u64,
        task: Option<String>,
        auto_run_cycle: Option<u32>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        at: DateTime<Utc>,
    },
    /// A focus phase was committed to statistics and a break began.
    CycleCompleted {
        focus_phase: Phase,
        focus_minutes: f64,
        completed_cycles: u32,
        break_phase: Phase,
        break_secs: u64,
        /// Completed by the countdown rather than by an explicit command.
        expired: bool,
        at: DateTime<Utc>,
    },
    MicroBreakStarted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    MicroBreakEnded {
        resumed_phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A manual-mode break ran out; the session is idle again.
    BreakEnded {
        break_phase: Phase,
        at: DateTime<Utc>,
    },
    /// The last break of an auto-run ran out; the session is idle again.
    AutoRunFinished {
        cycles: u32,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Text shown to the user for this event.
    pub fn message(&self) -> String {
        match self {
            Event::PhaseStarted {
                phase,
                duration_secs,
                auto_run_cycle,
                ..
            } => {
                let length = human_duration(*duration_secs);
                match (phase, auto_run_cycle) {
                    (Phase::DeepFocus, Some(cycle)) => {
                        format!("Deep Focus Session {cycle}: Focus intensely for {length}")
                    }
                    (Phase::DeepFocus, None) => {
                        format!("Deep focus session started! Focus intensely for {length}")
                    }
                    (_, Some(cycle)) => format!("Cycle {cycle}: Focus for {length}"),
                    (_, None) => format!("Focus session started! Focus for {length}"),
                }
            }
            Event::TimerPaused { .. } => "Timer paused".to_string(),
            Event::TimerResumed { .. } => "Timer resumed".to_string(),
            Event::TimerStopped { .. } => "Timer stopped".to_string(),
            Event::CycleCompleted {
                break_phase,
                break_secs,
                expired,
                ..
            } => {
                let prefix = if *expired { "Focus session over! " } else { "" };
                let length = human_duration(*break_secs);
                if *break_phase == Phase::LongBreak {
                    format!("{prefix}Great work! Take a long break ({length})")
                } else {
                    format!("{prefix}Good job! Take a short break ({length})")
                }
            }
            Event::MicroBreakStarted { duration_secs, .. } => format!(
                "Micro-break! Stand up and stretch for {}",
                human_duration(*duration_secs)
            ),
            Event::MicroBreakEnded { remaining_secs, .. } => format!(
                "Micro-break over! Back to focus ({:02}:{:02} left)",
                remaining_secs / 60,
                remaining_secs % 60
            ),
            Event::BreakEnded { .. } => "Break over! Get ready for next session!".to_string(),
            Event::AutoRunFinished { .. } => "Session complete! Well done!".to_string(),
        }
    }

    /// True for events the countdown caused on its own. Everything else
    /// answers a command, and the caller already has the reply.
    pub fn is_timer_driven(&self) -> bool {
        match self {
            Event::CycleCompleted { expired, .. } => *expired,
            Event::PhaseStarted { auto_run_cycle, .. } => auto_run_cycle.is_some_and(|c| c > 1),
            Event::MicroBreakEnded { .. }
            | Event::BreakEnded { .. }
            | Event::AutoRunFinished { .. } => true,
            _ => false,
        }
    }
}

/// "30 minutes", "1 minute", or "45 seconds" when not a whole minute.
pub fn human_duration(secs: u64) -> String {
    match (secs / 60, secs % 60) {
        (1, 0) => "1 minute".to_string(),
        (minutes, 0) => format!("{minutes} minutes"),
        _ => format!("{secs} seconds"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_driven_events() {
        let completed = |expired| Event::CycleCompleted {
            focus_phase: Phase::Focus,
            focus_minutes: 30.0,
            completed_cycles: 1,
            break_phase: Phase::ShortBreak,
            break_secs: 420,
            expired,
            at: Utc::now(),
        };
        assert!(completed(true).is_timer_driven());
        assert!(!completed(false).is_timer_driven());
        assert!(!Event::TimerPaused {
            remaining_secs: 10,
            at: Utc::now(),
        }
        .is_timer_driven());

        let cycle = |n| Event::PhaseStarted {
            phase: Phase::Focus,
            duration_secs: 1800,
            task: None,
            auto_run_cycle: Some(n),
            at: Utc::now(),
        };
        assert!(!cycle(1).is_timer_driven());
        assert!(cycle(2).is_timer_driven());
        assert!(Event::AutoRunFinished {
            cycles: 3,
            at: Utc::now(),
        }
        .is_timer_driven());
    }

    #[test]
    fn human_duration_formats() {
        assert_eq!(human_duration(30 * 60), "30 minutes");
        assert_eq!(human_duration(60), "1 minute");
        assert_eq!(human_duration(45), "45 seconds");
        assert_eq!(human_duration(90), "90 seconds");
    }

    #[test]
    fn messages_cite_lengths() {
        let started = Event::PhaseStarted {
            phase: Phase::Focus,
            duration_secs: 1800,
            task: None,
            auto_run_cycle: None,
            at: Utc::now(),
        };
        assert_eq!(started.message(), "Focus session started! Focus for 30 minutes");

        let completed = Event::CycleCompleted {
            focus_phase: Phase::Focus,
            focus_minutes: 30.0,
            completed_cycles: 3,
            break_phase: Phase::LongBreak,
            break_secs: 1200,
            expired: false,
            at: Utc::now(),
        };
        assert_eq!(
            completed.message(),
            "Great work! Take a long break (20 minutes)"
        );
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(Event::TimerStopped { at: Utc::now() }).unwrap();
        assert_eq!(json["type"], "TimerStopped");
    }
}
