//! Session statistics accumulated over the process lifetime.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::timer::Phase;

/// Running totals for completed focus work.
///
/// Only the timer engine mutates these, and only by adding to them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub total_focus_minutes: f64,
    pub completed_cycles: u32,
    pub tasks_completed: u32,
    pub deep_focus_sessions: u32,
    pub micro_breaks_taken: u32,
}

impl SessionStatistics {
    /// Commit a finished focus or deep-focus phase.
    pub(crate) fn record_focus(&mut self, phase: Phase, elapsed_secs: u64) {
        self.total_focus_minutes += elapsed_secs as f64 / 60.0;
        self.tasks_completed = self.tasks_completed.saturating_add(1);
        self.completed_cycles = self.completed_cycles.saturating_add(1);
        if phase == Phase::DeepFocus {
            self.deep_focus_sessions = self.deep_focus_sessions.saturating_add(1);
        }
    }

    pub(crate) fn record_micro_break(&mut self) {
        self.micro_breaks_taken = self.micro_breaks_taken.saturating_add(1);
    }

    /// True when no counter in `self` is below the matching one in `earlier`.
    pub fn dominates(&self, earlier: &SessionStatistics) -> bool {
        self.total_focus_minutes >= earlier.total_focus_minutes
            && self.completed_cycles >= earlier.completed_cycles
            && self.tasks_completed >= earlier.tasks_completed
            && self.deep_focus_sessions >= earlier.deep_focus_sessions
            && self.micro_breaks_taken >= earlier.micro_breaks_taken
    }
}

impl fmt::Display for SessionStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Focus Sessions:")?;
        writeln!(f, "• Total Focus Time: {:.1} minutes", self.total_focus_minutes)?;
        writeln!(f, "• Completed Cycles: {}", self.completed_cycles)?;
        writeln!(f, "• Tasks Completed: {}", self.tasks_completed)?;
        writeln!(f, "• Deep Focus Sessions: {}", self.deep_focus_sessions)?;
        write!(f, "• Micro-breaks Taken: {}", self.micro_breaks_taken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_focus_accumulates() {
        let mut stats = SessionStatistics::default();
        stats.record_focus(Phase::Focus, 90);
        stats.record_focus(Phase::DeepFocus, 30);

        assert!((stats.total_focus_minutes - 2.0).abs() < f64::EPSILON);
        assert_eq!(stats.tasks_completed, 2);
        assert_eq!(stats.completed_cycles, 2);
        assert_eq!(stats.deep_focus_sessions, 1);
    }

    #[test]
    fn dominates_detects_any_decrease() {
        let before = SessionStatistics::default();
        let mut after = before.clone();
        after.record_micro_break();
        assert!(after.dominates(&before));
        assert!(!before.dominates(&after));
    }

    #[test]
    fn renders_summary_block() {
        let stats = SessionStatistics {
            total_focus_minutes: 12.5,
            completed_cycles: 2,
            tasks_completed: 2,
            deep_focus_sessions: 0,
            micro_breaks_taken: 1,
        };
        let text = stats.to_string();
        assert!(text.starts_with("Focus Sessions:\n"));
        assert!(text.contains("• Total Focus Time: 12.5 minutes"));
        assert!(text.ends_with("• Micro-breaks Taken: 1"));
    }
}
