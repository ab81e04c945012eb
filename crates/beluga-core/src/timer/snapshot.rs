use serde::{Deserialize, Serialize};
use std::fmt;

use super::Phase;

/// Point-in-time view of a timer session, safe to hand to any reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub phase: Phase,
    pub remaining_seconds: u64,
    pub phase_total_seconds: u64,
    pub current_task: Option<String>,
    pub running: bool,
    pub paused: bool,
    /// Always equal to `paused`; kept as its own field for dashboard clients.
    pub can_resume: bool,
    pub completed_cycles: u32,
    /// Position within an auto-run (1-based), absent in manual mode.
    pub auto_run_cycle: Option<u32>,
}

impl StatusSnapshot {
    /// `MM:SS` rendering of the remaining time.
    pub fn remaining_clock(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_seconds / 60,
            self.remaining_seconds % 60
        )
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Current state: {}", self.phase)?;
        if self.paused {
            f.write_str(" (paused)")?;
        }
        write!(f, "\nTime remaining: {}", self.remaining_clock())?;
        if let Some(task) = &self.current_task {
            write!(f, "\nCurrent task: {task}")?;
        }
        Ok(())
    }
}
