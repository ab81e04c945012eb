use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Focus,
    DeepFocus,
    ShortBreak,
    LongBreak,
    MicroBreak,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Focus => "focus",
            Phase::DeepFocus => "deep_focus",
            Phase::ShortBreak => "short_break",
            Phase::LongBreak => "long_break",
            Phase::MicroBreak => "micro_break",
        }
    }

    /// Focus and deep focus are the phases that count toward statistics.
    pub fn is_focus(&self) -> bool {
        matches!(self, Phase::Focus | Phase::DeepFocus)
    }

    pub fn is_break(&self) -> bool {
        matches!(
            self,
            Phase::ShortBreak | Phase::LongBreak | Phase::MicroBreak
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_snake_case_tag() {
        let json = serde_json::to_string(&Phase::DeepFocus).unwrap();
        assert_eq!(json, "\"deep_focus\"");
        assert_eq!(Phase::ShortBreak.to_string(), "short_break");
    }

    #[test]
    fn focus_and_break_classification() {
        assert!(Phase::Focus.is_focus());
        assert!(Phase::DeepFocus.is_focus());
        assert!(!Phase::MicroBreak.is_focus());
        assert!(Phase::MicroBreak.is_break());
        assert!(!Phase::Idle.is_break());
    }
}
