mod deep_focus;
mod engine;
mod phase;
mod session;
mod snapshot;
mod ticker;

pub use deep_focus::{DeepFocusRoll, DEEP_FOCUS_UNLOCK_STREAK};
pub use engine::{RunMode, TimerEngine, TimerSettings, AUTO_RUN_CYCLES};
pub use phase::Phase;
pub use session::TimerSession;
pub use snapshot::StatusSnapshot;
