//! # Beluga Core Library
//!
//! Core logic for the Beluga focus timer, a Pomodoro variant with deep-focus
//! sessions, micro-breaks and a long break after every third cycle. The chat
//! CLI and the web dashboard are thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a synchronous phase state machine advanced one second
//!   at a time by `tick()`
//! - **Timer Session**: the engine behind a lock, driven by a single
//!   cancellable ticker task
//! - **Statistics**: totals committed whenever a focus phase completes
//! - **Dispatcher**: chat-command parsing and routing
//! - **Broadcaster**: periodic snapshot fan-out for live clients
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerSession`]: Shared, ticking session
//! - [`CommandDispatcher`]: Chat command routing
//! - [`StatusBroadcaster`]: Live status publishing
//! - [`Config`]: Application configuration management

pub mod broadcast;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod notify;
pub mod stats;
pub mod storage;
pub mod timer;

pub use broadcast::{update_channel, StatusBroadcaster, Update};
pub use dispatcher::{CannedResponder, Command, CommandDispatcher, Reply, Responder};
pub use error::{ConfigError, CoreError, TransitionError};
pub use events::Event;
pub use notify::{ChannelNotifier, LogNotifier, Notifier};
pub use stats::SessionStatistics;
pub use storage::{Config, ServerConfig, TimerConfig};
pub use timer::{
    DeepFocusRoll, Phase, RunMode, StatusSnapshot, TimerEngine, TimerSession, TimerSettings,
};
