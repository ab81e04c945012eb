//! Chat command dispatch.
//!
//! Maps one line of user input to a timer operation. Anything that is not a
//! timer command goes to a [`Responder`], which is never treated as an error.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::human_duration;
use crate::timer::{TimerSession, TimerSettings};

/// A parsed line of chat input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start(Option<String>),
    AutoRun(Option<String>),
    Pause,
    Resume,
    Stop,
    Complete,
    Micro,
    Status,
    Stats,
    Help,
    Empty,
    /// Free text for the responder.
    Chat(String),
}

impl Command {
    /// Parse a line. The keyword is case-insensitive; a task keeps its text.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            return Command::Empty;
        }

        let (keyword, rest) = match input.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (input, ""),
        };
        let task = || (!rest.is_empty()).then(|| rest.to_string());
        let bare = |command: Command| {
            if rest.is_empty() {
                command
            } else {
                Command::Chat(input.to_string())
            }
        };

        match keyword.to_ascii_lowercase().as_str() {
            "start" => Command::Start(task()),
            "auto" => Command::AutoRun(task()),
            "pause" => bare(Command::Pause),
            "resume" => bare(Command::Resume),
            "stop" => bare(Command::Stop),
            "complete" => bare(Command::Complete),
            "micro" => bare(Command::Micro),
            "status" => bare(Command::Status),
            "stats" => bare(Command::Stats),
            "help" => bare(Command::Help),
            _ => Command::Chat(input.to_string()),
        }
    }
}

/// Answers chat input that is not a timer command.
pub trait Responder: Send + Sync {
    fn respond(&self, input: &str) -> String;
}

const MOTIVATION: &[&str] = &[
    "Small steps every day add up. Start one focus session now!",
    "You don't have to finish today, you only have to focus for the next session.",
    "Deep work is a skill. Every session you complete makes it stronger.",
    "Progress, not perfection. Let's get one cycle done.",
];

const GREETINGS_TIP: &[&str] = &[
    "Tip: write down the one task you'll work on before you type 'start'.",
    "Tip: silence notifications during focus sessions.",
    "Tip: stand up and move during your breaks, away from the screen.",
];

const STUDY_TIPS: &str = "Beluga Technique study tips:\n\
    1. Pick a single task before each focus session.\n\
    2. Keep your phone out of reach while focusing.\n\
    3. Use short breaks to move, not to scroll.\n\
    4. Take a micro-break ('micro') when your attention drifts.\n\
    5. Chain focus sessions to unlock deep focus.";

/// Fixed-text responder for greetings, motivation and study tips.
#[derive(Debug, Default)]
pub struct CannedResponder {
    turn: AtomicUsize,
}

impl CannedResponder {
    fn next<'a>(&self, lines: &'a [&'a str]) -> &'a str {
        let i = self.turn.fetch_add(1, Ordering::Relaxed);
        lines[i % lines.len()]
    }
}

impl Responder for CannedResponder {
    fn respond(&self, input: &str) -> String {
        let lowered = input.trim().to_lowercase();
        match lowered.as_str() {
            "motivate" => self.next(MOTIVATION).to_string(),
            "hi" | "hello" | "hlo" | "hey" => {
                format!("Hello! I'm Beluga, your focus buddy.\n{}", self.next(GREETINGS_TIP))
            }
            "study tips" | "tips" => STUDY_TIPS.to_string(),
            _ => "I didn't catch that. Type 'help' to see what I can do.".to_string(),
        }
    }
}

/// What the dispatcher sends back for one input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub message: String,
    /// The command was understood but not valid in the current state.
    pub rejected: bool,
}

impl Reply {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            rejected: false,
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            rejected: true,
        }
    }
}

pub struct CommandDispatcher {
    session: Arc<TimerSession>,
    responder: Arc<dyn Responder>,
    /// `start` enters auto-run instead of a single focus phase.
    auto_run: bool,
}

impl CommandDispatcher {
    pub fn new(session: Arc<TimerSession>, responder: Arc<dyn Responder>) -> Self {
        Self {
            session,
            responder,
            auto_run: false,
        }
    }

    pub fn with_auto_run(mut self, auto_run: bool) -> Self {
        self.auto_run = auto_run;
        self
    }

    pub fn session(&self) -> &Arc<TimerSession> {
        &self.session
    }

    pub async fn dispatch(&self, input: &str) -> Reply {
        let command = Command::parse(input);
        debug!(?command, "dispatching");
        self.execute(command).await
    }

    pub async fn execute(&self, command: Command) -> Reply {
        let session = &self.session;
        let outcome = match command {
            Command::Start(task) if self.auto_run => Ok(session.start_auto_run(task).await),
            Command::Start(task) => Ok(session.start_focus(task).await),
            Command::AutoRun(task) => Ok(session.start_auto_run(task).await),
            Command::Pause => session.pause().await,
            Command::Resume => session.resume().await,
            Command::Stop => Ok(session.stop().await),
            Command::Complete => session.complete_cycle().await,
            Command::Micro => session.take_micro_break().await,
            Command::Status => return Reply::ok(session.snapshot().await.to_string()),
            Command::Stats => return Reply::ok(session.statistics().await.to_string()),
            Command::Help => return Reply::ok(help_text(session.settings())),
            Command::Empty => return Reply::ok("Please enter a command"),
            Command::Chat(text) => return Reply::ok(self.responder.respond(&text)),
        };

        match outcome {
            Ok(event) => Reply::ok(event.message()),
            Err(e) => Reply::rejected(e.to_string()),
        }
    }
}

/// Command list plus the technique summary for the configured lengths.
pub fn help_text(settings: &TimerSettings) -> String {
    format!(
        "Available commands:\n\
         - start [task]: Start a Beluga focus session with optional task description\n\
         - auto [task]: Run three focus/break cycles automatically\n\
         - pause: Pause the current timer\n\
         - resume: Resume a paused timer\n\
         - stop: Stop the current timer\n\
         - complete: Complete current focus session and start a break\n\
         - micro: Take a micro-break during a focus session\n\
         - status: Check the current timer status\n\
         - stats: View your Beluga Technique statistics\n\
         - motivate: Get a motivational message\n\
         - hi/hello: Get a greeting and a study tip\n\
         - study tips: Get a list of Beluga Technique tips\n\
         - help: Show this help message\n\
         \n\
         About the Beluga Technique:\n\
         - Regular focus sessions: {focus}\n\
         - Deep focus sessions: {deep} (unlocked after consecutive focus sessions)\n\
         - Short breaks: {short}\n\
         - Micro-breaks: {micro}\n\
         - Long breaks: {long} (after {cycles} completed cycles)",
        focus = human_duration(settings.focus_secs),
        deep = human_duration(settings.deep_focus_secs),
        short = human_duration(settings.short_break_secs),
        micro = human_duration(settings.micro_break_secs),
        long = human_duration(settings.long_break_secs),
        cycles = settings.cycles_before_long_break,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keywords_and_tasks() {
        assert_eq!(
            Command::parse("start write spec"),
            Command::Start(Some("write spec".into()))
        );
        assert_eq!(Command::parse("START"), Command::Start(None));
        assert_eq!(
            Command::parse("  auto  Essay Draft "),
            Command::AutoRun(Some("Essay Draft".into()))
        );
        assert_eq!(Command::parse("pause"), Command::Pause);
        assert_eq!(Command::parse("Resume"), Command::Resume);
        assert_eq!(Command::parse("stop"), Command::Stop);
        assert_eq!(Command::parse("complete"), Command::Complete);
        assert_eq!(Command::parse("micro"), Command::Micro);
        assert_eq!(Command::parse("status"), Command::Status);
        assert_eq!(Command::parse("stats"), Command::Stats);
        assert_eq!(Command::parse("help"), Command::Help);
        assert_eq!(Command::parse("   "), Command::Empty);
    }

    #[test]
    fn unknown_or_decorated_input_is_chat() {
        assert_eq!(
            Command::parse("study tips"),
            Command::Chat("study tips".into())
        );
        assert_eq!(
            Command::parse("stop being lazy"),
            Command::Chat("stop being lazy".into())
        );
        assert_eq!(Command::parse("starting"), Command::Chat("starting".into()));
    }

    #[test]
    fn canned_responder_answers_known_prompts() {
        let responder = CannedResponder::default();
        assert!(MOTIVATION.contains(&responder.respond("motivate").as_str()));
        assert!(responder.respond("Hello").starts_with("Hello! I'm Beluga"));
        assert_eq!(responder.respond("study tips"), STUDY_TIPS);
        assert!(responder.respond("what is love").contains("help"));
    }

    #[test]
    fn help_cites_configured_lengths() {
        let text = help_text(&TimerSettings::default());
        assert!(text.contains("Regular focus sessions: 30 minutes"));
        assert!(text.contains("Long breaks: 20 minutes (after 3 completed cycles)"));
    }
}
