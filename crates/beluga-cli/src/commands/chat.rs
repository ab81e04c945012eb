//! Terminal chat loop.

use std::sync::Arc;

use beluga_core::{
    CannedResponder, CommandDispatcher, Config, Event, LogNotifier, Notifier, TimerSession,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

pub const WELCOME: &str = "Welcome to Beluga Focus Timer!\n\
                           Type 'help' to see available commands\n\
                           ==================================";

/// Prints events the user did not directly ask for, such as a phase
/// running out, while the prompt is waiting for input.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, event: &Event) {
        LogNotifier.notify(event);
        if event.is_timer_driven() {
            println!("\n[NOTIFICATION] {}", event.message());
        }
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let session = Arc::new(TimerSession::from_config(
        &config.timer,
        Arc::new(ConsoleNotifier),
    )?);
    let dispatcher = CommandDispatcher::new(session.clone(), Arc::new(CannedResponder::default()))
        .with_auto_run(config.timer.auto_run);
    info!(session = %session.id(), "chat session started");

    println!("{WELCOME}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if matches!(input.to_ascii_lowercase().as_str(), "quit" | "exit") {
            break;
        }
        let reply = dispatcher.dispatch(input).await;
        println!("Beluga: {}", reply.message);
    }

    session.stop().await;
    println!("Goodbye! Keep up the focus.");
    Ok(())
}
