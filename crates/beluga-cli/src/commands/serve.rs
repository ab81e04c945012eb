use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use beluga_core::{
    update_channel, CannedResponder, ChannelNotifier, CommandDispatcher, Config, StatusBroadcaster,
    TimerSession,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::commands::chat::WELCOME;
use crate::server::{self, AppState};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub async fn run(bind: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let period = config.server.broadcast_interval()?;
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());

    let updates = update_channel();
    let session = Arc::new(TimerSession::from_config(
        &config.timer,
        Arc::new(ChannelNotifier::new(updates.clone())),
    )?);
    let dispatcher = Arc::new(
        CommandDispatcher::new(session.clone(), Arc::new(CannedResponder::default()))
            .with_auto_run(config.timer.auto_run),
    );
    let broadcaster = StatusBroadcaster::spawn(session.clone(), updates.clone(), period);

    let app = server::router(AppState {
        dispatcher,
        updates,
    });

    let listener = TcpListener::bind(&bind).await?;
    let addr = listener.local_addr()?;
    println!("{WELCOME}");
    println!("\nStarting web interface at http://{addr}");
    info!(%addr, session = %session.id(), "dashboard listening");

    let cancel = CancellationToken::new();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(cancel.clone().cancelled_owned())
        .into_future();

    // Open event streams never finish on their own; give them a grace period.
    tokio::select! {
        result = server => result?,
        _ = async {
            shutdown_signal().await;
            info!("shutting down");
            cancel.cancel();
            tokio::time::sleep(SHUTDOWN_GRACE).await;
        } => warn!("event streams still open, closing anyway"),
    }

    broadcaster.shutdown().await;
    session.stop().await;
    info!("dashboard shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
