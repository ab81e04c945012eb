//! HTTP surface for the web dashboard.
//!
//! Every mutating route goes through the same [`CommandDispatcher`] as the
//! terminal chat, so both surfaces share one set of messages. Live updates
//! are the broadcaster's snapshots plus notifier events, streamed as SSE.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use beluga_core::{
    Command, CommandDispatcher, SessionStatistics, StatusSnapshot, Update,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info};

const DASHBOARD: &str = include_str!("dashboard.html");

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<CommandDispatcher>,
    pub updates: broadcast::Sender<Update>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/chat", post(chat))
        .route("/api/start", post(start))
        .route("/api/pause", post(pause))
        .route("/api/resume", post(resume))
        .route("/api/stop", post(stop))
        .route("/api/complete", post(complete))
        .route("/api/micro", post(micro))
        .route("/api/status", get(status))
        .route("/api/stats", get(stats))
        .route("/api/motivate", get(motivate))
        .route("/api/events", get(events))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
    user_message: String,
    status: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct StartRequest {
    task: Option<String>,
    /// Run three cycles unattended.
    #[serde(default)]
    auto: bool,
}

/// Result of a timer operation, with the state it left behind.
#[derive(Debug, Serialize)]
struct ActionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    snapshot: StatusSnapshot,
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    stats: SessionStatistics,
    text: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    status: &'static str,
    message: String,
}

async fn index() -> Html<&'static str> {
    Html(DASHBOARD)
}

async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Json<ChatResponse> {
    info!(user_message = %req.message, "chat message");
    let reply = state.dispatcher.dispatch(&req.message).await;
    Json(ChatResponse {
        response: reply.message,
        user_message: req.message,
        status: if reply.rejected { "rejected" } else { "success" },
    })
}

async fn start(State(state): State<AppState>, body: Bytes) -> Response {
    let req = if body.is_empty() {
        StartRequest::default()
    } else {
        match serde_json::from_slice::<StartRequest>(&body) {
            Ok(req) => req,
            Err(e) => return (StatusCode::BAD_REQUEST, format!("invalid body: {e}")).into_response(),
        }
    };
    let command = if req.auto {
        Command::AutoRun(req.task)
    } else {
        Command::Start(req.task)
    };
    act(&state, command).await
}

async fn pause(State(state): State<AppState>) -> Response {
    act(&state, Command::Pause).await
}

async fn resume(State(state): State<AppState>) -> Response {
    act(&state, Command::Resume).await
}

async fn stop(State(state): State<AppState>) -> Response {
    act(&state, Command::Stop).await
}

async fn complete(State(state): State<AppState>) -> Response {
    act(&state, Command::Complete).await
}

async fn micro(State(state): State<AppState>) -> Response {
    act(&state, Command::Micro).await
}

async fn act(state: &AppState, command: Command) -> Response {
    let reply = state.dispatcher.execute(command).await;
    let snapshot = state.dispatcher.session().snapshot().await;
    // Push the new state right away instead of waiting for the next broadcast.
    let _ = state.updates.send(Update::TimerUpdate {
        snapshot: snapshot.clone(),
    });

    if reply.rejected {
        let body = ActionResponse {
            message: None,
            error: Some(reply.message),
            snapshot,
        };
        (StatusCode::CONFLICT, Json(body)).into_response()
    } else {
        let body = ActionResponse {
            message: Some(reply.message),
            error: None,
            snapshot,
        };
        Json(body).into_response()
    }
}

async fn status(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.dispatcher.session().snapshot().await)
}

async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.dispatcher.session().statistics().await;
    let text = stats.to_string();
    Json(StatsResponse { stats, text })
}

async fn motivate(State(state): State<AppState>) -> Json<MessageResponse> {
    let reply = state.dispatcher.dispatch("motivate").await;
    Json(MessageResponse {
        status: "success",
        message: reply.message,
    })
}

/// `GET /api/events`: `timer_update` and `notification` SSE events.
///
/// Only timer-driven notifications are streamed. The page already shows
/// the HTTP reply to every action it sent.
async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    debug!("event stream opened");
    let rx = state.updates.subscribe();
    // Lagged receivers skip the missed updates; the next snapshot catches up.
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let update = result.ok()?;
        if let Update::Notification { event, .. } = &update {
            if !event.is_timer_driven() {
                return None;
            }
        }
        let data = serde_json::to_string(&update).ok()?;
        Some(Ok(SseEvent::default().event(update.kind()).data(data)))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
