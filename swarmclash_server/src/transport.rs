//! HTTP + WebSocket edge.
//!
//! One router serves the health probes, the WebSocket upgrade, and the
//! browser client's static assets. Each connection gets a session id, a
//! writer task draining its hub channel, and a read loop that turns
//! `{event, data}` frames into actor commands. Moderation runs here, on
//! the connection task, so the oracle round-trip never blocks the tick.

use crate::hub::{EventSink, Hub};
use crate::simulation::{Command, ServerStats};
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use swarmclash_core::{ClientEvent, NameRejection, PlayerId, ServerEvent};
use swarmclash_oracle::Adjudicator;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{debug, info};

/// Shared handles for the HTTP handlers.
pub struct AppState {
    pub hub: Arc<Hub>,
    pub commands: mpsc::UnboundedSender<Command>,
    pub adjudicator: Arc<Adjudicator>,
    pub stats: Arc<ServerStats>,
}

/// Builds the full router: health endpoints, the WebSocket upgrade,
/// and static assets, all CORS-permissive.
pub fn router(state: Arc<AppState>, static_root: PathBuf) -> Router {
    let assets = ServeDir::new(static_root)
        .append_index_html_on_directories(true)
        .not_found_service(get(landing));
    Router::new()
        .route("/health", get(health))
        .route("/test", get(test_status))
        .route("/ws", get(ws_upgrade))
        .fallback_service(assets)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// Shown when no client bundle is deployed next to the server.
async fn landing() -> Html<&'static str> {
    Html("<h1>SwarmClash</h1><p>Server is running!</p>")
}

async fn test_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "sessions": state.hub.session_count(),
        "players": state.stats.players.load(Ordering::Relaxed),
        "minions": state.stats.minions.load(Ordering::Relaxed),
        "ticks": state.stats.ticks.load(Ordering::Relaxed),
    }))
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let session = PlayerId::new();
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    state.hub.register(session, out_tx);
    info!(%session, "client connected");

    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if ws_tx.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    while let Some(received) = ws_rx.next().await {
        let Ok(message) = received else { break };
        match message {
            Message::Text(text) => handle_frame(&state, session, &text).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    // The transport layer tears the session down; the actor sweeps the
    // fleet and ghost minions.
    state.hub.unregister(&session);
    let _ = state.commands.send(Command::Disconnect { session });
    writer.abort();
    info!(%session, "client disconnected");
}

/// Parses one inbound frame and forwards it as a command. Per-session
/// ordering holds because this runs inline on the read loop.
async fn handle_frame(state: &Arc<AppState>, session: PlayerId, text: &str) {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(err) => {
            debug!(%session, %err, "ignoring unparseable frame");
            return;
        }
    };

    match event {
        ClientEvent::JoinGame { name } => {
            let name = name.trim().to_string();
            if name.is_empty() {
                state.hub.emit(
                    &session,
                    &ServerEvent::JoinFailed {
                        message: NameRejection::Empty.to_string(),
                    },
                );
                return;
            }
            if !state.adjudicator.moderate(&name).await.is_appropriate() {
                state.hub.emit(
                    &session,
                    &ServerEvent::JoinFailed {
                        message: NameRejection::Inappropriate.to_string(),
                    },
                );
                return;
            }
            let _ = state.commands.send(Command::Join { session, name });
        }
        ClientEvent::MovePlayer { dx, dy } => {
            let _ = state.commands.send(Command::Move { session, dx, dy });
        }
        ClientEvent::ChangeName {
            name,
            from_adjective_collection,
        } => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return;
            }
            // System-generated names skip moderation.
            if !from_adjective_collection
                && !state.adjudicator.moderate(&name).await.is_appropriate()
            {
                state.hub.emit(
                    &session,
                    &ServerEvent::NameChangeFailed {
                        message: NameRejection::Inappropriate.to_string(),
                    },
                );
                return;
            }
            let _ = state.commands.send(Command::Rename { session, name });
        }
        ClientEvent::RespawnPlayer {} => {
            let _ = state.commands.send(Command::Respawn { session });
        }
    }
}
