//! Realtime channel: one `initial_state` message on connect, then a
//! stream of `music_update` messages as the monitor detects changes.

use super::routes::AppState;
use crate::error::GatewayError;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use tunebridge_core::{ChangeEvent, Snapshot};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    #[serde(default)]
    token: Option<String>,
}

/// Messages the gateway pushes to realtime subscribers.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    InitialState {
        #[serde(flatten)]
        snapshot: Snapshot,
    },
    MusicUpdate {
        update: ChangeEvent,
    },
    Pong {
        timestamp: f64,
    },
}

/// GET /ws?token= - upgrade to the realtime channel.
///
/// The token rides in a query parameter because browsers cannot set
/// headers on a WebSocket handshake; a bad token is rejected before the
/// upgrade completes.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(app): State<AppState>,
) -> Response {
    let authorized = params
        .token
        .as_deref()
        .map(|t| app.token.matches(t))
        .unwrap_or(false);

    if !authorized {
        warn!("realtime client rejected: missing or invalid token");
        return GatewayError::Unauthorized("Invalid authentication token".to_string())
            .into_response();
    }

    ws.on_upgrade(move |socket| handle_client(socket, app))
}

async fn handle_client(mut socket: WebSocket, app: AppState) {
    let mut events = app.broadcaster.subscribe();
    debug!(
        "realtime client connected ({} total)",
        app.broadcaster.subscriber_count()
    );

    // A late joiner gets the monitor's current view, not the events it
    // missed.
    let snapshot = app
        .latest
        .read()
        .await
        .clone()
        .unwrap_or_else(Snapshot::idle);
    if send_json(&mut socket, &ServerMessage::InitialState { snapshot })
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(update) => {
                    if send_json(&mut socket, &ServerMessage::MusicUpdate { update })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!("realtime client lagged, skipped {skipped} events");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if is_ping(&text) {
                        let timestamp =
                            chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
                        if send_json(&mut socket, &ServerMessage::Pong { timestamp })
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("realtime receive error: {e}");
                    break;
                }
            },
        }
    }

    debug!("realtime client disconnected");
}

/// Accept both a bare `ping` and `{"type": "ping"}`.
fn is_ping(text: &str) -> bool {
    if text.trim() == "ping" {
        return true;
    }
    serde_json::from_str::<serde_json::Value>(text)
        .map(|v| v["type"] == "ping")
        .unwrap_or(false)
}

async fn send_json(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(message).map_err(axum::Error::new)?;
    socket.send(Message::Text(json)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tunebridge_core::PlaybackState;

    #[test]
    fn test_is_ping() {
        assert!(is_ping("ping"));
        assert!(is_ping("  ping\n"));
        assert!(is_ping(r#"{"type": "ping"}"#));
        assert!(!is_ping(r#"{"type": "hello"}"#));
        assert!(!is_ping("pong"));
    }

    #[test]
    fn test_initial_state_wire_shape() {
        let message = ServerMessage::InitialState {
            snapshot: Snapshot::idle(),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "initial_state");
        assert_eq!(json["state"], "stopped");
    }

    #[test]
    fn test_music_update_wire_shape() {
        let message = ServerMessage::MusicUpdate {
            update: ChangeEvent::PlaybackStateChanged {
                state: PlaybackState::Paused,
            },
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "music_update");
        assert_eq!(json["update"]["type"], "playback_state_changed");
        assert_eq!(json["update"]["state"], "paused");
    }

    #[test]
    fn test_pong_wire_shape() {
        let message = ServerMessage::Pong { timestamp: 1723.5 };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "pong");
        assert_eq!(json["timestamp"], 1723.5);
    }
}
