//! WebSocket handler for the passive/active handoff protocol
//!
//! Binary frames are passive audio segments. Text frames are JSON messages
//! tagged by `type`. Every inbound message runs on its own task, so slow
//! transcriptions don't hold up function calls and overlapping segments
//! are evaluated concurrently.

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
    routing::get,
};
use base64::Engine as _;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::ApiState;
use crate::functions::FunctionCallRequest;
use crate::session::{EphemeralCredential, SessionEvent};
use crate::voice::AudioSegment;

/// Incoming WebSocket message from client
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WsIncoming {
    /// Base64-encoded passive audio, for clients that can't send binary frames
    PassiveAudio { audio: String },
    /// Function call issued by the live model
    FunctionCall(FunctionCallRequest),
    /// Ping to keep connection alive
    Ping,
}

/// Outgoing WebSocket message to client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WsOutgoing {
    /// Wake phrase detected; open a live session
    ModeActivate {
        enabled: bool,
        #[serde(rename = "startingText")]
        starting_text: String,
        credential: EphemeralCredential,
    },
    /// Close the live session
    ModeDeactivate { enabled: bool },
    /// A client frame could not be decoded
    Error { code: String, message: String },
    /// Pong response
    Pong,
}

impl From<SessionEvent> for WsOutgoing {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::Activate {
                starting_text,
                credential,
            } => Self::ModeActivate {
                enabled: true,
                starting_text,
                credential,
            },
            SessionEvent::Deactivate => Self::ModeDeactivate { enabled: false },
        }
    }
}

/// Build WebSocket router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/ws", get(ws_upgrade)).with_state(state)
}

/// Handle WebSocket upgrade request
async fn ws_upgrade(State(state): State<Arc<ApiState>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<ApiState>) {
    let connection_id = uuid::Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();

    tracing::info!(%connection_id, "client connected");

    // Create channel for sending messages back to client
    let (tx, mut rx) = mpsc::channel::<WsOutgoing>(32);

    // Spawn task to forward messages from channel to WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Binary(bytes) => {
                    spawn_passive_audio(&state, AudioSegment::new(bytes), tx.clone());
                }
                Message::Text(text) => {
                    handle_text(&text, &state, &tx).await;
                }
                Message::Close(_) => {
                    tracing::info!(%connection_id, "WebSocket closed by client");
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    // In-flight message tasks keep running; their sends fail quietly
    tracing::info!(%connection_id, "client disconnected");
}

/// Handle a single text frame
async fn handle_text(text: &str, state: &Arc<ApiState>, tx: &mpsc::Sender<WsOutgoing>) {
    let incoming = match serde_json::from_str::<WsIncoming>(text) {
        Ok(incoming) => incoming,
        Err(e) => {
            tracing::warn!(error = %e, "invalid client message");
            send(tx, WsOutgoing::Error {
                code: "invalid_message".to_string(),
                message: e.to_string(),
            })
            .await;
            return;
        }
    };

    match incoming {
        WsIncoming::Ping => send(tx, WsOutgoing::Pong).await,
        WsIncoming::PassiveAudio { audio } => {
            match base64::engine::general_purpose::STANDARD.decode(audio.as_bytes()) {
                Ok(bytes) => spawn_passive_audio(state, AudioSegment::new(bytes), tx.clone()),
                Err(e) => {
                    send(tx, WsOutgoing::Error {
                        code: "invalid_audio".to_string(),
                        message: e.to_string(),
                    })
                    .await;
                }
            }
        }
        WsIncoming::FunctionCall(request) => {
            let handoff = state.handoff.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(event) = handoff.on_function_call(request).await {
                    send(&tx, event.into()).await;
                }
            });
        }
    }
}

/// Evaluate a passive segment in the background
fn spawn_passive_audio(state: &Arc<ApiState>, segment: AudioSegment, tx: mpsc::Sender<WsOutgoing>) {
    tracing::debug!(bytes = segment.len(), "received passive audio");

    let handoff = state.handoff.clone();
    tokio::spawn(async move {
        if let Some(event) = handoff.on_passive_audio(segment).await {
            send(&tx, event.into()).await;
        }
    });
}

/// Queue a message for the client, ignoring a closed connection
async fn send(tx: &mpsc::Sender<WsOutgoing>, msg: WsOutgoing) {
    if tx.send(msg).await.is_err() {
        tracing::debug!("connection closed before message could be sent");
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn activation_wire_format() {
        let msg = WsOutgoing::from(SessionEvent::Activate {
            starting_text: "hey Jeff turn on the lights".to_string(),
            credential: EphemeralCredential::new("ek_123"),
        });

        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "mode-activate",
                "enabled": true,
                "startingText": "hey Jeff turn on the lights",
                "credential": {"value": "ek_123"}
            })
        );
    }

    #[test]
    fn deactivation_wire_format() {
        let msg = WsOutgoing::from(SessionEvent::Deactivate);
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"type": "mode-deactivate", "enabled": false})
        );
    }

    #[test]
    fn parses_function_call() {
        let msg: WsIncoming = serde_json::from_str(
            r#"{"type": "function-call", "name": "change_lights", "args": {"action": "turn_on", "type": "fox"}}"#,
        )
        .unwrap();

        let WsIncoming::FunctionCall(request) = msg else {
            panic!("expected function call");
        };
        assert_eq!(request.name, "change_lights");
        assert_eq!(request.args["type"], "fox");
    }

    #[test]
    fn function_call_args_default_to_null() {
        let msg: WsIncoming =
            serde_json::from_str(r#"{"type": "function-call", "name": "turn_off_self"}"#).unwrap();
        let WsIncoming::FunctionCall(request) = msg else {
            panic!("expected function call");
        };
        assert!(request.args.is_null());
    }

    #[test]
    fn parses_ping_and_audio() {
        assert!(matches!(
            serde_json::from_str::<WsIncoming>(r#"{"type": "ping"}"#).unwrap(),
            WsIncoming::Ping
        ));
        assert!(matches!(
            serde_json::from_str::<WsIncoming>(r#"{"type": "passive-audio", "audio": "AAEC"}"#).unwrap(),
            WsIncoming::PassiveAudio { .. }
        ));
        assert!(serde_json::from_str::<WsIncoming>(r#"{"type": "reboot"}"#).is_err());
    }
}
