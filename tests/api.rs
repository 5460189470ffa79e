//! API endpoint integration tests

use std::sync::Arc;

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;
use wake_relay::api::{ApiServer, ApiState};

mod common;
use common::test_handoff;

/// Build a test API router
fn build_test_router() -> axum::Router {
    let state = Arc::new(ApiState {
        handoff: test_handoff(Some("hey jeff"), Some("ek_test")),
    });

    ApiServer::new(state, 0).router()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["zones"]["bedroom"], 2);
    assert_eq!(json["zones"]["fox"], 1);
}

#[tokio::test]
async fn test_websocket_requires_upgrade() {
    let app = build_test_router();

    // Plain GET without upgrade headers
    let response = app
        .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_unknown_route() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/sessions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("origin", "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
}

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serve the router on an ephemeral port and return its WebSocket URL
async fn serve_test_router() -> String {
    let state = Arc::new(ApiState {
        handoff: test_handoff(Some("hey Jeff turn on the lights"), Some("ek_test")),
    });
    let app = ApiServer::new(state, 0).router();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("ws://{addr}/ws")
}

/// Next text frame from the relay, parsed as JSON
async fn next_json(client: &mut Client) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("relay reply timed out")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

#[tokio::test]
async fn test_websocket_handoff_cycle() {
    let url = serve_test_router().await;
    let (mut client, _) = connect_async(url.as_str()).await.unwrap();

    client
        .send(Message::Binary(vec![0_u8; 1024].into()))
        .await
        .unwrap();
    let reply = next_json(&mut client).await;
    assert_eq!(
        reply,
        serde_json::json!({
            "type": "mode-activate",
            "enabled": true,
            "startingText": "hey Jeff turn on the lights",
            "credential": {"value": "ek_test"}
        })
    );

    // Undecodable frames are answered and the connection stays open
    client.send(Message::Text("garbage".into())).await.unwrap();
    let reply = next_json(&mut client).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["code"], "invalid_message");

    client
        .send(Message::Text(
            r#"{"type": "function-call", "name": "turn_off_self"}"#.into(),
        ))
        .await
        .unwrap();
    let reply = next_json(&mut client).await;
    assert_eq!(
        reply,
        serde_json::json!({"type": "mode-deactivate", "enabled": false})
    );
}

#[tokio::test]
async fn test_base64_audio_frame_activates() {
    let url = serve_test_router().await;
    let (mut client, _) = connect_async(url.as_str()).await.unwrap();

    client
        .send(Message::Text(
            r#"{"type": "passive-audio", "audio": "AAECAwQF"}"#.into(),
        ))
        .await
        .unwrap();
    let reply = next_json(&mut client).await;
    assert_eq!(reply["type"], "mode-activate");
    assert_eq!(reply["credential"]["value"], "ek_test");
}

#[tokio::test]
async fn test_reply_to_closed_client_keeps_relay_running() {
    let url = serve_test_router().await;

    // Close before the activation for this segment can be delivered
    let (mut client, _) = connect_async(url.as_str()).await.unwrap();
    client
        .send(Message::Binary(vec![0_u8; 1024].into()))
        .await
        .unwrap();
    client.close(None).await.unwrap();
    drop(client);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let (mut client, _) = connect_async(url.as_str()).await.unwrap();
    client
        .send(Message::Text(r#"{"type": "ping"}"#.into()))
        .await
        .unwrap();
    assert_eq!(next_json(&mut client).await, serde_json::json!({"type": "pong"}));
}
