//! Shared test utilities
//!
//! In-process stand-ins for the upstream services so the relay can be
//! exercised without network access.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use wake_relay::lights::{BridgeTransport, ChatCompletion};
use wake_relay::voice::{Transcriber, WakePhraseMatcher};
use wake_relay::{
    ColorResolver, CredentialIssuer, DeviceActuator, EphemeralCredential, Error, FunctionRouter,
    LightPayload, Result, SessionHandoff, TriggerDetector, ZoneTable,
};

/// A light update observed by a transport
#[derive(Debug, Clone, PartialEq)]
pub struct Put {
    pub path: String,
    pub body: serde_json::Value,
}

/// Transport that records every request it sees
pub struct RecordingTransport {
    tx: mpsc::UnboundedSender<Put>,
    fail: bool,
}

#[async_trait]
impl BridgeTransport for RecordingTransport {
    async fn put(&self, path: &str, payload: &LightPayload) -> Result<()> {
        let _ = self.tx.send(Put {
            path: path.to_string(),
            body: serde_json::to_value(payload)?,
        });

        if self.fail {
            Err(Error::Bridge("bridge unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Create a transport and the receiver for its requests
pub fn recording_transport(fail: bool) -> (Arc<RecordingTransport>, mpsc::UnboundedReceiver<Put>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(RecordingTransport { tx, fail }), rx)
}

/// Drain everything received so far
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Put>) -> Vec<Put> {
    let mut puts = Vec::new();
    while let Ok(put) = rx.try_recv() {
        puts.push(put);
    }
    puts
}

/// Wait for the next request, or `None` after a short timeout
pub async fn next_put(rx: &mut mpsc::UnboundedReceiver<Put>) -> Option<Put> {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .ok()
        .flatten()
}

/// Transcriber that returns a fixed reply
pub struct FixedTranscriber(pub Option<String>);

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String> {
        self.0
            .clone()
            .ok_or_else(|| Error::Stt("service unavailable".to_string()))
    }
}

/// Credential issuer that returns a fixed token, or fails
pub struct FixedIssuer(pub Option<&'static str>);

#[async_trait]
impl CredentialIssuer for FixedIssuer {
    async fn issue(&self) -> Result<EphemeralCredential> {
        self.0
            .map(EphemeralCredential::new)
            .ok_or_else(|| Error::Credential("quota exceeded".to_string()))
    }
}

/// Completion that returns a fixed reply, or fails
pub struct FixedCompletion(pub Option<&'static str>);

#[async_trait]
impl ChatCompletion for FixedCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        self.0
            .map(str::to_string)
            .ok_or_else(|| Error::Completion("model unavailable".to_string()))
    }
}

/// Zone table with one or two devices per zone
pub fn test_zones() -> ZoneTable {
    ZoneTable {
        bedroom: vec!["bed-1".to_string(), "bed-2".to_string()],
        fireplace: vec!["fire-1".to_string()],
        vine: vec!["vine-1".to_string()],
        fox: vec!["fox-1".to_string()],
        living_room: vec!["living-1".to_string()],
    }
}

/// Router over the test zones
pub fn test_router(
    primary: Arc<dyn BridgeTransport>,
    fallback: Arc<dyn BridgeTransport>,
    color_reply: Option<&'static str>,
) -> FunctionRouter {
    FunctionRouter::new(
        Arc::new(test_zones()),
        DeviceActuator::new(primary, fallback),
        Arc::new(ColorResolver::new(Arc::new(FixedCompletion(color_reply)))),
    )
}

/// Handoff handler with a healthy bridge
pub fn test_handoff(transcript: Option<&str>, credential: Option<&'static str>) -> SessionHandoff {
    let (primary, _) = recording_transport(false);
    let (fallback, _) = recording_transport(false);

    let detector = TriggerDetector::new(
        Arc::new(FixedTranscriber(transcript.map(str::to_string))),
        WakePhraseMatcher::default(),
        200_000,
    );

    SessionHandoff::new(
        Arc::new(detector),
        Arc::new(FixedIssuer(credential)),
        test_router(primary, fallback, None),
    )
}
