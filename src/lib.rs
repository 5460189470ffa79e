//! Wake Relay - voice-activated lighting relay
//!
//! This library provides the relay side of a voice assistant that listens
//! passively for a wake phrase and hands off to a live conversational model:
//! - Trigger detection over passive audio segments (STT + wake phrase match)
//! - The passive/active session handoff protocol over WebSocket
//! - Routing of model-issued function calls to lighting actions
//! - Bridge actuation with a fallback transport, and color resolution
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                       Client                         │
//! │   mic + VAD  │  live session (direct to model)       │
//! └───────┬────────────────────────┬─────────────────────┘
//!         │ passive-audio          │ function-call
//! ┌───────▼────────────────────────▼─────────────────────┐
//! │                     Wake Relay                       │
//! │  TriggerDetector │ SessionHandoff │ FunctionRouter   │
//! └───────┬──────────────────┬─────────────┬─────────────┘
//!         │                  │             │
//!   transcription    client secrets   ColorResolver │ DeviceActuator
//!                                          │             │
//!                                    chat completion   bridge (+ curl)
//! ```

pub mod api;
pub mod config;
pub mod daemon;
pub mod error;
pub mod functions;
pub mod lights;
pub mod session;
pub mod voice;

pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use functions::{Dispatched, FunctionCall, FunctionCallRequest, FunctionRouter, LightAction};
pub use lights::{
    Chromaticity, ColorResolver, DEFAULT_CHROMATICITY, DeviceActuator, DeviceTarget, LightPayload,
    ZoneTable,
};
pub use session::{
    ACTIVE_SESSION_LIMIT, CredentialIssuer, EphemeralCredential, SessionEvent, SessionHandoff,
    SessionMode,
};
pub use voice::{AudioSegment, TranscriptionResult, TriggerDetector, WakePhraseMatcher};
