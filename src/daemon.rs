//! Daemon - the main relay service
//!
//! Builds the collaborators once from configuration and serves the
//! WebSocket handoff endpoint until interrupted.

use std::sync::Arc;

use crate::api::{ApiServer, ApiState};
use crate::functions::FunctionRouter;
use crate::lights::{ColorResolver, DeviceActuator, OpenAiCompletion};
use crate::session::{RealtimeCredentials, SessionHandoff};
use crate::voice::{TriggerDetector, WakePhraseMatcher, WhisperTranscriber};
use crate::{Config, Result};

/// The relay daemon
pub struct Daemon {
    config: Arc<Config>,
    handoff: SessionHandoff,
}

impl Daemon {
    /// Create a new daemon instance
    ///
    /// # Errors
    ///
    /// Returns error if a collaborator cannot be initialized
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let handoff = build_handoff(&config)?;

        tracing::info!(
            bridge = %config.bridge.address,
            stt_model = %config.openai.stt_model,
            realtime_model = %config.openai.realtime_model,
            wake_phrases = config.wake_phrases.len(),
            "relay initialized"
        );

        Ok(Self { config, handoff })
    }

    /// Run the daemon until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run
    pub async fn run(self) -> Result<()> {
        tracing::info!(port = self.config.server.port, "daemon running");

        let state = Arc::new(ApiState {
            handoff: self.handoff,
        });

        ApiServer::new(state, self.config.server.port).run().await
    }
}

/// Wire the trigger detector, router, and credential issuer from configuration
///
/// # Errors
///
/// Returns error if an HTTP client cannot be built
pub fn build_handoff(config: &Config) -> Result<SessionHandoff> {
    let detector = Arc::new(build_detector(config)?);
    let credentials = Arc::new(RealtimeCredentials::new(&config.openai)?);

    Ok(SessionHandoff::new(detector, credentials, build_router(config)?))
}

/// Build the trigger detector
///
/// # Errors
///
/// Returns error if the transcription client cannot be built
pub fn build_detector(config: &Config) -> Result<TriggerDetector> {
    let transcriber = Arc::new(WhisperTranscriber::new(&config.openai, &config.wake_phrases)?);

    Ok(TriggerDetector::new(
        transcriber,
        WakePhraseMatcher::new(&config.wake_phrases),
        config.server.max_segment_bytes,
    ))
}

/// Build the function-call router
///
/// # Errors
///
/// Returns error if the bridge or completion client cannot be built
pub fn build_router(config: &Config) -> Result<FunctionRouter> {
    let actuator = DeviceActuator::from_config(&config.bridge)?;
    let colors = Arc::new(build_color_resolver(config)?);

    Ok(FunctionRouter::new(
        Arc::new(config.zones.clone()),
        actuator,
        colors,
    ))
}

/// Build the color resolver
///
/// # Errors
///
/// Returns error if the completion client cannot be built
pub fn build_color_resolver(config: &Config) -> Result<ColorResolver> {
    Ok(ColorResolver::new(Arc::new(OpenAiCompletion::new(&config.openai)?)))
}
