//! Relay side of the handoff protocol
//!
//! Transport-agnostic: the WebSocket layer feeds client messages in and
//! forwards whatever event comes back. `None` means "send nothing", which
//! is also how a non-triggering segment is acknowledged.

use std::sync::Arc;

use super::{CredentialIssuer, SessionEvent};
use crate::functions::{Dispatched, FunctionCallRequest, FunctionRouter};
use crate::voice::{AudioSegment, TriggerDetector};

/// Handles the two client→relay messages of the handoff protocol
#[derive(Clone)]
pub struct SessionHandoff {
    detector: Arc<TriggerDetector>,
    credentials: Arc<dyn CredentialIssuer>,
    router: FunctionRouter,
}

impl SessionHandoff {
    /// Create a handoff handler from its collaborators
    #[must_use]
    pub fn new(
        detector: Arc<TriggerDetector>,
        credentials: Arc<dyn CredentialIssuer>,
        router: FunctionRouter,
    ) -> Self {
        Self {
            detector,
            credentials,
            router,
        }
    }

    /// Evaluate a passive audio segment
    ///
    /// Returns an activation only when the wake phrase was heard and a
    /// credential could be issued. A failed issuance leaves the client
    /// passive; its next segment gets another chance.
    pub async fn on_passive_audio(&self, segment: AudioSegment) -> Option<SessionEvent> {
        let result = self.detector.evaluate(&segment).await;
        drop(segment);

        if !result.triggered {
            return None;
        }

        tracing::info!(transcript = %result.transcript, "wake phrase detected, entering active mode");

        match self.credentials.issue().await {
            Ok(credential) => Some(SessionEvent::Activate {
                starting_text: result.transcript,
                credential,
            }),
            Err(e) => {
                tracing::error!(error = %e, "failed to issue live session credential");
                None
            }
        }
    }

    /// Dispatch a function call forwarded from the live session
    ///
    /// Only a self-deactivation produces an event; device action results
    /// are logged, not reported back.
    pub async fn on_function_call(&self, request: FunctionCallRequest) -> Option<SessionEvent> {
        let outcome = self.router.route(&request.name, &request.args).await;

        if outcome.succeeded() {
            tracing::info!(name = %request.name, "function call succeeded");
        } else {
            tracing::warn!(name = %request.name, "function call failed");
        }

        (outcome == Dispatched::Deactivate).then_some(SessionEvent::Deactivate)
    }

    /// The router behind this handler
    #[must_use]
    pub const fn router(&self) -> &FunctionRouter {
        &self.router
    }
}
