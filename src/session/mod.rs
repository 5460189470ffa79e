//! Passive/active session handoff
//!
//! A connection is either passive (the client streams short utterances for
//! wake phrase checks) or active (the client talks to the realtime model
//! directly and forwards its function calls here). The relay keeps no
//! per-connection mode: it only emits [`SessionEvent`]s, and the client's
//! [`SessionMode`] follows them.
//!
//! ```text
//! Passive --[wake phrase]--> Active --[turn_off_self | 20 min | disconnect]--> Passive
//! ```

mod credential;
mod handoff;

use std::time::{Duration, Instant};

pub use credential::{CredentialIssuer, EphemeralCredential, RealtimeCredentials};
pub use handoff::SessionHandoff;

/// Longest an active session may stay open, enforced by the client
pub const ACTIVE_SESSION_LIMIT: Duration = Duration::from_secs(20 * 60);

/// Mode transition announced by the relay
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Wake phrase heard; open a live session seeded with the transcript
    Activate {
        starting_text: String,
        credential: EphemeralCredential,
    },
    /// The live model asked to end the session
    Deactivate,
}

/// The client's view of a connection
#[derive(Debug, Clone, PartialEq)]
pub enum SessionMode {
    Passive,
    Active {
        credential: EphemeralCredential,
        seed_transcript: String,
        activated_at: Instant,
    },
}

impl SessionMode {
    /// Apply a relay event
    ///
    /// An activation while already active is ignored: overlapping segments
    /// can trigger twice and only the first credential is used.
    #[must_use]
    pub fn apply(self, event: &SessionEvent, now: Instant) -> Self {
        match (self, event) {
            (Self::Passive, SessionEvent::Activate { starting_text, credential }) => Self::Active {
                credential: credential.clone(),
                seed_transcript: starting_text.clone(),
                activated_at: now,
            },
            (active @ Self::Active { .. }, SessionEvent::Activate { .. }) => active,
            (_, SessionEvent::Deactivate) => Self::Passive,
        }
    }

    /// Drop back to passive once the active session outlives its limit
    #[must_use]
    pub fn expire(self, now: Instant) -> Self {
        match self {
            Self::Active { activated_at, .. }
                if now.saturating_duration_since(activated_at) >= ACTIVE_SESSION_LIMIT =>
            {
                Self::Passive
            }
            other => other,
        }
    }

    /// Transport loss always ends an active session
    #[must_use]
    pub fn disconnect(self) -> Self {
        Self::Passive
    }

    /// Whether a live session is open
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}
