//! Passive voice processing
//!
//! Transcribes client-captured audio segments and decides whether they
//! contain the wake phrase. Live conversation audio never passes through
//! the relay.

mod stt;
mod trigger;
mod wake_word;

pub use stt::{Transcriber, WhisperTranscriber};
pub use trigger::{AudioSegment, TranscriptionResult, TriggerDetector};
pub use wake_word::{DEFAULT_WAKE_PHRASES, WakePhraseMatcher};
