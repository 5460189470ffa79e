//! Trigger detection for passive audio segments
//!
//! Each segment is transcribed once and tested for the wake phrase. Failures
//! are logged and dropped: the client keeps sending segments, so a missed
//! trigger corrects itself on the next utterance.

use std::sync::Arc;

use bytes::Bytes;

use super::{Transcriber, WakePhraseMatcher};

/// One bounded utterance captured by the client (WAV bytes)
#[derive(Debug, Clone)]
pub struct AudioSegment(Bytes);

impl AudioSegment {
    /// Wrap raw audio bytes
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Raw audio bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the segment carries no audio
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome of evaluating one segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionResult {
    /// Text heard in the segment; empty when transcription failed
    pub transcript: String,
    /// Whether the transcript contains a wake phrase
    pub triggered: bool,
}

impl TranscriptionResult {
    /// The result reported for any segment that could not be evaluated
    #[must_use]
    pub const fn silent() -> Self {
        Self {
            transcript: String::new(),
            triggered: false,
        }
    }
}

/// Decides whether a passive segment should activate a live session
pub struct TriggerDetector {
    transcriber: Arc<dyn Transcriber>,
    matcher: WakePhraseMatcher,
    max_segment_bytes: usize,
}

impl TriggerDetector {
    /// Create a detector over a transcription collaborator
    #[must_use]
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        matcher: WakePhraseMatcher,
        max_segment_bytes: usize,
    ) -> Self {
        Self {
            transcriber,
            matcher,
            max_segment_bytes,
        }
    }

    /// Transcribe a segment and test it for the wake phrase
    ///
    /// Never fails: empty, oversized, or untranscribable segments yield
    /// [`TranscriptionResult::silent`].
    pub async fn evaluate(&self, segment: &AudioSegment) -> TranscriptionResult {
        if segment.is_empty() {
            tracing::debug!("dropping empty audio segment");
            return TranscriptionResult::silent();
        }

        if segment.len() > self.max_segment_bytes {
            tracing::debug!(
                bytes = segment.len(),
                limit = self.max_segment_bytes,
                "dropping oversized audio segment"
            );
            return TranscriptionResult::silent();
        }

        match self.transcriber.transcribe(segment.as_bytes()).await {
            Ok(transcript) => {
                let triggered = self.matcher.matches(&transcript);
                tracing::debug!(%transcript, triggered, "passive segment evaluated");
                TranscriptionResult {
                    transcript,
                    triggered,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, bytes = segment.len(), "transcription failed, dropping segment");
                TranscriptionResult::silent()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{Error, Result};

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl Transcriber for Fixed {
        async fn transcribe(&self, _audio: &[u8]) -> Result<String> {
            self.0
                .map(ToString::to_string)
                .ok_or_else(|| Error::Stt("unavailable".to_string()))
        }
    }

    fn detector(reply: Option<&'static str>) -> TriggerDetector {
        TriggerDetector::new(Arc::new(Fixed(reply)), WakePhraseMatcher::default(), 1024)
    }

    #[tokio::test]
    async fn wake_phrase_activates() {
        let result = detector(Some("Hey Jeff, turn on the lights."))
            .evaluate(&AudioSegment::new(vec![1u8; 16]))
            .await;
        assert!(result.triggered);
        assert_eq!(result.transcript, "Hey Jeff, turn on the lights.");
    }

    #[tokio::test]
    async fn ordinary_speech_does_not_activate() {
        let result = detector(Some("turn on the lights"))
            .evaluate(&AudioSegment::new(vec![1u8; 16]))
            .await;
        assert!(!result.triggered);
        assert_eq!(result.transcript, "turn on the lights");
    }

    #[tokio::test]
    async fn transcription_failure_is_silent() {
        let result = detector(None)
            .evaluate(&AudioSegment::new(vec![1u8; 16]))
            .await;
        assert_eq!(result, TranscriptionResult::silent());
    }

    #[tokio::test]
    async fn oversized_and_empty_segments_skip_transcription() {
        let detector = detector(Some("hey jeff"));
        assert_eq!(
            detector.evaluate(&AudioSegment::new(vec![0u8; 2048])).await,
            TranscriptionResult::silent()
        );
        assert_eq!(
            detector.evaluate(&AudioSegment::new(Vec::<u8>::new())).await,
            TranscriptionResult::silent()
        );
    }
}
