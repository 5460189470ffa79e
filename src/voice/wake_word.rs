//! Wake phrase detection
//!
//! Tests a transcript for any accepted spelling of the wake phrase.
//! Matching is case-insensitive and ignores punctuation, so
//! "Hey, Jeff!" and "hey jeff" are the same utterance.

use std::sync::LazyLock;

use regex::Regex;

/// Accepted spellings of the wake phrase when none are configured
///
/// Transcription tends to attach the name to whatever greeting preceded it,
/// so the vocabulary covers the common lead-ins rather than the bare name.
pub const DEFAULT_WAKE_PHRASES: &[&str] = &[
    "hey jeff",
    "up jeff",
    "okay jeff",
    "doing jeff",
    "yo jeff",
    "man jeff",
    "hi jeff",
    "brother jeff",
];

/// Anything that is neither a word character nor whitespace
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]+").expect("valid regex"));

/// Matches transcripts against a fixed wake phrase vocabulary
#[derive(Debug, Clone)]
pub struct WakePhraseMatcher {
    wake_phrases: Vec<String>,
}

impl WakePhraseMatcher {
    /// Create a matcher for the given phrases
    ///
    /// Phrases are normalized the same way transcripts are.
    #[must_use]
    pub fn new(wake_phrases: &[String]) -> Self {
        let normalized: Vec<String> = wake_phrases
            .iter()
            .map(|w| normalize(w))
            .filter(|w| !w.is_empty())
            .collect();

        tracing::debug!(wake_phrases = ?normalized, "wake phrase matcher initialized");

        Self {
            wake_phrases: normalized,
        }
    }

    /// Check if a transcript contains a wake phrase
    #[must_use]
    pub fn matches(&self, transcript: &str) -> bool {
        let normalized = normalize(transcript);

        if let Some(phrase) = self
            .wake_phrases
            .iter()
            .find(|phrase| normalized.contains(phrase.as_str()))
        {
            tracing::info!(wake_phrase = %phrase, transcript, "wake phrase detected");
            return true;
        }

        false
    }

    /// Get the configured wake phrases (normalized)
    #[must_use]
    pub fn wake_phrases(&self) -> &[String] {
        &self.wake_phrases
    }
}

impl Default for WakePhraseMatcher {
    fn default() -> Self {
        let phrases: Vec<String> = DEFAULT_WAKE_PHRASES.iter().map(ToString::to_string).collect();
        Self::new(&phrases)
    }
}

/// Lowercase, drop punctuation, collapse runs of whitespace
fn normalize(text: &str) -> String {
    PUNCTUATION
        .replace_all(&text.to_lowercase(), "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Hey, Jeff!"), "hey jeff");
        assert_eq!(normalize("  What's   up\tJeff? "), "whats up jeff");
        assert_eq!(normalize("..."), "");
    }

    #[test]
    fn test_wake_phrase_detection() {
        let matcher = WakePhraseMatcher::default();

        assert!(!matcher.matches("hello world"));
        assert!(matcher.matches("Hey Jeff, what's up?"));
        assert!(matcher.matches("What's up, Jeff"));
        assert!(matcher.matches("MY BROTHER JEFF"));
    }

    #[test]
    fn bare_name_is_not_a_wake_phrase() {
        let matcher = WakePhraseMatcher::default();
        assert!(!matcher.matches("Jeff"));
        assert!(!matcher.matches("I told Jeff about it"));
    }

    #[test]
    fn blank_phrases_are_dropped() {
        let matcher = WakePhraseMatcher::new(&["  ".to_string(), "Hey, Orin".to_string()]);
        assert_eq!(matcher.wake_phrases(), &["hey orin"]);
        assert!(matcher.matches("hey orin turn it up"));
    }
}
