//! Speech-to-text (STT) collaborator

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::config::OpenAiConfig;
use crate::{Error, Result};

/// Turns one audio segment into text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe WAV audio bytes
    ///
    /// # Errors
    ///
    /// Returns error if the transcription service fails or times out
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Response from the Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Transcribes speech through the `OpenAI` Whisper endpoint
pub struct WhisperTranscriber {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    /// Vocabulary hint that biases recognition toward the wake phrases
    prompt: String,
}

impl WhisperTranscriber {
    /// Create a transcriber biased toward the given wake phrases
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be built
    pub fn new(config: &OpenAiConfig, wake_phrases: &[String]) -> Result<Self> {
        if config.api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.stt_model.clone(),
            prompt: wake_phrase_prompt(wake_phrases),
        })
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting Whisper transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("language", "en")
            .text("prompt", self.prompt.clone());

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse response");
            e
        })?;

        tracing::debug!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }
}

/// Build the recognition hint from the wake phrase vocabulary
///
/// `"hey jeff"` becomes `"Hey Jeff"` so the model sees the name capitalized.
fn wake_phrase_prompt(wake_phrases: &[String]) -> String {
    wake_phrases
        .iter()
        .map(|phrase| {
            phrase
                .split_whitespace()
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
