//! Ephemeral credentials for live sessions
//!
//! The relay never holds a live session itself; it only mints a short-lived
//! client secret so the client can connect to the realtime model directly.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::OpenAiConfig;
use crate::{Error, Result};

/// A short-lived token authorizing one live session
///
/// Opaque apart from `value`; every other field the provider returns
/// (expiry, session echo) is passed through to the client untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EphemeralCredential {
    pub value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EphemeralCredential {
    /// Credential with no provider metadata
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            extra: Map::new(),
        }
    }
}

/// Mints credentials for the live conversational model
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    /// Issue a fresh credential
    ///
    /// # Errors
    ///
    /// Returns error if the provider refuses or cannot be reached
    async fn issue(&self) -> Result<EphemeralCredential>;
}

#[derive(Serialize)]
struct ClientSecretRequest<'a> {
    session: SessionSpec<'a>,
}

#[derive(Serialize)]
struct SessionSpec<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<PromptRef<'a>>,
}

#[derive(Serialize)]
struct PromptRef<'a> {
    id: &'a str,
}

/// Issues realtime client secrets through the `OpenAI` API
pub struct RealtimeCredentials {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    prompt_id: Option<String>,
}

impl RealtimeCredentials {
    /// Create an issuer for the configured realtime model
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.realtime_model.clone(),
            prompt_id: config.realtime_prompt_id.clone(),
        })
    }

    fn request(&self) -> ClientSecretRequest<'_> {
        ClientSecretRequest {
            session: SessionSpec {
                kind: "realtime",
                model: &self.model,
                prompt: self.prompt_id.as_deref().map(|id| PromptRef { id }),
            },
        }
    }
}

#[async_trait]
impl CredentialIssuer for RealtimeCredentials {
    async fn issue(&self) -> Result<EphemeralCredential> {
        let response = self
            .client
            .post(format!("{}/realtime/client_secrets", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.request())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Credential(format!(
                "client secret request failed {status}: {body}"
            )));
        }

        let credential: EphemeralCredential = response.json().await?;
        tracing::debug!(model = %self.model, "issued realtime credential");
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    fn openai_config(prompt_id: Option<&str>) -> OpenAiConfig {
        OpenAiConfig {
            api_key: SecretString::from("sk-test".to_string()),
            base_url: "https://api.openai.com/v1".to_string(),
            stt_model: "whisper-1".to_string(),
            realtime_model: "gpt-realtime".to_string(),
            realtime_prompt_id: prompt_id.map(ToString::to_string),
            color_model: "gpt-4.1".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn request_body_shape() {
        let issuer = RealtimeCredentials::new(&openai_config(Some("pmpt_123"))).unwrap();
        assert_eq!(
            serde_json::to_value(issuer.request()).unwrap(),
            json!({"session": {"type": "realtime", "model": "gpt-realtime", "prompt": {"id": "pmpt_123"}}})
        );

        let issuer = RealtimeCredentials::new(&openai_config(None)).unwrap();
        assert_eq!(
            serde_json::to_value(issuer.request()).unwrap(),
            json!({"session": {"type": "realtime", "model": "gpt-realtime"}})
        );
    }

    #[test]
    fn credential_passes_through_provider_fields() {
        let raw = json!({"value": "ek_abc", "expires_at": 1_700_000_000, "session": {"type": "realtime"}});
        let credential: EphemeralCredential = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(credential.value, "ek_abc");
        assert_eq!(serde_json::to_value(&credential).unwrap(), raw);
    }

    #[test]
    fn credential_requires_value() {
        let result: std::result::Result<EphemeralCredential, _> =
            serde_json::from_value(json!({"expires_at": 1}));
        assert!(result.is_err());
    }
}
