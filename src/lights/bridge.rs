//! Lighting bridge actuation
//!
//! State changes go to the bridge as `PUT /clip/v2/resource/light/{id}`.
//! Local bridges serve self-signed certificates, so when the primary HTTP
//! transport fails the same request is handed to a command-line client that
//! skips certificate validation. That second attempt is spawned and never
//! awaited: the bridge gives no useful synchronous confirmation, and callers
//! are told the actuation was issued either way.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::process::Command;

use super::Chromaticity;
use crate::config::BridgeConfig;
use crate::{Error, Result};

/// Header carrying the bridge application key
const APP_KEY_HEADER: &str = "hue-application-key";

/// Upper bound on a single fallback invocation
const FALLBACK_TIMEOUT: Duration = Duration::from_secs(15);

/// Body of a light state update
///
/// Serializes to the bridge's nested shape, e.g. `{"on":{"on":true}}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LightPayload {
    On(OnState),
    Dimming(DimmingState),
    Color(ColorState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OnState {
    pub on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DimmingState {
    pub brightness: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorState {
    pub xy: Chromaticity,
}

impl LightPayload {
    /// Switch a light on or off
    #[must_use]
    pub const fn power(on: bool) -> Self {
        Self::On(OnState { on })
    }

    /// Set brightness as a percentage (clamped to 100)
    #[must_use]
    pub fn brightness(percent: u8) -> Self {
        Self::Dimming(DimmingState {
            brightness: percent.min(100),
        })
    }

    /// Set color by chromaticity coordinates
    #[must_use]
    pub const fn color(xy: Chromaticity) -> Self {
        Self::Color(ColorState { xy })
    }
}

/// Bridge resource path for a light
#[must_use]
pub fn resource_path(device_id: &str) -> String {
    format!("resource/light/{device_id}")
}

/// One way of delivering a state update to the bridge
#[async_trait]
pub trait BridgeTransport: Send + Sync {
    /// Send `PUT {path}` with a JSON body
    ///
    /// # Errors
    ///
    /// Returns error if the request could not be delivered
    async fn put(&self, path: &str, payload: &LightPayload) -> Result<()>;
}

/// Primary transport: HTTPS through `reqwest`
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    app_key: SecretString,
}

impl HttpTransport {
    /// Create a transport for the configured bridge
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: bridge_base_url(&config.address),
            app_key: config.app_key.clone(),
        })
    }
}

#[async_trait]
impl BridgeTransport for HttpTransport {
    async fn put(&self, path: &str, payload: &LightPayload) -> Result<()> {
        let url = format!("{}/{path}", self.base_url);

        let response = self
            .client
            .put(&url)
            .header(APP_KEY_HEADER, self.app_key.expose_secret())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(%url, "bridge state updated");
        } else {
            // Delivered but refused; not retried on the fallback
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%url, status = %status, body = %body, "bridge rejected state update");
        }

        Ok(())
    }
}

/// Fallback transport: an external `curl -k` invocation
pub struct CurlTransport {
    program: String,
    base_url: String,
    app_key: SecretString,
}

impl CurlTransport {
    /// Create a fallback transport for the configured bridge
    #[must_use]
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            program: config.fallback_command.clone(),
            base_url: bridge_base_url(&config.address),
            app_key: config.app_key.clone(),
        }
    }

    /// Arguments for one invocation
    fn args(&self, path: &str, body: &str) -> Vec<String> {
        vec![
            "-k".to_string(),
            "-s".to_string(),
            "-X".to_string(),
            "PUT".to_string(),
            format!("{}/{path}", self.base_url),
            "-H".to_string(),
            format!("{APP_KEY_HEADER}: {}", self.app_key.expose_secret()),
            "-H".to_string(),
            "Content-Type: application/json".to_string(),
            "-d".to_string(),
            body.to_string(),
        ]
    }
}

#[async_trait]
impl BridgeTransport for CurlTransport {
    async fn put(&self, path: &str, payload: &LightPayload) -> Result<()> {
        let body = serde_json::to_string(payload)?;

        let child = Command::new(&self.program)
            .args(self.args(path, &body))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Bridge(format!("failed to spawn {}: {e}", self.program)))?;

        let output = tokio::time::timeout(FALLBACK_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| Error::Bridge(format!("{} timed out", self.program)))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Bridge(format!(
                "{} exited with {}: {stderr}",
                self.program, output.status
            )));
        }

        tracing::debug!(path, "bridge state updated via fallback");
        Ok(())
    }
}

/// Issues light state changes with a best-effort fallback
#[derive(Clone)]
pub struct DeviceActuator {
    primary: Arc<dyn BridgeTransport>,
    fallback: Arc<dyn BridgeTransport>,
}

impl DeviceActuator {
    /// Create an actuator from a primary and a fallback transport
    #[must_use]
    pub fn new(primary: Arc<dyn BridgeTransport>, fallback: Arc<dyn BridgeTransport>) -> Self {
        Self { primary, fallback }
    }

    /// Create the standard HTTPS + `curl` actuator for a bridge
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(HttpTransport::new(config)?),
            Arc::new(CurlTransport::new(config)),
        ))
    }

    /// Apply a state change to one light
    ///
    /// Always returns `true` once the attempt is issued. When the primary
    /// transport fails, the fallback is spawned in the background and its
    /// outcome is only logged.
    pub async fn actuate(&self, device_id: &str, payload: LightPayload) -> bool {
        let path = resource_path(device_id);

        if let Err(e) = self.primary.put(&path, &payload).await {
            tracing::warn!(
                device_id,
                error = %e,
                "primary bridge transport failed, spawning fallback"
            );

            let fallback = Arc::clone(&self.fallback);
            let device_id = device_id.to_string();
            tokio::spawn(async move {
                if let Err(e) = fallback.put(&path, &payload).await {
                    tracing::error!(device_id = %device_id, error = %e, "fallback bridge transport failed");
                }
            });
        }

        true
    }
}

fn bridge_base_url(address: &str) -> String {
    let address = address.trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        format!("{address}/clip/v2")
    } else {
        format!("https://{address}/clip/v2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge_config() -> BridgeConfig {
        BridgeConfig {
            address: "192.168.1.20".to_string(),
            app_key: SecretString::from("app-key".to_string()),
            insecure: false,
            fallback_command: "curl".to_string(),
        }
    }

    #[test]
    fn payload_shapes() {
        assert_eq!(
            serde_json::to_value(LightPayload::power(true)).unwrap(),
            serde_json::json!({"on": {"on": true}})
        );
        assert_eq!(
            serde_json::to_value(LightPayload::brightness(40)).unwrap(),
            serde_json::json!({"dimming": {"brightness": 40}})
        );
        assert_eq!(
            serde_json::to_value(LightPayload::color(Chromaticity { x: 0.64, y: 0.33 })).unwrap(),
            serde_json::json!({"color": {"xy": {"x": 0.64, "y": 0.33}}})
        );
    }

    #[test]
    fn brightness_is_clamped() {
        assert_eq!(LightPayload::brightness(250), LightPayload::brightness(100));
    }

    #[test]
    fn base_url_defaults_to_https() {
        assert_eq!(bridge_base_url("10.0.0.2"), "https://10.0.0.2/clip/v2");
        assert_eq!(bridge_base_url("http://localhost:8080/"), "http://localhost:8080/clip/v2");
    }

    #[test]
    fn curl_arguments_skip_certificate_checks() {
        let curl = CurlTransport::new(&bridge_config());
        let args = curl.args(&resource_path("abc"), r#"{"on":{"on":false}}"#);

        assert_eq!(args[0], "-k");
        assert!(args.contains(&"https://192.168.1.20/clip/v2/resource/light/abc".to_string()));
        assert!(args.contains(&"hue-application-key: app-key".to_string()));
        assert_eq!(args.last().map(String::as_str), Some(r#"{"on":{"on":false}}"#));
    }
}
