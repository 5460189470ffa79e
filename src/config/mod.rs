//! Configuration management for the wake relay
//!
//! Configuration is read once at startup (env > toml > default) into an
//! immutable [`Config`] that is shared behind an `Arc` for the life of the
//! process.

pub mod file;

use std::time::Duration;

use secrecy::SecretString;

use crate::lights::ZoneTable;
use crate::voice::DEFAULT_WAKE_PHRASES;
use crate::{Error, Result};

/// Default listen port
pub const DEFAULT_PORT: u16 = 3000;

/// Largest passive segment the relay will transcribe, matching the client cut-off
pub const DEFAULT_MAX_SEGMENT_BYTES: usize = 200_000;

/// Default upstream API base URL
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Relay configuration
#[derive(Debug)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Upstream model provider configuration
    pub openai: OpenAiConfig,

    /// Lighting bridge configuration
    pub bridge: BridgeConfig,

    /// Device ids per zone
    pub zones: ZoneTable,

    /// Accepted spellings of the wake phrase
    pub wake_phrases: Vec<String>,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Largest accepted passive audio segment in bytes
    pub max_segment_bytes: usize,
}

/// Upstream model provider configuration
#[derive(Debug)]
pub struct OpenAiConfig {
    /// API key (from `OPENAI_API_KEY`)
    pub api_key: SecretString,

    /// API base URL, without trailing slash
    pub base_url: String,

    /// Transcription model
    pub stt_model: String,

    /// Realtime conversation model the issued credentials are scoped to
    pub realtime_model: String,

    /// Stored prompt attached to every realtime session
    pub realtime_prompt_id: Option<String>,

    /// Chat model used by the color resolver
    pub color_model: String,

    /// Request timeout for transcription and completion calls
    pub timeout: Duration,
}

/// Lighting bridge configuration
#[derive(Debug)]
pub struct BridgeConfig {
    /// Bridge host or IP (from `HUE_BRIDGE_IP`)
    pub address: String,

    /// Application key sent as `hue-application-key`
    pub app_key: SecretString,

    /// Skip certificate validation on the primary transport
    pub insecure: bool,

    /// Program used for the fallback transport
    pub fallback_command: String,
}

impl Config {
    /// Load configuration from the environment and the standard config file
    ///
    /// # Errors
    ///
    /// Returns error if a required setting (API key, bridge address) is missing
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed config file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a required setting (API key, bridge address) is missing
    pub fn from_sources(
        fc: file::RelayConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        Self::resolve(fc, env, true)
    }

    /// Load configuration for commands that never reach the lighting bridge
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn load_without_bridge() -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources_without_bridge(fc, |key| std::env::var(key).ok())
    }

    /// Like [`Config::from_sources`], but a missing bridge address is left empty
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn from_sources_without_bridge(
        fc: file::RelayConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        Self::resolve(fc, env, false)
    }

    fn resolve(
        fc: file::RelayConfigFile,
        env: impl Fn(&str) -> Option<String>,
        require_bridge: bool,
    ) -> Result<Self> {
        let server = ServerConfig {
            port: env("WAKE_RELAY_PORT")
                .or_else(|| env("PORT"))
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            max_segment_bytes: fc
                .server
                .max_segment_bytes
                .unwrap_or(DEFAULT_MAX_SEGMENT_BYTES),
        };

        let api_key = env("OPENAI_API_KEY")
            .or(fc.openai.api_key)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("OPENAI_API_KEY is required".to_string()))?;

        let openai = OpenAiConfig {
            api_key: SecretString::from(api_key),
            base_url: env("OPENAI_BASE_URL")
                .or(fc.openai.base_url)
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            stt_model: env("WAKE_RELAY_STT_MODEL")
                .or(fc.openai.stt_model)
                .unwrap_or_else(|| "whisper-1".to_string()),
            realtime_model: env("WAKE_RELAY_REALTIME_MODEL")
                .or(fc.openai.realtime_model)
                .unwrap_or_else(|| "gpt-realtime".to_string()),
            realtime_prompt_id: env("WAKE_RELAY_REALTIME_PROMPT_ID").or(fc.openai.realtime_prompt_id),
            color_model: env("WAKE_RELAY_COLOR_MODEL")
                .or(fc.openai.color_model)
                .unwrap_or_else(|| "gpt-4.1".to_string()),
            timeout: Duration::from_secs(fc.openai.timeout_secs.unwrap_or(30)),
        };

        let address = match env("HUE_BRIDGE_IP")
            .or(fc.bridge.address)
            .filter(|a| !a.is_empty())
        {
            Some(address) => address,
            None if require_bridge => {
                return Err(Error::Config("HUE_BRIDGE_IP is required".to_string()));
            }
            None => String::new(),
        };

        let bridge = BridgeConfig {
            address,
            app_key: SecretString::from(env("HUE_APP_KEY").or(fc.bridge.app_key).unwrap_or_default()),
            insecure: env("HUE_BRIDGE_INSECURE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .or(fc.bridge.insecure)
                .unwrap_or(false),
            fallback_command: fc.bridge.fallback_command.unwrap_or_else(|| "curl".to_string()),
        };

        let zones = ZoneTable {
            bedroom: zone_ids(
                &env,
                &["HUE_BEDROOM_LIGHT_1_ID", "HUE_BEDROOM_LIGHT_2_ID"],
                fc.zones.bedroom,
            ),
            fireplace: zone_ids(&env, &["HUE_FIREPLACE_LIGHT_ID"], fc.zones.fireplace),
            vine: zone_ids(&env, &["HUE_VINE_LIGHT_ID"], fc.zones.vine),
            fox: zone_ids(&env, &["HUE_FOX_LIGHT_ID"], fc.zones.fox),
            living_room: zone_ids(&env, &["HUE_LIVING_ROOM_LIGHT_ID"], fc.zones.living_room),
        };

        for (zone, ids) in zones.iter() {
            if ids.is_empty() {
                tracing::warn!(zone = %zone, "no device ids configured for zone");
            }
        }

        let wake_phrases = env("WAKE_RELAY_WAKE_PHRASES")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
            })
            .or(fc.wake.phrases)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_WAKE_PHRASES.iter().map(ToString::to_string).collect());

        Ok(Self {
            server,
            openai,
            bridge,
            zones,
            wake_phrases,
        })
    }
}

/// Collect device ids for a zone: env vars if any are set, otherwise the file list
fn zone_ids(
    env: &impl Fn(&str) -> Option<String>,
    keys: &[&str],
    file_ids: Option<Vec<String>>,
) -> Vec<String> {
    let from_env: Vec<String> = keys
        .iter()
        .filter_map(|k| env(*k))
        .filter(|id| !id.is_empty())
        .collect();

    if from_env.is_empty() {
        file_ids.unwrap_or_default()
    } else {
        from_env
    }
}
