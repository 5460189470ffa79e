//! TOML configuration file loading
//!
//! Supports `~/.config/wake-relay/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults
//! and environment variables win over anything set here.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct RelayConfigFile {
    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Upstream model provider configuration
    #[serde(default)]
    pub openai: OpenAiFileConfig,

    /// Lighting bridge configuration
    #[serde(default)]
    pub bridge: BridgeFileConfig,

    /// Device ids per zone
    #[serde(default)]
    pub zones: ZonesFileConfig,

    /// Wake phrase configuration
    #[serde(default)]
    pub wake: WakeFileConfig,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Listen port
    pub port: Option<u16>,

    /// Largest accepted passive audio segment in bytes
    pub max_segment_bytes: Option<usize>,
}

/// Upstream model provider configuration
#[derive(Debug, Default, Deserialize)]
pub struct OpenAiFileConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Transcription model (e.g. "whisper-1")
    pub stt_model: Option<String>,
    /// Realtime conversation model
    pub realtime_model: Option<String>,
    /// Stored prompt id attached to realtime sessions
    pub realtime_prompt_id: Option<String>,
    /// Chat model used for color resolution
    pub color_model: Option<String>,
    /// Request timeout for transcription and completion calls
    pub timeout_secs: Option<u64>,
}

/// Lighting bridge configuration
#[derive(Debug, Default, Deserialize)]
pub struct BridgeFileConfig {
    /// Bridge host or IP
    pub address: Option<String>,
    /// Bridge application key
    pub app_key: Option<String>,
    /// Skip certificate validation on the primary transport
    pub insecure: Option<bool>,
    /// Command used for the fallback transport (defaults to `curl`)
    pub fallback_command: Option<String>,
}

/// Device ids per zone
#[derive(Debug, Default, Deserialize)]
pub struct ZonesFileConfig {
    pub bedroom: Option<Vec<String>>,
    pub fireplace: Option<Vec<String>>,
    pub vine: Option<Vec<String>>,
    pub fox: Option<Vec<String>>,
    pub living_room: Option<Vec<String>>,
}

/// Wake phrase configuration
#[derive(Debug, Default, Deserialize)]
pub struct WakeFileConfig {
    /// Accepted spellings of the wake phrase
    pub phrases: Option<Vec<String>>,
}

/// Load the TOML config file from the standard path
///
/// Returns `RelayConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> RelayConfigFile {
    config_file_path().map_or_else(RelayConfigFile::default, |path| load_from(&path))
}

/// Load a TOML config file from an explicit path
///
/// Returns `RelayConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_from(path: &Path) -> RelayConfigFile {
    if !path.exists() {
        return RelayConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                RelayConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            RelayConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/wake-relay/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("wake-relay").join("config.toml"))
}
