//! Configuration module for the voice gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Applying YAML overrides on top of the environment
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use dutch_voice_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use zeroize::Zeroizing;

use crate::core::speech::GoogleSpeechConfig;
use crate::core::speech::google::{GOOGLE_STT_BASE_URL, GOOGLE_TTS_BASE_URL};

mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

/// 10 MiB
pub const DEFAULT_MAX_AUDIO_BUFFER_BYTES: usize = 10 * 1024 * 1024;

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Contains all configuration needed to run the gateway:
/// - Server settings (host, port, TLS, log level)
/// - Google speech credentials and recognition settings
/// - Streaming channel limits
/// - Security settings (CORS, rate limiting, connection limits)
#[derive(Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,
    pub tls: Option<TlsConfig>,
    /// Default tracing filter when `RUST_LOG` is not set
    pub log_level: String,

    // Speech settings
    /// Google Cloud API key; speech runs degraded when absent
    pub google_api_key: Option<Zeroizing<String>>,
    pub speech_language: String,
    pub speech_sample_rate: u32,
    pub speech_timeout_seconds: u64,
    pub tts_base_url: String,
    pub stt_base_url: String,

    // Streaming channels
    pub conversation_idle_timeout_seconds: u64,
    pub audio_idle_timeout_seconds: u64,
    pub max_audio_buffer_bytes: usize,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (same-origin only)
    pub cors_allowed_origins: Option<String>,
    /// Maximum requests per second per IP address
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    /// Default: 10
    pub rate_limit_burst_size: u32,
    /// Maximum concurrent WebSocket connections
    /// Default: None (unlimited)
    pub max_websocket_connections: Option<usize>,
    /// Maximum WebSocket connections per IP address
    /// Default: 100
    pub max_connections_per_ip: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            tls: None,
            log_level: "info".to_string(),
            google_api_key: None,
            speech_language: "nl-NL".to_string(),
            speech_sample_rate: 16000,
            speech_timeout_seconds: 10,
            tts_base_url: GOOGLE_TTS_BASE_URL.to_string(),
            stt_base_url: GOOGLE_STT_BASE_URL.to_string(),
            conversation_idle_timeout_seconds: 30,
            audio_idle_timeout_seconds: 30,
            max_audio_buffer_bytes: DEFAULT_MAX_AUDIO_BUFFER_BYTES,
            cors_allowed_origins: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
            max_websocket_connections: None,
            max_connections_per_ip: 100,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("log_level", &self.log_level)
            .field(
                "google_api_key",
                &self.google_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("speech_language", &self.speech_language)
            .field("speech_sample_rate", &self.speech_sample_rate)
            .field("speech_timeout_seconds", &self.speech_timeout_seconds)
            .field("tts_base_url", &self.tts_base_url)
            .field("stt_base_url", &self.stt_base_url)
            .field(
                "conversation_idle_timeout_seconds",
                &self.conversation_idle_timeout_seconds,
            )
            .field("audio_idle_timeout_seconds", &self.audio_idle_timeout_seconds)
            .field("max_audio_buffer_bytes", &self.max_audio_buffer_bytes)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field(
                "rate_limit_requests_per_second",
                &self.rate_limit_requests_per_second,
            )
            .field("rate_limit_burst_size", &self.rate_limit_burst_size)
            .field("max_websocket_connections", &self.max_websocket_connections)
            .field("max_connections_per_ip", &self.max_connections_per_ip)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// `.env` values are expected to be loaded into the process environment
    /// beforehand (see `main.rs`). Missing variables fall back to defaults.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// After loading and merging, performs validation on the final configuration.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    pub fn conversation_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.conversation_idle_timeout_seconds)
    }

    pub fn audio_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.audio_idle_timeout_seconds)
    }

    /// Google client settings, or `None` when no API key is configured
    pub fn google_speech_config(&self) -> Option<GoogleSpeechConfig> {
        let api_key = self.google_api_key.as_ref()?;
        if api_key.trim().is_empty() {
            return None;
        }

        Some(GoogleSpeechConfig {
            api_key: api_key.clone(),
            language: self.speech_language.clone(),
            sample_rate: self.speech_sample_rate,
            timeout: Duration::from_secs(self.speech_timeout_seconds),
            tts_base_url: self.tts_base_url.clone(),
            stt_base_url: self.stt_base_url.clone(),
        })
    }
}
