use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use zeroize::Zeroizing;

use super::{ServerConfig, TlsConfig};

/// Read an optional variable; empty values count as unset.
fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Parse a variable, or return `default` when it is unset.
fn parse_var<T>(name: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("Invalid value for {name} ('{raw}'): {e}")),
        None => Ok(default),
    }
}

fn parse_optional_var<T>(name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_var(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| format!("Invalid value for {name} ('{raw}'): {e}"))
        })
        .transpose()
}

fn parse_bool_var(name: &str) -> Result<bool, String> {
    match optional_var(name).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => Err(format!("Invalid boolean for {name}: '{v}'")),
    }
}

/// Build a configuration from the process environment on top of defaults.
pub(super) fn load_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let defaults = ServerConfig::default();

    let tls = if parse_bool_var("TLS_ENABLED")? {
        let cert_path = optional_var("TLS_CERT_PATH")
            .ok_or("TLS_ENABLED is set but TLS_CERT_PATH is missing")?;
        let key_path = optional_var("TLS_KEY_PATH")
            .ok_or("TLS_ENABLED is set but TLS_KEY_PATH is missing")?;
        Some(TlsConfig {
            cert_path: PathBuf::from(cert_path),
            key_path: PathBuf::from(key_path),
        })
    } else {
        None
    };

    Ok(ServerConfig {
        host: optional_var("HOST").unwrap_or(defaults.host),
        port: parse_var("PORT", defaults.port)?,
        tls,
        log_level: optional_var("LOG_LEVEL").unwrap_or(defaults.log_level),

        google_api_key: optional_var("GOOGLE_API_KEY").map(Zeroizing::new),
        speech_language: optional_var("SPEECH_LANGUAGE").unwrap_or(defaults.speech_language),
        speech_sample_rate: parse_var("SPEECH_SAMPLE_RATE", defaults.speech_sample_rate)?,
        speech_timeout_seconds: parse_var(
            "SPEECH_TIMEOUT_SECONDS",
            defaults.speech_timeout_seconds,
        )?,
        tts_base_url: optional_var("GOOGLE_TTS_BASE_URL").unwrap_or(defaults.tts_base_url),
        stt_base_url: optional_var("GOOGLE_STT_BASE_URL").unwrap_or(defaults.stt_base_url),

        conversation_idle_timeout_seconds: parse_var(
            "CONVERSATION_IDLE_TIMEOUT_SECONDS",
            defaults.conversation_idle_timeout_seconds,
        )?,
        audio_idle_timeout_seconds: parse_var(
            "AUDIO_IDLE_TIMEOUT_SECONDS",
            defaults.audio_idle_timeout_seconds,
        )?,
        max_audio_buffer_bytes: parse_var(
            "MAX_AUDIO_BUFFER_BYTES",
            defaults.max_audio_buffer_bytes,
        )?,

        cors_allowed_origins: optional_var("CORS_ALLOWED_ORIGINS"),
        rate_limit_requests_per_second: parse_var(
            "RATE_LIMIT_REQUESTS_PER_SECOND",
            defaults.rate_limit_requests_per_second,
        )?,
        rate_limit_burst_size: parse_var("RATE_LIMIT_BURST_SIZE", defaults.rate_limit_burst_size)?,
        max_websocket_connections: parse_optional_var("MAX_WEBSOCKET_CONNECTIONS")?,
        max_connections_per_ip: parse_var(
            "MAX_CONNECTIONS_PER_IP",
            defaults.max_connections_per_ip,
        )?,
    })
}
