use std::path::PathBuf;

use zeroize::Zeroizing;

use super::yaml::YamlConfig;
use super::{ServerConfig, TlsConfig, env};

/// Environment configuration with optional YAML overrides applied on top.
pub(super) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = env::load_from_env()?;

    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(log_level) = server.log_level {
            config.log_level = log_level;
        }
        if let Some(tls) = server.tls {
            match tls.enabled {
                Some(false) => config.tls = None,
                Some(true) => {
                    let cert_path = tls
                        .cert_path
                        .map(PathBuf::from)
                        .or_else(|| config.tls.as_ref().map(|t| t.cert_path.clone()))
                        .ok_or("server.tls.enabled is true but cert_path is missing")?;
                    let key_path = tls
                        .key_path
                        .map(PathBuf::from)
                        .or_else(|| config.tls.as_ref().map(|t| t.key_path.clone()))
                        .ok_or("server.tls.enabled is true but key_path is missing")?;
                    config.tls = Some(TlsConfig {
                        cert_path,
                        key_path,
                    });
                }
                None => {}
            }
        }
    }

    if let Some(speech) = yaml.speech {
        if let Some(key) = speech.google_api_key.filter(|k| !k.trim().is_empty()) {
            config.google_api_key = Some(Zeroizing::new(key));
        }
        if let Some(language) = speech.language {
            config.speech_language = language;
        }
        if let Some(sample_rate) = speech.sample_rate {
            config.speech_sample_rate = sample_rate;
        }
        if let Some(timeout) = speech.timeout_seconds {
            config.speech_timeout_seconds = timeout;
        }
        if let Some(url) = speech.tts_base_url {
            config.tts_base_url = url;
        }
        if let Some(url) = speech.stt_base_url {
            config.stt_base_url = url;
        }
    }

    if let Some(channels) = yaml.channels {
        if let Some(seconds) = channels.conversation_idle_timeout_seconds {
            config.conversation_idle_timeout_seconds = seconds;
        }
        if let Some(seconds) = channels.audio_idle_timeout_seconds {
            config.audio_idle_timeout_seconds = seconds;
        }
        if let Some(bytes) = channels.max_audio_buffer_bytes {
            config.max_audio_buffer_bytes = bytes;
        }
    }

    if let Some(security) = yaml.security {
        if security.cors_allowed_origins.is_some() {
            config.cors_allowed_origins = security.cors_allowed_origins;
        }
        if let Some(rps) = security.rate_limit_requests_per_second {
            config.rate_limit_requests_per_second = rps;
        }
        if let Some(burst) = security.rate_limit_burst_size {
            config.rate_limit_burst_size = burst;
        }
        if security.max_websocket_connections.is_some() {
            config.max_websocket_connections = security.max_websocket_connections;
        }
        if let Some(per_ip) = security.max_connections_per_ip {
            config.max_connections_per_ip = per_ip;
        }
    }

    Ok(config)
}
