use super::ServerConfig;

/// Check the merged configuration for values the server cannot run with.
pub(super) fn validate(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.port == 0 {
        return Err("PORT must be greater than 0".into());
    }

    if let Some(tls) = &config.tls
        && (tls.cert_path.as_os_str().is_empty() || tls.key_path.as_os_str().is_empty())
    {
        return Err("TLS requires both a certificate path and a key path".into());
    }

    validate_non_zero(
        "CONVERSATION_IDLE_TIMEOUT_SECONDS",
        config.conversation_idle_timeout_seconds,
    )?;
    validate_non_zero(
        "AUDIO_IDLE_TIMEOUT_SECONDS",
        config.audio_idle_timeout_seconds,
    )?;
    validate_non_zero("SPEECH_TIMEOUT_SECONDS", config.speech_timeout_seconds)?;

    if config.max_audio_buffer_bytes == 0 {
        return Err("MAX_AUDIO_BUFFER_BYTES must be greater than 0".into());
    }
    if config.speech_sample_rate == 0 {
        return Err("SPEECH_SAMPLE_RATE must be greater than 0".into());
    }
    if config.rate_limit_requests_per_second == 0 || config.rate_limit_burst_size == 0 {
        return Err("Rate limit values must be greater than 0".into());
    }
    if config.max_websocket_connections == Some(0) {
        return Err("MAX_WEBSOCKET_CONNECTIONS must be greater than 0 when set".into());
    }

    Ok(())
}

fn validate_non_zero(name: &str, value: u64) -> Result<(), Box<dyn std::error::Error>> {
    if value == 0 {
        return Err(format!("{name} must be greater than 0").into());
    }
    Ok(())
}
