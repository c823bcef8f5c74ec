use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present here
/// override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 8000
///   log_level: "debug"
///   tls:
///     enabled: true
///     cert_path: "/etc/ssl/gateway.pem"
///     key_path: "/etc/ssl/gateway.key"
///
/// speech:
///   google_api_key: "your-google-key"
///   language: "nl-NL"
///   sample_rate: 16000
///   timeout_seconds: 10
///
/// channels:
///   conversation_idle_timeout_seconds: 30
///   audio_idle_timeout_seconds: 30
///   max_audio_buffer_bytes: 10485760
///
/// security:
///   cors_allowed_origins: "https://app.example.com"
///   rate_limit_requests_per_second: 60
///   rate_limit_burst_size: 10
///   max_websocket_connections: 500
///   max_connections_per_ip: 100
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub speech: Option<SpeechYaml>,
    pub channels: Option<ChannelsYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub enabled: Option<bool>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Google speech settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SpeechYaml {
    pub google_api_key: Option<String>,
    pub language: Option<String>,
    pub sample_rate: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub tts_base_url: Option<String>,
    pub stt_base_url: Option<String>,
}

/// Streaming channel limits from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ChannelsYaml {
    pub conversation_idle_timeout_seconds: Option<u64>,
    pub audio_idle_timeout_seconds: Option<u64>,
    pub max_audio_buffer_bytes: Option<usize>,
}

/// Security configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    /// CORS allowed origins (comma-separated or "*")
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: Option<u32>,
    pub rate_limit_burst_size: Option<u32>,
    pub max_websocket_connections: Option<usize>,
    pub max_connections_per_ip: Option<u32>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_config_full() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080
  log_level: "debug"
  tls:
    enabled: true
    cert_path: "/certs/cert.pem"
    key_path: "/certs/key.pem"
speech:
  google_api_key: "yaml-key"
  language: "nl-BE"
  sample_rate: 8000
  timeout_seconds: 3
channels:
  conversation_idle_timeout_seconds: 15
  audio_idle_timeout_seconds: 20
  max_audio_buffer_bytes: 4096
security:
  cors_allowed_origins: "*"
  rate_limit_requests_per_second: 100
  max_connections_per_ip: 5
"#;
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        let server = config.server.unwrap();
        assert_eq!(server.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(server.port, Some(8080));
        assert_eq!(server.tls.unwrap().enabled, Some(true));

        let speech = config.speech.unwrap();
        assert_eq!(speech.google_api_key.as_deref(), Some("yaml-key"));
        assert_eq!(speech.sample_rate, Some(8000));

        let channels = config.channels.unwrap();
        assert_eq!(channels.conversation_idle_timeout_seconds, Some(15));
        assert_eq!(channels.max_audio_buffer_bytes, Some(4096));

        let security = config.security.unwrap();
        assert_eq!(security.cors_allowed_origins.as_deref(), Some("*"));
        assert_eq!(security.rate_limit_burst_size, None);
        assert_eq!(security.max_connections_per_ip, Some(5));
    }

    #[test]
    fn test_yaml_config_empty() {
        let config: YamlConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.server.is_none());
        assert!(config.speech.is_none());
        assert!(config.channels.is_none());
        assert!(config.security.is_none());
    }

    #[test]
    fn test_from_file_not_found() {
        let path = PathBuf::from("/nonexistent/config.yaml");
        let result = YamlConfig::from_file(&path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }

    #[test]
    fn test_from_file_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.yaml");

        fs::write(&config_path, "invalid: yaml: content:").unwrap();

        let result = YamlConfig::from_file(&config_path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse YAML")
        );
    }
}
