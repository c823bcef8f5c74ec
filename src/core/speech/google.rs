//! Google Cloud Text-to-Speech and Speech-to-Text over the REST API.
//!
//! # API Reference
//!
//! - Synthesis: `POST {tts_base_url}/v1/text:synthesize?key=...` (MP3 output)
//! - Recognition: `POST {stt_base_url}/v1/speech:recognize?key=...` (LINEAR16 input)
//!
//! Both calls send audio as base64 inside the JSON body.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zeroize::Zeroizing;

use super::base::{SpeechError, SpeechResult, SpeechService, Transcription, VoiceProfileSettings};
use crate::core::dialogue::Persona;

pub const GOOGLE_TTS_BASE_URL: &str = "https://texttospeech.googleapis.com";
pub const GOOGLE_STT_BASE_URL: &str = "https://speech.googleapis.com";

/// Settings for [`GoogleSpeechClient`]
#[derive(Clone)]
pub struct GoogleSpeechConfig {
    pub api_key: Zeroizing<String>,
    /// BCP-47 language code
    pub language: String,
    /// Sample rate of incoming PCM audio
    pub sample_rate: u32,
    pub timeout: Duration,
    pub tts_base_url: String,
    pub stt_base_url: String,
}

impl std::fmt::Debug for GoogleSpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSpeechConfig")
            .field("api_key", &"[REDACTED]")
            .field("language", &self.language)
            .field("sample_rate", &self.sample_rate)
            .field("timeout", &self.timeout)
            .field("tts_base_url", &self.tts_base_url)
            .field("stt_base_url", &self.stt_base_url)
            .finish()
    }
}

impl GoogleSpeechConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Zeroizing::new(api_key.into()),
            language: "nl-NL".to_string(),
            sample_rate: 16000,
            timeout: Duration::from_secs(10),
            tts_base_url: GOOGLE_TTS_BASE_URL.to_string(),
            stt_base_url: GOOGLE_STT_BASE_URL.to_string(),
        }
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: SynthesisAudioConfig,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisAudioConfig {
    audio_encoding: &'static str,
    pitch: f32,
    speaking_rate: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

#[derive(Serialize)]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: &'a str,
    enable_automatic_punctuation: bool,
}

#[derive(Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Deserialize, Default)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Deserialize)]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    confidence: f32,
}

// =============================================================================
// Client
// =============================================================================

/// REST client for Google Cloud speech services
pub struct GoogleSpeechClient {
    config: GoogleSpeechConfig,
    http: reqwest::Client,
}

impl GoogleSpeechClient {
    pub fn new(config: GoogleSpeechConfig) -> SpeechResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(SpeechError::NotConfigured);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(5)))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| SpeechError::Request(format!("Failed to create HTTP client: {e}")))?;

        info!(
            language = %config.language,
            sample_rate = config.sample_rate,
            "Google speech client initialized"
        );

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GoogleSpeechConfig {
        &self.config
    }

    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        url: String,
        body: &B,
    ) -> SpeechResult<R> {
        let response = self
            .http
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| SpeechError::Request(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SpeechError::Provider { status, message });
        }

        response
            .json()
            .await
            .map_err(|e| SpeechError::Decode(e.without_url().to_string()))
    }
}

#[async_trait]
impl SpeechService for GoogleSpeechClient {
    async fn synthesize(&self, text: &str, persona: Persona) -> SpeechResult<Bytes> {
        let profile = VoiceProfileSettings::for_persona(persona);
        let request = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &self.config.language,
                name: profile.voice_name(&self.config.language),
            },
            audio_config: SynthesisAudioConfig {
                audio_encoding: "MP3",
                pitch: profile.pitch,
                speaking_rate: profile.speaking_rate,
            },
        };

        let url = format!(
            "{}/v1/text:synthesize",
            self.config.tts_base_url.trim_end_matches('/')
        );
        let response: SynthesizeResponse = self.post_json(url, &request).await?;

        let audio = BASE64
            .decode(response.audio_content.as_bytes())
            .map_err(|e| SpeechError::Decode(format!("Base64 decode error: {e}")))?;

        info!(bytes = audio.len(), voice_profile = %persona, "Speech synthesized");
        Ok(Bytes::from(audio))
    }

    async fn transcribe(&self, audio: &[u8]) -> SpeechResult<Transcription> {
        let request = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: self.config.sample_rate,
                language_code: &self.config.language,
                enable_automatic_punctuation: true,
            },
            audio: RecognitionAudio {
                content: BASE64.encode(audio),
            },
        };

        let url = format!(
            "{}/v1/speech:recognize",
            self.config.stt_base_url.trim_end_matches('/')
        );
        let response: RecognizeResponse = self.post_json(url, &request).await?;

        let best = response
            .results
            .into_iter()
            .next()
            .and_then(|result| result.alternatives.into_iter().next());

        match best {
            Some(alternative) => {
                info!(
                    chars = alternative.transcript.chars().count(),
                    confidence = alternative.confidence,
                    "Audio transcribed"
                );
                debug!(transcript = %alternative.transcript, "Recognized text");
                Ok(Transcription {
                    text: alternative.transcript,
                    confidence: alternative.confidence.clamp(0.0, 1.0),
                })
            }
            None => {
                debug!(bytes = audio.len(), "No speech recognized");
                Ok(Transcription {
                    text: String::new(),
                    confidence: 0.0,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_is_rejected() {
        let err = GoogleSpeechClient::new(GoogleSpeechConfig::new("  ")).err();
        assert!(matches!(err, Some(SpeechError::NotConfigured)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = GoogleSpeechConfig::new("super-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_synthesize_request_shape() {
        let profile = VoiceProfileSettings::for_persona(Persona::Lifestyle);
        let request = SynthesizeRequest {
            input: SynthesisInput { text: "Hallo" },
            voice: VoiceSelection {
                language_code: "nl-NL",
                name: profile.voice_name("nl-NL"),
            },
            audio_config: SynthesisAudioConfig {
                audio_encoding: "MP3",
                pitch: profile.pitch,
                speaking_rate: profile.speaking_rate,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input"]["text"], "Hallo");
        assert_eq!(json["voice"]["languageCode"], "nl-NL");
        assert_eq!(json["voice"]["name"], "nl-NL-Neural2-F");
        assert_eq!(json["audioConfig"]["audioEncoding"], "MP3");
        assert!((json["audioConfig"]["speakingRate"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_recognize_request_shape() {
        let request = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: 16000,
                language_code: "nl-NL",
                enable_automatic_punctuation: true,
            },
            audio: RecognitionAudio {
                content: BASE64.encode([0u8, 1, 2]),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["config"]["sampleRateHertz"], 16000);
        assert_eq!(json["config"]["enableAutomaticPunctuation"], true);
        assert_eq!(json["audio"]["content"], "AAEC");
    }

    #[test]
    fn test_recognize_response_tolerates_missing_fields() {
        let parsed: RecognizeResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.results.is_empty());

        let parsed: RecognizeResponse =
            serde_json::from_str(r#"{"results":[{"alternatives":[{"transcript":"hoi"}]}]}"#)
                .unwrap();
        assert_eq!(parsed.results[0].alternatives[0].transcript, "hoi");
        assert_eq!(parsed.results[0].alternatives[0].confidence, 0.0);
    }
}
