//! Speech access with graceful degradation.
//!
//! When no backend is configured, or the backend fails, callers still get a
//! usable result: empty audio for synthesis and a fixed stand-in transcription.
//! Every outcome carries a `degraded` flag so the HTTP layer can surface it.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::warn;

use super::base::{SpeechService, Transcription};
use crate::core::dialogue::Persona;

/// Text returned when transcription is unavailable
pub const STAND_IN_TRANSCRIPT: &str = "Simulated transcription";

/// Confidence reported with [`STAND_IN_TRANSCRIPT`]
pub const STAND_IN_CONFIDENCE: f32 = 0.95;

/// Synthesis result
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOutcome {
    pub audio: Bytes,
    pub degraded: bool,
}

/// Transcription result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionOutcome {
    pub text: String,
    pub confidence: f32,
    pub degraded: bool,
}

/// Front for the optional speech backend
#[derive(Clone, Default)]
pub struct SpeechGateway {
    backend: Option<Arc<dyn SpeechService>>,
}

impl std::fmt::Debug for SpeechGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechGateway")
            .field("configured", &self.backend.is_some())
            .finish()
    }
}

impl SpeechGateway {
    pub fn new(backend: Arc<dyn SpeechService>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Gateway that always answers with stand-in output
    pub fn unconfigured() -> Self {
        Self { backend: None }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn synthesize(&self, text: &str, persona: Persona) -> SynthesisOutcome {
        let Some(backend) = &self.backend else {
            warn!("Speech synthesis unavailable, returning empty audio");
            return SynthesisOutcome {
                audio: Bytes::new(),
                degraded: true,
            };
        };

        match backend.synthesize(text, persona).await {
            Ok(audio) => SynthesisOutcome {
                audio,
                degraded: false,
            },
            Err(e) => {
                warn!(
                    error = %e,
                    voice_profile = %persona,
                    "Speech synthesis failed, returning empty audio"
                );
                SynthesisOutcome {
                    audio: Bytes::new(),
                    degraded: true,
                }
            }
        }
    }

    pub async fn transcribe(&self, audio: &[u8]) -> TranscriptionOutcome {
        let Some(backend) = &self.backend else {
            warn!("Speech recognition unavailable, returning stand-in transcription");
            return Self::stand_in();
        };

        match backend.transcribe(audio).await {
            Ok(Transcription { text, confidence }) => TranscriptionOutcome {
                text,
                confidence,
                degraded: false,
            },
            Err(e) => {
                warn!(
                    error = %e,
                    bytes = audio.len(),
                    "Speech recognition failed, returning stand-in transcription"
                );
                Self::stand_in()
            }
        }
    }

    fn stand_in() -> TranscriptionOutcome {
        TranscriptionOutcome {
            text: STAND_IN_TRANSCRIPT.to_string(),
            confidence: STAND_IN_CONFIDENCE,
            degraded: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::speech::{SpeechError, SpeechResult};
    use async_trait::async_trait;

    struct FixedSpeech;

    #[async_trait]
    impl SpeechService for FixedSpeech {
        async fn synthesize(&self, text: &str, _persona: Persona) -> SpeechResult<Bytes> {
            Ok(Bytes::from(text.as_bytes().to_vec()))
        }

        async fn transcribe(&self, _audio: &[u8]) -> SpeechResult<Transcription> {
            Ok(Transcription {
                text: "goedemorgen".to_string(),
                confidence: 0.81,
            })
        }
    }

    struct BrokenSpeech;

    #[async_trait]
    impl SpeechService for BrokenSpeech {
        async fn synthesize(&self, _text: &str, _persona: Persona) -> SpeechResult<Bytes> {
            Err(SpeechError::Request("connection refused".to_string()))
        }

        async fn transcribe(&self, _audio: &[u8]) -> SpeechResult<Transcription> {
            Err(SpeechError::Provider {
                status: 500,
                message: "internal".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_unconfigured_gateway_degrades() {
        let gateway = SpeechGateway::unconfigured();
        assert!(!gateway.is_configured());

        let synthesis = gateway.synthesize("Hallo", Persona::Lifestyle).await;
        assert!(synthesis.audio.is_empty());
        assert!(synthesis.degraded);

        let transcription = gateway.transcribe(&[0, 0, 1, 1]).await;
        assert_eq!(transcription.text, STAND_IN_TRANSCRIPT);
        assert_eq!(transcription.confidence, STAND_IN_CONFIDENCE);
        assert!(transcription.degraded);
    }

    #[tokio::test]
    async fn test_backend_failure_degrades() {
        let gateway = SpeechGateway::new(Arc::new(BrokenSpeech));

        let synthesis = gateway.synthesize("Hallo", Persona::Business).await;
        assert!(synthesis.audio.is_empty());
        assert!(synthesis.degraded);

        let transcription = gateway.transcribe(b"pcm").await;
        assert_eq!(transcription.text, STAND_IN_TRANSCRIPT);
        assert!(transcription.degraded);
    }

    #[tokio::test]
    async fn test_backend_results_pass_through() {
        let gateway = SpeechGateway::new(Arc::new(FixedSpeech));

        let synthesis = gateway.synthesize("Hallo", Persona::Business).await;
        assert_eq!(synthesis.audio, Bytes::from_static(b"Hallo"));
        assert!(!synthesis.degraded);

        let transcription = gateway.transcribe(b"pcm").await;
        assert_eq!(transcription.text, "goedemorgen");
        assert_eq!(transcription.confidence, 0.81);
        assert!(!transcription.degraded);
    }
}
