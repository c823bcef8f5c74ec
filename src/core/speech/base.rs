use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::core::dialogue::Persona;

/// Errors from a speech backend
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech service not configured")]
    NotConfigured,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Provider error {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Failed to decode provider response: {0}")]
    Decode(String),
}

pub type SpeechResult<T> = Result<T, SpeechError>;

/// Recognized text with the recognizer's confidence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcription {
    pub text: String,
    pub confidence: f32,
}

/// Synthesized voice gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoiceGender {
    Female,
    Male,
}

/// Voice settings used when synthesizing for a persona
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceProfileSettings {
    pub gender: VoiceGender,
    pub pitch: f32,
    pub speaking_rate: f32,
    pub style: &'static str,
}

impl VoiceProfileSettings {
    pub const fn for_persona(persona: Persona) -> Self {
        match persona {
            Persona::Lifestyle => Self {
                gender: VoiceGender::Female,
                pitch: 0.0,
                speaking_rate: 0.9,
                style: "friendly",
            },
            Persona::Business => Self {
                gender: VoiceGender::Male,
                pitch: 0.0,
                speaking_rate: 1.0,
                style: "professional",
            },
        }
    }

    /// Neural2 voice name for `language`, e.g. `nl-NL-Neural2-F`
    pub fn voice_name(&self, language: &str) -> String {
        let variant = match self.gender {
            VoiceGender::Female => 'F',
            VoiceGender::Male => 'M',
        };
        format!("{language}-Neural2-{variant}")
    }
}

/// Text-to-speech and speech-to-text backend.
#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Synthesize `text` with the voice of `persona`; returns MP3 audio.
    async fn synthesize(&self, text: &str, persona: Persona) -> SpeechResult<Bytes>;

    /// Recognize 16-bit linear PCM audio.
    async fn transcribe(&self, audio: &[u8]) -> SpeechResult<Transcription>;
}
