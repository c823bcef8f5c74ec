//! Dutch text-to-speech and speech-to-text.

mod base;
mod gateway;
pub mod google;

pub use base::{
    SpeechError, SpeechResult, SpeechService, Transcription, VoiceGender, VoiceProfileSettings,
};
pub use gateway::{
    STAND_IN_CONFIDENCE, STAND_IN_TRANSCRIPT, SpeechGateway, SynthesisOutcome,
    TranscriptionOutcome,
};
pub use google::{GoogleSpeechClient, GoogleSpeechConfig};
