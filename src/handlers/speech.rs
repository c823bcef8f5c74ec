//! Speech REST endpoints
//!
//! Both endpoints always answer, even without a configured backend; the
//! `degraded` flag (header for `/speak`, body field for `/transcribe`) tells
//! the caller whether stand-in output was returned.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::{HeaderName, HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::core::dialogue::Persona;
use crate::core::speech::TranscriptionOutcome;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Response header reporting stand-in synthesis output
pub const SPEECH_DEGRADED_HEADER: HeaderName = HeaderName::from_static("x-speech-degraded");

/// Body of `POST /speak`
#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
    #[serde(default)]
    pub voice_profile: Option<String>,
}

/// Synthesize `text` in the voice of `voice_profile` and return MP3 audio.
pub async fn speak(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SpeakRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    let text = request.text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }
    let persona = match request.voice_profile {
        Some(profile) => profile
            .parse::<Persona>()
            .map_err(|e| AppError::Validation(e.to_string()))?,
        None => Persona::default(),
    };

    let outcome = state.speech.synthesize(text, persona).await;
    let degraded = if outcome.degraded { "true" } else { "false" };

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg")),
            (SPEECH_DEGRADED_HEADER, HeaderValue::from_static(degraded)),
        ],
        outcome.audio,
    )
        .into_response())
}

/// Transcribe a raw LINEAR16 request body.
pub async fn transcribe(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Json<TranscriptionOutcome> {
    Json(state.speech.transcribe(&body).await)
}
