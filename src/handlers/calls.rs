//! Call session REST endpoints
//!
//! - `POST /calls` - create a session
//! - `GET /calls` - list live sessions
//! - `GET /calls/{call_id}` - session details
//! - `GET /calls/{call_id}/transcript` - ordered transcript lines
//! - `DELETE /calls/{call_id}` - end a session
//! - `GET /stats` - dashboard statistics

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::core::dialogue::Persona;
use crate::core::session::{CallStats, CallStatus, CallSummary, SessionDescriptor};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Body of `POST /calls`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCallRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub voice_profile: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateCallResponse {
    pub call_id: String,
    pub status: &'static str,
    pub voice_profile: Persona,
}

#[derive(Debug, Serialize)]
pub struct ListCallsResponse {
    pub active_calls: usize,
    pub calls: Vec<SessionDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct CallDetailsResponse {
    pub call_id: String,
    pub user_id: String,
    pub voice_profile: Persona,
    pub status: CallStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    pub transcript_turns: usize,
}

/// Body of `DELETE /calls/{call_id}`
#[derive(Debug, Serialize)]
pub struct EndCallResponse {
    pub call_id: String,
    pub status: CallStatus,
    /// Seconds between creation and end
    pub duration: f64,
}

impl From<CallSummary> for EndCallResponse {
    fn from(summary: CallSummary) -> Self {
        Self {
            call_id: summary.call_id,
            status: summary.status,
            duration: summary.duration,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub call_id: String,
    pub transcript: Vec<String>,
}

/// Check a create payload without touching any state.
fn validate_create(request: CreateCallRequest) -> AppResult<(String, Persona)> {
    let user_id = request
        .user_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("user_id is required".to_string()))?;

    let persona = match request.voice_profile {
        Some(profile) => profile
            .parse::<Persona>()
            .map_err(|e| AppError::Validation(e.to_string()))?,
        None => Persona::default(),
    };

    Ok((user_id, persona))
}

pub async fn create_call(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateCallRequest>, JsonRejection>,
) -> AppResult<Json<CreateCallResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(error = %rejection.body_text(), "Rejected create-call payload");
        AppError::Validation(rejection.body_text())
    })?;
    let (user_id, persona) = validate_create(request)?;

    let call_id = state.sessions.create(user_id, persona);

    Ok(Json(CreateCallResponse {
        call_id,
        status: "initiated",
        voice_profile: persona,
    }))
}

pub async fn list_calls(State(state): State<Arc<AppState>>) -> Json<ListCallsResponse> {
    let calls = state.sessions.list_active();
    Json(ListCallsResponse {
        active_calls: calls.len(),
        calls,
    })
}

pub async fn get_call(
    State(state): State<Arc<AppState>>,
    Path(call_id): Path<String>,
) -> AppResult<Json<CallDetailsResponse>> {
    let snapshot = state.sessions.summary(&call_id).ok_or_else(|| {
        info!(call_id = %call_id, "Call not found");
        AppError::NotFound
    })?;

    Ok(Json(CallDetailsResponse {
        call_id: snapshot.call_id,
        user_id: snapshot.user_id,
        voice_profile: snapshot.voice_profile,
        status: snapshot.status,
        start_time: snapshot.start_time,
        transcript_turns: snapshot.turns_count,
    }))
}

pub async fn get_transcript(
    State(state): State<Arc<AppState>>,
    Path(call_id): Path<String>,
) -> AppResult<Json<TranscriptResponse>> {
    let transcript = state.sessions.transcript(&call_id).ok_or_else(|| {
        info!(call_id = %call_id, "Call not found");
        AppError::NotFound
    })?;

    Ok(Json(TranscriptResponse {
        call_id,
        transcript,
    }))
}

/// End a call and drop any dialogue state still bound to it.
pub async fn end_call(
    State(state): State<Arc<AppState>>,
    Path(call_id): Path<String>,
) -> AppResult<Json<EndCallResponse>> {
    let summary = state.sessions.end(&call_id)?;
    state.orchestrator.discard(&call_id);
    Ok(Json(summary.into()))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<CallStats> {
    Json(state.sessions.stats())
}
