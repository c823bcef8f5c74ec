//! HTTP-facing error type
//!
//! Every failure surfaced by a REST handler is mapped onto one of three
//! variants. Bodies are always `{"detail": "..."}`; internal faults never carry
//! their underlying cause to the client.

use std::any::Any;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

use crate::core::session::SessionError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Unknown call identifier
    #[error("Call not found")]
    NotFound,

    /// Malformed request payload; raised before any state is touched
    #[error("{0}")]
    Validation(String),

    /// Unexpected fault, such as a panicking handler; the message is logged,
    /// never returned
    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(call_id) => {
                info!(call_id = %call_id, "Call not found");
                Self::NotFound
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self {
            Self::NotFound => "Call not found".to_string(),
            Self::Validation(message) => message.clone(),
            Self::Internal(message) => {
                error!(error = %message, "Request failed with internal error");
                "Internal server error".to_string()
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Turn a handler panic into the same 500 body as [`AppError::Internal`].
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    };
    AppError::Internal(message).into_response()
}
