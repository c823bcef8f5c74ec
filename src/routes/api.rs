use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, calls, speech};
use crate::state::AppState;
use std::sync::Arc;

/// Create the REST API router
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(api::health_check))
        .route("/calls", post(calls::create_call).get(calls::list_calls))
        .route("/calls/{call_id}", get(calls::get_call).delete(calls::end_call))
        .route("/calls/{call_id}/transcript", get(calls::get_transcript))
        .route("/stats", get(calls::get_stats))
        .route("/speak", post(speech::speak))
        .route("/transcribe", post(speech::transcribe))
        .layer(TraceLayer::new_for_http())
}
