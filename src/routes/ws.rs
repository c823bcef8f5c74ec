//! WebSocket route configuration

use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::ws::{audio_stream_handler, conversation_handler};
use crate::middleware::connection_limit_middleware;
use crate::state::AppState;
use std::sync::Arc;

/// Create the WebSocket router
///
/// # Endpoints
///
/// - `GET /ws/calls/{call_id}/{voice_profile}` - conversation channel
/// - `GET /ws/audio/{call_id}` - audio accumulation channel
///
/// Upgrades are subject to the global and per-IP connection limits, so the
/// server must be started with `into_make_service_with_connect_info`.
pub fn create_ws_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/ws/calls/{call_id}/{voice_profile}",
            get(conversation_handler),
        )
        .route("/ws/audio/{call_id}", get(audio_stream_handler))
        .route_layer(middleware::from_fn_with_state(
            state,
            connection_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}
