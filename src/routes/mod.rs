pub mod api;
pub mod ws;

use axum::Router;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

use crate::errors::panic_response;
use crate::state::AppState;

/// Assemble every route with its state applied.
pub fn build_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .merge(api::create_api_router())
        .merge(ws::create_ws_router(state.clone()))
        .with_state(state);
    with_fault_handling(router)
}

/// Answer handler panics with a 500 `{"detail": ...}` body instead of
/// dropping the connection.
fn with_fault_handling(router: Router) -> Router {
    router.layer(CatchPanicLayer::custom(panic_response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    async fn broken() -> &'static str {
        panic!("session map invariant violated")
    }

    #[tokio::test]
    async fn test_panicking_handler_returns_internal_error() {
        let app = with_fault_handling(Router::new().route("/broken", get(broken)));

        let request = Request::builder().uri("/broken").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({"detail": "Internal server error"}));
    }
}
