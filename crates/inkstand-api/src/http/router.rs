//! Axum router configuration with middleware.

use axum::Router;
use axum::http::Method;
use axum::routing::{any, get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::function::{FunctionState, TTS_PATH, text_to_speech};

/// Build the router: the text-to-speech function plus `/health`.
///
/// The function route answers OPTIONS and sets its CORS headers itself, so
/// the CORS layer only wraps the health probe.
pub fn build_router(function: FunctionState) -> Router {
    let health = Router::new().route("/health", get(health_check)).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET]),
    );

    Router::new()
        .route(TTS_PATH, any(text_to_speech))
        .with_state(function)
        .merge(health)
        .layer(TraceLayer::new_for_http())
}

/// GET /health
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use inkstand_types::config::StudioConfig;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_version() {
        let state = FunctionState::from_config(&reqwest::Client::new(), &StudioConfig::default());
        let response = build_router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let state = FunctionState::from_config(&reqwest::Client::new(), &StudioConfig::default());
        let response = build_router(state)
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
