//! Router assembly and middleware stack.

use axum::{
    error_handling::HandleErrorLayer,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower::{timeout::error::Elapsed, BoxError, ServiceBuilder};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::Config;
use crate::handlers::{self, AppState};
use crate::openapi::{self, OPENAPI_PATH};

/// Maps middleware failures to HTTP responses.
async fn handle_middleware_error(err: BoxError) -> (StatusCode, Json<serde_json::Value>) {
    if err.is::<Elapsed>() {
        tracing::warn!("Request timed out");
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({ "error": "Request timed out" })),
        )
    } else {
        tracing::error!("Unhandled middleware error: {}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
    }
}

/// Builds the application router.
///
/// `/health` sits outside the body limit, timeout and rate limiter so
/// orchestrator probes are never throttled.
pub fn router(state: Arc<AppState>, config: &Config) -> anyhow::Result<Router> {
    let protected_routes = Router::new()
        // API Documentation
        .route("/docs", get(openapi::serve_swagger_ui))
        .route(OPENAPI_PATH, get(openapi::serve_openapi_spec))
        // Inference
        .route("/predict", post(handlers::predict))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(config.request_timeout)
                .layer(RequestBodyLimitLayer::new(config.max_body_bytes)),
        );

    let protected_routes = match config.rate_limit {
        Some(limit) => {
            // The governor quota is expressed as a replenish interval.
            let replenish_ms = (1000 / limit.per_second).max(1);
            let governor_conf = Arc::new(
                GovernorConfigBuilder::default()
                    .per_millisecond(replenish_ms)
                    .burst_size(limit.burst)
                    .key_extractor(SmartIpKeyExtractor)
                    .finish()
                    .ok_or_else(|| anyhow::anyhow!("invalid rate limit configuration"))?,
            );
            protected_routes.layer(GovernorLayer {
                config: governor_conf,
            })
        }
        None => protected_routes,
    };

    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    Ok(app)
}
