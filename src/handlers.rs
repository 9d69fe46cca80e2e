use crate::errors::{AppError, ErrorResponse};
use crate::models::{LoanApplication, PredictionResponse};
use crate::services::{ArtifactInfo, InferenceService, ServiceState};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// The loaded model, shared read-only across requests.
    pub inference: Arc<InferenceService>,
}

impl AppState {
    pub fn new(inference: Arc<InferenceService>) -> Self {
        Self { inference }
    }
}

/// Health check payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` when the model is ready, `unavailable` otherwise.
    pub status: String,
    pub service: String,
    pub version: String,
    pub state: ServiceState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ArtifactInfo>,
}

/// Health check endpoint.
///
/// Reports `200` only once the model artifact is ready, so load balancers do
/// not route traffic to an instance that cannot predict.
///
/// # Returns
///
/// * `(StatusCode, Json<HealthResponse>)` - 200 when ready, 503 otherwise.
#[utoipa::path(
    get,
    path = "/health",
    tag = "service",
    responses(
        (status = 200, description = "Model loaded and serving", body = HealthResponse),
        (status = 503, description = "Model not loaded", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let service_state = state.inference.state();
    let (status, label) = match service_state {
        ServiceState::Ready => (StatusCode::OK, "healthy"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            state: service_state,
            model: state.inference.artifact_info(),
        }),
    )
}

/// POST /predict
///
/// Classifies one loan application as `Defaulted` or `Not Defaulted`.
///
/// The body is validated field by field before the model is consulted, so
/// invalid applications never reach it.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `payload` - JSON body with the 18 loan application fields.
///
/// # Returns
///
/// * `Result<Json<PredictionResponse>, AppError>` - The decision or an error.
#[utoipa::path(
    post,
    path = "/predict",
    tag = "inference",
    request_body = LoanApplication,
    responses(
        (status = 200, description = "Decision for the loan application", body = PredictionResponse),
        (status = 400, description = "Body is not valid JSON", body = ErrorResponse),
        (status = 413, description = "Body exceeds the configured size limit", body = ErrorResponse),
        (status = 415, description = "Missing `Content-Type: application/json`", body = ErrorResponse),
        (status = 422, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 500, description = "The model failed to produce a prediction", body = ErrorResponse),
        (status = 503, description = "The model is not loaded", body = ErrorResponse)
    )
)]
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>, AppError> {
    let Json(body) = payload?;

    let record = LoanApplication::try_from(body)?;
    let decision = state.inference.classify(record)?;

    tracing::info!("POST /predict - prediction: {}", decision);

    Ok(Json(PredictionResponse::from(decision)))
}
