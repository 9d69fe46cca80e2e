use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use utoipa::ToSchema;

use crate::services::ServiceState;

// ============ Request Validation ============

/// Why a single field of a loan application was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IssueReason {
    /// The field was absent from the request body.
    Missing,
    /// The field holds `null`, an array or an object where a categorical token is required.
    NotCategorical,
    /// The field cannot be read as a finite decimal number.
    NotDecimal,
    /// The request body itself is not a JSON object.
    NotAnObject,
}

impl fmt::Display for IssueReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueReason::Missing => write!(f, "field required"),
            IssueReason::NotCategorical => write!(f, "expected a categorical token"),
            IssueReason::NotDecimal => write!(f, "expected a finite decimal number"),
            IssueReason::NotAnObject => write!(f, "expected a JSON object"),
        }
    }
}

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldIssue {
    /// Name of the offending field, or `$` for the body as a whole.
    pub field: String,
    pub reason: IssueReason,
}

/// A loan application that could not be turned into a feature record.
///
/// Carries every failing field, in feature order, not only the first one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub issues: Vec<FieldIssue>,
}

impl SchemaError {
    /// Returns `true` if `field` is among the rejected fields.
    pub fn mentions(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid loan application")?;
        for (i, issue) in self.issues.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{} ({})", sep, issue.field, issue.reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

// ============ Inference ============

/// Failure reported by a classifier while scoring a feature frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionError(pub String);

impl fmt::Display for PredictionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prediction failed: {}", self.0)
    }
}

impl std::error::Error for PredictionError {}

/// Errors returned by [`InferenceService::classify`](crate::services::InferenceService::classify).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    /// The model artifact is not in the `Ready` state.
    ArtifactUnavailable(ServiceState),
    /// The artifact failed or returned something other than exactly one label.
    Prediction(PredictionError),
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyError::ArtifactUnavailable(state) => {
                write!(f, "model artifact unavailable (state: {})", state)
            }
            ClassifyError::Prediction(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ClassifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClassifyError::ArtifactUnavailable(_) => None,
            ClassifyError::Prediction(e) => Some(e),
        }
    }
}

impl From<PredictionError> for ClassifyError {
    fn from(err: PredictionError) -> Self {
        ClassifyError::Prediction(err)
    }
}

// ============ Artifact Loading ============

/// Errors raised while loading the model artifact.
#[derive(Debug)]
pub enum LoadError {
    /// The artifact file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The artifact is not well-formed JSON for the expected layout.
    Parse(serde_json::Error),
    /// The artifact parsed but violates a structural requirement.
    Invalid(String),
    /// A load was already attempted; the artifact is never reloaded.
    AlreadyAttempted(ServiceState),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => {
                write!(f, "cannot read artifact {}: {}", path.display(), source)
            }
            LoadError::Parse(e) => write!(f, "malformed artifact: {}", e),
            LoadError::Invalid(msg) => write!(f, "invalid artifact: {}", msg),
            LoadError::AlreadyAttempted(state) => {
                write!(f, "artifact load already attempted (state: {})", state)
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Parse(e) => Some(e),
            LoadError::Invalid(_) | LoadError::AlreadyAttempted(_) => None,
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Parse(err)
    }
}

// ============ HTTP Layer ============

/// JSON body returned for every failed request.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldIssue>>,
}

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// The body parsed as JSON but the loan application is invalid.
    Schema(SchemaError),
    /// The body could not be read as JSON (syntax, content type, size).
    InvalidBody { status: StatusCode, message: String },
    /// The model is not ready to serve predictions.
    ArtifactUnavailable(ServiceState),
    /// The model failed while producing a prediction.
    PredictionFailed(PredictionError),
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Schema(e) => write!(f, "Schema error: {}", e),
            AppError::InvalidBody { message, .. } => write!(f, "Invalid body: {}", message),
            AppError::ArtifactUnavailable(state) => {
                write!(f, "Artifact unavailable: state {}", state)
            }
            AppError::PredictionFailed(e) => write!(f, "Internal error: {}", e),
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Client errors are returned verbatim; server-side failures are logged
    /// and answered with a generic message.
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Schema(e) => {
                tracing::debug!("Rejected loan application: {}", e);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorResponse {
                        error: "Invalid loan application".to_string(),
                        details: Some(e.issues),
                    },
                )
            }
            AppError::InvalidBody { status, message } => (
                status,
                ErrorResponse {
                    error: message,
                    details: None,
                },
            ),
            AppError::ArtifactUnavailable(state) => {
                tracing::warn!("Prediction requested while model is {}", state);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse {
                        error: "Model artifact is not loaded".to_string(),
                        details: None,
                    },
                )
            }
            AppError::PredictionFailed(e) => {
                tracing::error!("Prediction error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Prediction failed".to_string(),
                        details: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        AppError::Schema(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<ClassifyError> for AppError {
    fn from(err: ClassifyError) -> Self {
        match err {
            ClassifyError::ArtifactUnavailable(state) => AppError::ArtifactUnavailable(state),
            ClassifyError::Prediction(e) => AppError::PredictionFailed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_lists_every_field() {
        let err = SchemaError {
            issues: vec![
                FieldIssue {
                    field: "IncomeTotal".to_string(),
                    reason: IssueReason::NotDecimal,
                },
                FieldIssue {
                    field: "Rating".to_string(),
                    reason: IssueReason::Missing,
                },
            ],
        };

        assert_eq!(
            err.to_string(),
            "invalid loan application: IncomeTotal (expected a finite decimal number); Rating (field required)"
        );
        assert!(err.mentions("Rating"));
        assert!(!err.mentions("Bids"));
    }

    #[test]
    fn classify_errors_map_to_distinct_statuses() {
        let unavailable: AppError = ClassifyError::ArtifactUnavailable(ServiceState::Loading).into();
        assert_eq!(
            unavailable.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );

        let failed: AppError =
            ClassifyError::Prediction(PredictionError("no label".to_string())).into();
        assert_eq!(
            failed.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let schema: AppError = SchemaError { issues: vec![] }.into();
        assert_eq!(
            schema.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
