//! OpenAPI document and the Swagger UI page that renders it.

use axum::{http::StatusCode, response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::errors::{ErrorResponse, FieldIssue, IssueReason};
use crate::handlers::{self, HealthResponse};
use crate::models::{Decision, LoanApplication, PredictionResponse};
use crate::services::{ArtifactInfo, ServiceState};

/// Path the OpenAPI document is served from.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Loan Default Classifier for lending firm Bandora",
        description = "Scores a single loan application with a pre-trained random forest and reports whether it is expected to default."
    ),
    paths(handlers::predict, handlers::health),
    components(schemas(
        LoanApplication,
        PredictionResponse,
        Decision,
        HealthResponse,
        ArtifactInfo,
        ServiceState,
        ErrorResponse,
        FieldIssue,
        IssueReason
    )),
    tags(
        (name = "inference", description = "Loan default prediction"),
        (name = "service", description = "Operational endpoints")
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI specification as JSON.
pub async fn serve_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Serves the Swagger UI HTML page.
///
/// The page loads its assets from a CDN and points them at [`OPENAPI_PATH`].
pub async fn serve_swagger_ui() -> impl IntoResponse {
    let html = format!(
        r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Loan Default Classifier - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body {{ margin: 0; padding: 0; }}
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {{
            window.ui = SwaggerUIBundle({{
                url: "{}",
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            }});
        }};
    </script>
</body>
</html>
"#,
        OPENAPI_PATH
    );
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}
