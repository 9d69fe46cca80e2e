use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loan_default_api::artifact::FileArtifactLoader;
use loan_default_api::config::Config;
use loan_default_api::handlers::AppState;
use loan_default_api::server;
use loan_default_api::services::InferenceService;

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - The one-time model artifact load.
/// - HTTP routes and middleware.
///
/// The listener is bound only after the artifact is ready; a failed load
/// ends the process.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok if the server runs successfully, or an error if initialization fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loan_default_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Load the model before accepting any traffic
    let inference = Arc::new(InferenceService::new());
    let loader = FileArtifactLoader::new(&config.model_path);
    let loading = Arc::clone(&inference);
    let info = tokio::task::spawn_blocking(move || loading.load(&loader))
        .await
        .context("model loading task panicked")?
        .with_context(|| {
            format!(
                "failed to load model artifact from {}",
                config.model_path.display()
            )
        })?;
    tracing::info!(
        "Model artifact loaded from {} (sha256: {})",
        info.source,
        info.sha256.as_deref().unwrap_or("n/a")
    );

    // Build application state and routes
    let app_state = Arc::new(AppState::new(inference));
    let app = server::router(app_state, &config)?;

    // Start server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Server listening on {}", addr);
    tracing::info!("  GET  /health - Health check");
    tracing::info!("  POST /predict - Loan default prediction");
    tracing::info!("  GET  /docs - Swagger UI");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
