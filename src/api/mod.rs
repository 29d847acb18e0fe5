//! REST API server module
//!
//! Provides an OpenAPI 3.1 compliant REST API for submitting URL batches and
//! listing the files that were published.

use crate::{Config, FileRelay, Result};
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Path the Swagger UI loads its document from
const SWAGGER_SPEC_PATH: &str = "/api-docs/openapi.json";

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Files
/// - `POST /files` - Submit a batch of URLs and wait for the report
/// - `GET /files` - List every stored file record
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /events` - Server-sent events stream of pipeline events
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(relay: Arc<FileRelay>, config: Arc<Config>) -> Router {
    let state = AppState::new(relay, config.clone());

    let router = Router::new()
        // Files
        .route("/files", post(routes::submit_batch))
        .route("/files", get(routes::list_files))
        // System
        .route("/health", get(routes::health_check))
        .route("/events", get(routes::event_stream))
        .route("/openapi.json", get(routes::openapi_spec));

    // Swagger UI serves its own copy of the document on a separate path
    let router = if config.server.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url(SWAGGER_SPEC_PATH, ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state.clone());

    // The last layer applied is the outermost:
    //   Request → Trace → CORS → Auth → Handler
    let router = if config.server.api.api_key.is_some() {
        router.layer(middleware::from_fn_with_state(state, auth::require_api_key))
    } else {
        router
    };

    let router = if config.server.api.cors_enabled {
        let cors = build_cors_layer(&config.server.api.cors_origins);
        router.layer(cors)
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http())
}

/// Build a CORS layer based on configured origins
///
/// `"*"` (or an empty list) allows any origin. All methods and headers are
/// allowed.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until the listener fails. See [`start_api_server_with_shutdown`] for
/// a server that stops on a signal.
///
/// # Example
///
/// ```no_run
/// use file_relay::{Config, FileRelay};
/// use file_relay::publish::MemoryStore;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let relay = Arc::new(FileRelay::new((*config).clone(), Arc::new(MemoryStore::new())).await?);
///
/// // Blocks until the server stops
/// file_relay::api::start_api_server(relay, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(relay: Arc<FileRelay>, config: Arc<Config>) -> Result<()> {
    start_api_server_with_shutdown(relay, config, std::future::pending()).await
}

/// Start the API server and stop gracefully once `shutdown` completes
pub async fn start_api_server_with_shutdown<F>(
    relay: Arc<FileRelay>,
    config: Arc<Config>,
    shutdown: F,
) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let bind_address = config.server.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(relay, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %listener.local_addr().map_err(crate::error::Error::Io)?,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
