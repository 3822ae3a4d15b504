//! Router assembly, logging setup and the serve loop.

use crate::config::{ServerConfig, DEFAULT_LOG_FILTER};
use crate::routes::{self, ocr, slide};
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Builds the router with all routes and layers.
pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    // Credentials cannot be combined with wildcards, so requests are mirrored.
    let cors = if config.cors_enabled() {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(routes::root))
        .route("/ocr", post(ocr::recognize_text))
        .route("/slide", post(slide::solve_slide))
        .fallback(routes::not_found)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Installs the global tracing subscriber.
///
/// `--log-level` wins over `RUST_LOG`, which wins over the built-in filter.
pub fn init_tracing(config: &ServerConfig) -> anyhow::Result<()> {
    let filter = match &config.log_level {
        Some(directive) => EnvFilter::try_new(directive)?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let installed = if config.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| anyhow::anyhow!(err))
}

/// Serves the API with the default state until Ctrl+C or SIGTERM.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    init_tracing(&config)?;
    serve(Arc::new(AppState::new()), config).await
}

/// Serves the API with a caller-provided state.
pub async fn serve(state: Arc<AppState>, config: ServerConfig) -> anyhow::Result<()> {
    let app = build_router(state, &config);

    tracing::info!(
        "captcha recognition service listening on {} (max body {} bytes, CORS {})",
        config.bind_addr(),
        config.max_body_bytes,
        if config.cors_enabled() { "on" } else { "off" }
    );

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
