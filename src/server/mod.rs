//! HTTP surface.
//!
//! Thin routing glue over the content pipeline: a static search landing
//! page, a search redirect, the cache listing, maintenance endpoints, and
//! the catch-all route that makes every other path resolve to generated
//! content.

pub mod handlers;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::generate::ContentPipeline;
use crate::Result;

/// Shared application state.
pub struct AppState {
    pub pipeline: ContentPipeline,
}

/// Build the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/search", get(handlers::search))
        .route("/index", get(handlers::index))
        .route("/api/cache/stats", get(handlers::cache_stats))
        .route("/api/cache/clear", get(handlers::cache_clear_all))
        .route("/api/cache/clear/{*path}", get(handlers::cache_clear_path))
        .route(
            "/{*path}",
            get(handlers::page).post(handlers::page_with_form),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server until ctrl-c.
pub async fn run_server(config: AppConfig) -> Result<()> {
    let pipeline = ContentPipeline::from_config(&config)?;
    info!(
        provider = config.provider.kind.as_str(),
        model = %config.provider.model,
        cache = %config.cache_root.display(),
        images = config.image_backend.is_some(),
        "pipeline ready"
    );

    let state = Arc::new(AppState { pipeline });
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!(address = %addr, "starting server");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received, stopping server");
    }
}
