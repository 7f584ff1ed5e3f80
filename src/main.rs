use std::sync::Arc;

use axum::Router;
use tower_http::{services::ServeDir, trace::TraceLayer}; // ServeDir hosts the presentation bundle
use tracing::{error, info};

use day_planner::{Store, api_router, settings::Settings};

#[tokio::main]
async fn main() -> day_planner::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_line_number(true)
        .init();

    let settings = Settings::from_env()?;
    let store = Arc::new(Store::open(&settings.data_path)?);

    let app = Router::new()
        .nest("/api", api_router(Arc::clone(&store)))
        .fallback_service(ServeDir::new(&settings.static_dir))
        .layer(TraceLayer::new_for_http());

    // Print the link to the server
    info!("Server running at http://{}", settings.addr);
    info!("Static files: {}", settings.static_dir.display());
    info!("State file:   {}", settings.data_path.display());

    let listener = tokio::net::TcpListener::bind(settings.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // last commits may still be queued
    if let Err(err) = store.flush() {
        error!("failed to flush state on shutdown: {err}");
    }
    info!("Day planner stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
    }
}
