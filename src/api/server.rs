use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    health_check, ingest_vital, list_streams, stats, stream_detail, AppState,
};
use crate::delivery::{DeliveryClient, DeliveryConfig, DeliveryWorker};
use crate::engine::{EngineConfig, StalenessSweeper, VitalsEngine};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub engine: EngineConfig,
    pub delivery: DeliveryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            engine: EngineConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Ingestion
        .route("/v1/vitals", post(ingest_vital))
        // Observability
        .route("/streams", get(list_streams))
        .route("/streams/:id", get(stream_detail))
        .route("/stats", get(stats))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Engine feeds the delivery worker through a bounded queue
    let (transitions_tx, transitions_rx) = mpsc::channel(config.delivery.queue_capacity);

    let engine = Arc::new(VitalsEngine::new(config.engine.clone(), transitions_tx));
    let delivery = Arc::new(DeliveryClient::new(config.delivery.clone()));

    if config.delivery.enabled() {
        tracing::info!(
            "Delivery enabled with {} endpoint(s)",
            config.delivery.endpoints.len()
        );
    } else {
        tracing::info!("No validator endpoints configured, transitions stay local");
    }

    // Initialize app state
    let state = Arc::new(AppState {
        engine: Arc::clone(&engine),
        delivery: Arc::clone(&delivery),
    });

    // Start background workers
    let sweeper = Arc::new(StalenessSweeper::new(Arc::clone(&engine)));
    let sweeper_handle = Arc::clone(&sweeper).start();

    let worker = DeliveryWorker::new(Arc::clone(&delivery), transitions_rx);
    let worker_shutdown = worker.shutdown_handle();
    let worker_handle = worker.start();

    // Build router
    let app = build_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting Holter server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweeper, worker_shutdown))
        .await?;

    // Let the delivery worker drain within a grace period
    if tokio::time::timeout(std::time::Duration::from_secs(5), worker_handle)
        .await
        .is_err()
    {
        tracing::warn!("Delivery worker did not drain in time, abandoning in-flight deliveries");
    }
    sweeper_handle.abort();

    tracing::info!("Holter server stopped");
    Ok(())
}

async fn shutdown_signal(sweeper: Arc<StalenessSweeper>, worker_shutdown: mpsc::Sender<()>) {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");

    tracing::info!("Shutdown signal received, stopping workers...");
    sweeper.stop();
    let _ = worker_shutdown.send(()).await;
}
