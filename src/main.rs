//! Holter Server
//!
//! Run with: cargo run
//!
//! Environment variables:
//! - HOLTER_HOST: Bind address (default: 0.0.0.0)
//! - HOLTER_PORT: Port number (default: 8080)
//! - RUST_LOG: Log level (default: info)
//!
//! Detection tuning:
//! - HOLTER_WINDOW_SEC: Confirmation window length (default: 6)
//! - HOLTER_MIN_SAMPLES: Minimum readings before a transition may fire (default: 3)
//! - HOLTER_ENTER_RATIO / HOLTER_EXIT_RATIO: Critical-fraction thresholds (default: 0.66 / 0.2)
//! - HOLTER_COOLDOWN_SEC: Re-entry suppression after any transition (default: 30)
//! - HOLTER_STALE_SEC: Silence before an active alert auto-resolves (default: 30)
//! - HOLTER_BPM_* / HOLTER_SPO2_*: Critical bands and plausibility ranges
//!
//! Alert delivery (disabled unless endpoints are configured):
//! - HOLTER_VALIDATOR_URLS: Comma-separated list of downstream alert endpoints
//! - HOLTER_AUTH_URL: Token endpoint (default: http://localhost:3000/auth)
//! - HOLTER_HOUSE_ID: Tenant identifier sent in token requests (default: house-1)

use holter::api::{run_server, ServerConfig};
use holter::delivery::DeliveryConfig;
use holter::engine::EngineConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "holter=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse basic configuration from environment
    let host = std::env::var("HOLTER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("HOLTER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let config = ServerConfig {
        host,
        port,
        engine: EngineConfig::from_env(),
        delivery: DeliveryConfig::from_env(),
    };

    tracing::info!("Holter configuration:");
    tracing::info!("  Host: {}:{}", config.host, config.port);
    tracing::info!(
        "  Confirmation window: {}s, min samples: {}",
        config.engine.window.as_secs(),
        config.engine.min_samples
    );
    tracing::info!(
        "  Enter ratio: {}, exit ratio: {}",
        config.engine.enter_ratio,
        config.engine.exit_ratio
    );
    tracing::info!(
        "  Cooldown: {}s, min exit delay: {}ms",
        config.engine.cooldown.as_secs(),
        config.engine.min_exit_delay.as_millis()
    );
    tracing::info!(
        "  Stale timeout: {}s (sweep every {}s)",
        config.engine.stale_timeout.as_secs(),
        config.engine.sweep_interval().as_secs()
    );

    // Delivery info
    if config.delivery.enabled() {
        tracing::info!("  Delivery: ENABLED");
        tracing::info!("  Endpoints: {}", config.delivery.endpoints.len());
        for endpoint in &config.delivery.endpoints {
            tracing::info!("    - {}", endpoint);
        }
        tracing::info!("  Auth URL: {}", config.delivery.auth_url);
        tracing::info!("  House ID: {}", config.delivery.house_id);
    } else {
        tracing::info!("  Delivery: DISABLED (no validator endpoints configured)");
    }

    println!(
        r#"
  _   _       _ _
 | | | | ___ | | |_ ___ _ __
 | |_| |/ _ \| | __/ _ \ '__|
 |  _  | (_) | | ||  __/ |
 |_| |_|\___/|_|\__\___|_|

 Streaming Vital-Sign Alert Engine
 Version: {}
"#,
        env!("CARGO_PKG_VERSION")
    );

    run_server(config).await
}
