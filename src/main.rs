//! FridgeScan Core Service
//!
//! Main entry point for the FridgeScan backend.

use fridgescan::state::{AppConfig, AppState};
use fridgescan::web_api;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fridgescan=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting FridgeScan service v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::default();
    tracing::info!(
        product_db_url = %config.product_db_url,
        vision_url = %config.vision_url,
        recipe_url = %config.recipe_url,
        expiry_stats_url = %config.expiry_stats_url,
        "Configuration loaded"
    );

    if config.recipe_api_key.is_empty() {
        tracing::warn!("RECIPE_API_KEY not set; recipe endpoints will be rejected upstream");
    }

    // Build shared components
    let state = AppState::new(config.clone());
    tracing::info!("Components initialized (store, resolver, vision, recipes, expiry stats)");

    // CORS for the mobile/web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = web_api::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "FridgeScan service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
