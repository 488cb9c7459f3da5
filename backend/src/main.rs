//! Crop Health Hyperspectral Analysis - Backend Server

use std::net::SocketAddr;

use anyhow::Context;
use crop_health_backend::{analysis::SpectralEstimationStrategy, create_app, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chs_server=debug,crop_health_backend=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Crop Health Hyperspectral Analysis Server");
    tracing::info!("Environment: {}", config.environment);

    // Pick the spectral estimation engine once for the process lifetime
    let strategy = SpectralEstimationStrategy::probe(config.engine.model_path.as_deref());
    tracing::info!(
        engine = strategy.name(),
        band_count = config.analysis.band_count,
        max_concurrent = config.worker_pool.max_concurrent,
        exhaustion_policy = ?config.worker_pool.exhaustion_policy,
        "Analysis pipeline ready"
    );

    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("invalid server.host {:?}", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);

    // Build application
    let app = create_app(AppState::new(config, strategy));

    // Start server
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
