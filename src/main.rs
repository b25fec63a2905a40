use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use booth_render_gateway::{
    routes::{create_app, AppState},
    Config, ImageGateway, OpenAiClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    tracing::info!("Using API key: {}...", config.api_key_hint());
    tracing::info!(
        profile = config.profile.name(),
        n = config.profile.image_count(),
        size = config.profile.resolution(),
        format = %config.profile.output_format(),
        "Active template profile"
    );
    tracing::info!(policy = ?config.origin_policy, "Origin policy");

    let provider = Arc::new(OpenAiClient::new(config.api_key.clone(), config.api_base.clone()));
    let gateway = ImageGateway::new(Arc::new(config.profile.clone()), provider, config.image_model.clone());
    let state = AppState { gateway: Arc::new(gateway) };

    let app = create_app(state, Arc::new(config.origin_policy.clone()));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!("🚀 Image server running at http://{}", config.addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
