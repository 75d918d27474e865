use std::net::SocketAddr;
use anyhow::Context;
use pawprints_api::{app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pawprints_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = pawprints_store::Config::load().context("Failed to load config")?;
    let engine = config.pricing_engine().context("Invalid pricing configuration")?;
    let poll_policy = config.poll_policy();
    tracing::info!(
        "Starting PawPrints API on port {} with {} materials, vendor quotes awaited up to {:?}",
        config.server.port,
        engine.catalog().len(),
        poll_policy.max_wait()
    );

    let app = app(AppState::new(engine, poll_policy));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
