use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tinyauth::{config::AppConfig, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let addr: SocketAddr = format!("{}:{}", config.address, config.port)
        .parse()
        .context("Invalid listen address")?;

    let settings = config
        .into_settings()
        .context("Invalid configuration")?;

    if settings.users.is_empty() && settings.oauth_providers.is_empty() {
        tracing::warn!("No users or OAuth providers configured, nobody can log in");
    }
    tracing::info!(
        "Loaded {} users, whitelist of {} emails, sessions last {}s",
        settings.users.len(),
        settings.whitelist.len(),
        settings.session_ttl.num_seconds()
    );

    let app = routes::api_routes(AppState::new(settings));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
