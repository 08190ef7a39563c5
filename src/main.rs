//! # promptmux
//!
//! Multi-provider LLM prompt fan-out backend.
//!
//! One authenticated prompt submission fans out to the selected providers
//! concurrently and streams tagged completions back over a single SSE
//! connection; finalized responses are persisted per provider.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/promptmux \
//! JWT_SECRET_KEY=... \
//! ENCRYPTION_KEY=... \
//! promptmux
//! ```

use anyhow::Context;
use mux_providers::ProviderRegistry;
use mux_server::{create_router, AppState, Config};
use mux_storage::PoolConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting promptmux");

    if let Err(e) = run().await {
        error!(error = %e, "Application failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;
    info!(bind_addr = %config.bind_addr, "Configuration loaded");

    let pool = mux_storage::connect(
        &config.database_url,
        &PoolConfig::default().with_max_connections(config.db_max_connections),
    )
    .await
    .context("connecting to database")?;

    mux_storage::schema::apply(&pool)
        .await
        .context("applying schema")?;

    let registry = ProviderRegistry::with_defaults().context("building provider registry")?;
    info!(providers = registry.len(), "Provider registry initialized");

    let state = AppState::new(pool, &config, registry);
    let app = create_router(state, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install shutdown signal handler");
        return;
    }
    info!("Shutdown signal received");
}
