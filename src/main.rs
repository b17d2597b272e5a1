use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use job_portal_api::config::{self, StoreBackend};
use job_portal_api::{app, database, is_development, AppState};

#[derive(Parser)]
#[command(name = "job-portal-api", version, about = "Job board REST API")]
struct Cli {
    /// Listen port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Use the in-memory store instead of postgres
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")))
        .init();

    let cli = Cli::parse();

    let mut config = config::config().clone();
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.memory {
        config.database.backend = StoreBackend::Memory;
    }
    info!("Starting Job Portal API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET is not set; logins will fail until it is configured");
    }
    if is_development!() && !config.security.cookie_secure {
        tracing::warn!("Session cookies are sent without the Secure flag (development only)");
    }

    // A store that cannot be reached at startup is fatal
    let store = database::connect(&config.database)
        .await
        .context("failed to connect to document store")?;

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let state = AppState::new(config, store.clone());

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Job is waiting at: http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    store.close().await;
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
