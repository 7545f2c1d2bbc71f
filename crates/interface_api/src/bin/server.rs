//! Coworking Portal - API Server Binary
//!
//! # Usage
//!
//! ```bash
//! # In-memory storage, handy for local trials
//! PORTAL_STORAGE=memory cargo run --bin portal-api
//!
//! # PostgreSQL storage
//! PORTAL_DATABASE_URL=postgres://... PORTAL_JWT_SECRET=... cargo run --bin portal-api
//! ```
//!
//! # Environment Variables
//!
//! * `PORTAL_HOST` / `PORTAL_PORT` - Bind address (default: 0.0.0.0:8080)
//! * `PORTAL_JWT_SECRET` - HS256 signing secret (required in production)
//! * `PORTAL_STORAGE` - `postgres` (default) or `memory`
//! * `PORTAL_DATABASE_URL` - PostgreSQL connection string
//! * `PORTAL_LOG_LEVEL` - Default filter when `RUST_LOG` is unset (default: info)
//! * `PORTAL_LOG_FORMAT` - `pretty` (default) or `json`
//!
//! See `ApiConfig` for the full list.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use infra_db::{create_pool, run_migrations};
use interface_api::config::{ApiConfig, LogFormat, StorageBackend};
use interface_api::{create_router, AppState, Ports};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::load().context("failed to load configuration")?;

    init_tracing(&config);

    info!(
        host = %config.host,
        port = %config.port,
        storage = ?config.storage,
        "Starting Coworking Portal API Server"
    );
    if config.uses_default_secret() {
        warn!("PORTAL_JWT_SECRET is not set; using the development secret");
    }

    let ports = build_ports(&config).await?;
    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .context("invalid host/port")?;

    let app = create_router(AppState::new(config, ports));

    info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Connects the configured storage backend
async fn build_ports(config: &ApiConfig) -> anyhow::Result<Ports> {
    match config.storage {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data will not survive a restart");
            Ok(Ports::in_memory())
        }
        StorageBackend::Postgres => {
            let db_config = config
                .database_config()
                .context("database_url is required for postgres storage")?;
            let pool = create_pool(db_config)
                .await
                .context("failed to connect to database")?;
            run_migrations(&pool)
                .await
                .context("failed to run migrations")?;
            Ok(Ports::postgres(pool))
        }
    }
}

/// Initializes the tracing subscriber for structured logging
fn init_tracing(config: &ApiConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
