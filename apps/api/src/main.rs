//! # ERP API Server
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. tracing (RUST_LOG, default "info")                                 │
//! │  2. ApiConfig::load()        defaults → erp.toml → ERP_* env           │
//! │  3. Database::new()          pool + embedded migrations                │
//! │  4. seed_defaults()          admin user, sample catalogue (optional)   │
//! │  5. axum::serve()            until SIGINT / SIGTERM                    │
//! │  6. Database::close()                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use erp_api::seed::seed_defaults;
use erp_api::{create_app, ApiConfig, AppState};
use erp_db::{Database, DbConfig};
use tokio::signal;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    info!("Starting ERP API v{}", env!("CARGO_PKG_VERSION"));

    let config = ApiConfig::load().context("loading configuration")?;
    info!(
        database = %config.database_path,
        max_connections = config.db_max_connections,
        "Configuration loaded"
    );

    let db_config = if config.database_path == ":memory:" {
        DbConfig::in_memory()
    } else {
        DbConfig::new(&config.database_path).max_connections(config.db_max_connections)
    };
    let db = Database::new(db_config)
        .await
        .context("opening database")?;

    if config.seed_defaults {
        seed_defaults(&db, &config)
            .await
            .context("seeding defaults")?;
    }

    let addr = config.bind_address();
    let state = Arc::new(AppState::new(db.clone(), config));
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    info!("Server shut down gracefully");
    Ok(())
}
