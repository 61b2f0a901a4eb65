use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use todo_tags::db::{self, repositories::{MemoryStore, PostgresStore}};
use todo_tags::server::config::{ServerConfig, StorageBackend};
use todo_tags::server::logging::init_logging;
use todo_tags::server::VERSION;
use todo_tags::web::{create_axum_router, AppState};

#[derive(Parser, Debug)]
#[command(author, version = VERSION, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal.");
        return;
    }
    info!("Shutdown signal received.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    // --- Server Config Setup ---
    let server_config = ServerConfig::load(args.config.as_deref())?;

    init_logging(&server_config.log_dir);
    info!(version = VERSION, storage = %server_config.storage, "Starting todo server.");

    // --- Storage Setup ---
    let app_state = match server_config.storage {
        StorageBackend::Postgres => {
            let db_pool = match db::connect_with_retry(&server_config).await {
                Ok(db_pool) => db_pool,
                Err(e) => {
                    error!(
                        attempts = server_config.db_connect_retries,
                        error = %e,
                        "Exceeded max retries to connect to database."
                    );
                    return Err(e.into());
                }
            };
            db::create_schema(&db_pool).await?;
            AppState::from_store(Arc::new(PostgresStore::new(db_pool)))
        }
        StorageBackend::Memory => AppState::from_store(Arc::new(MemoryStore::new())),
    };

    // --- Axum HTTP Server Setup ---
    let app = create_axum_router(Arc::new(app_state));

    let addr: SocketAddr = server_config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "HTTP server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
