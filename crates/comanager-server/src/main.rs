//! Co-manager server binary.

use std::process::ExitCode;

use clap::Parser;
use comanager_db::DbManager;
use comanager_server::{AppState, ServerArgs, api};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("comanager=info")),
        )
        .json()
        .init();

    let args = ServerArgs::parse();
    if let Err(e) = run(args).await {
        tracing::error!(error = %e, "Fatal error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(args: ServerArgs) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(addr = %args.listen, "Starting co-manager server");

    let auth_config = args.auth_config()?;
    let db = DbManager::connect(&args.db_config()).await?;

    let state = AppState::new(db.client().clone(), auth_config);
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    tracing::info!(addr = %args.listen, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Co-manager server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    tracing::info!("Received shutdown signal");
}
