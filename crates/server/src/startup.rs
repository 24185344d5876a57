use std::{path::Path, sync::Arc};

use axum::Router;
use common::env::ensure_data_dir;
use configs::{AppConfig, VaultConfig};
use service::{storage::InMemoryRecordRepository, vault::VaultService};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes;
use crate::state::{ServerState, Vault};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Construct the vault and fill it from the backing file.
///
/// A missing or unreadable file is not fatal: the vault starts empty and the
/// file is (re)created on the first successful write.
pub async fn build_vault(cfg: &VaultConfig) -> anyhow::Result<Arc<Vault>> {
    ensure_data_dir(Path::new(&cfg.file_path)).await?;

    if cfg.record_types.is_empty() {
        warn!("no record types configured; every write will be rejected");
    }

    let repo = Arc::new(InMemoryRecordRepository::new());
    let vault = Arc::new(VaultService::new(repo, &cfg.file_path, cfg.record_types.clone()));

    if let Err(e) = vault.load_from_file().await {
        warn!(path = %cfg.file_path, error = %e, "failed to read storage file; starting with empty storage");
    }
    Ok(vault)
}

pub fn build_app(vault: Arc<Vault>) -> Router {
    routes::build_router(ServerState { vault }, build_cors())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(event = "shutdown_signal", signal = "ctrl_c", "shutting down"),
        _ = terminate => info!(event = "shutdown_signal", signal = "sigterm", "shutting down"),
    }
}

/// Public entry: load storage, serve HTTP until a shutdown signal, then flush
/// the storage to disk one last time.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let vault = build_vault(&cfg.vault).await?;
    let app = build_app(Arc::clone(&vault));

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr())
        .await
        .map_err(|e| StartupError::InvalidConfig(format!("cannot bind {}: {e}", cfg.bind_addr())))?;
    let addr = listener.local_addr()?;
    info!(%addr, file = %cfg.vault.file_path, record_types = ?cfg.vault.record_types, "starting vault server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    vault
        .persist_to_file()
        .await
        .map_err(|e| StartupError::Runtime(format!("final storage flush failed: {e}")))?;
    info!(event = "flushed", "storage written; server stopped");
    Ok(())
}
