use anyhow::{Context, Result};
use archive_expander::{
    config::{AppConfig, RunMode},
    models::event::NotificationEvent,
    routes,
    services::{
        expander::ArchiveExpander,
        storage_service::{StorageService, connect_sqlite},
    },
    state::AppState,
};
use axum::Router;
use std::{fs, io::ErrorKind, path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + run mode ---
    let (cfg, mode) = AppConfig::from_env_and_args()?;

    tracing::info!("Starting archive-expander with config: {:?}", cfg);

    // --- Ensure storage directory exists ---
    if !Path::new(&cfg.storage_dir).exists() {
        fs::create_dir_all(&cfg.storage_dir)?;
        tracing::info!("Created storage directory at {}", cfg.storage_dir);
    }

    // --- Initialize SQLite + schema ---
    tracing::debug!("Connecting to {}", cfg.database_url);
    let db = connect_sqlite(&cfg.database_url)
        .await
        .with_context(|| format!("opening database {}", cfg.database_url))?;
    let storage = StorageService::new(Arc::new(db), cfg.storage_dir.clone());
    storage.migrate().await.context("applying schema")?;

    let expander =
        ArchiveExpander::new(Arc::new(storage.clone())).with_skip_policy(cfg.skip_policy());

    match mode {
        RunMode::Migrate => {
            tracing::info!("Database migration complete.");
            Ok(())
        }
        RunMode::Event(path) => {
            let event = NotificationEvent::from_file(&path)?;
            tracing::info!(
                "Processing {} record(s) from {}",
                event.records.len(),
                path.display()
            );
            let status = expander
                .handle(&event)
                .await
                .with_context(|| format!("processing event {}", path.display()))?;
            println!("{}", status);
            Ok(())
        }
        RunMode::Serve => serve(&cfg, AppState::new(storage, expander, cfg.notify_on_upload)).await,
    }
}

async fn serve(cfg: &AppConfig, state: AppState) -> Result<()> {
    let app: Router = routes::routes::routes().with_state(state);

    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
