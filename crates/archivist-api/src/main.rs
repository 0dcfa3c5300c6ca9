//! archivist-api - HTTP API server for life-archivist

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use archivist_api::{build_router, watcher::InboxWatcher, AppState};
use archivist_core::{defaults, SettingsStore};
use archivist_index::{HttpIndexBackend, IndexBackend};
use archivist_vault::Vault;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   RUST_LOG    - standard env filter (default: "archivist_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "archivist_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("archivist-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false) // no ANSI in files
                        .with_writer(non_blocking),
                )
                .init();
        }
        Some(guard)
    } else if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
        None
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let host =
        std::env::var("ARCHIVIST_HOST").unwrap_or_else(|_| defaults::SERVER_HOST.to_string());
    let port: u16 = std::env::var("ARCHIVIST_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults::SERVER_PORT);

    // Settings: defaults overlaid with ARCHIVIST_* environment overrides
    let settings = SettingsStore::from_env();

    // Open the vault and verify it is writable before accepting traffic
    let vault_dir =
        std::env::var("ARCHIVIST_VAULT_DIR").unwrap_or_else(|_| defaults::VAULT_DIR.to_string());
    let vault = Arc::new(Vault::open(&vault_dir).await?);
    vault.validate().await.map_err(anyhow::Error::msg)?;
    info!(vault_dir = %vault_dir, "Vault initialized");

    // Index service client; an unreachable index degrades rather than aborts
    let index = Arc::new(HttpIndexBackend::from_env());
    let index_health = index.health().await;
    if index_health.reachable {
        info!(
            document_count = index_health.document_count,
            "Index service reachable"
        );
    } else {
        warn!(
            detail = index_health.detail.as_deref().unwrap_or("no detail"),
            "Index service unreachable at startup; search and query will return 503"
        );
    }

    let state = AppState::new(vault, index, settings);

    // Optional inbox watch folder
    let _inbox_watcher = match std::env::var("ARCHIVIST_WATCH_DIR") {
        Ok(dir) if !dir.trim().is_empty() => {
            Some(InboxWatcher::spawn(state.clone(), dir.trim().into())?)
        }
        _ => None,
    };

    let app = build_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
