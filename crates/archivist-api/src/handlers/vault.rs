//! Vault accounting and maintenance routes.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use tracing::{info, warn};

use archivist_vault::VaultDir;

use crate::error::ApiError;
use crate::{AppState, ListResponse, PageParams};

/// Per-directory file counts and byte totals.
pub async fn vault_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.vault.stats().await?;
    Ok(Json(stats))
}

/// List raw files in one managed vault directory.
pub async fn list_vault_files(
    State(state): State<AppState>,
    Path(directory): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let dir = VaultDir::parse(&directory)?;
    let settings = state.settings.get().await;
    let (limit, offset) = params.resolve(settings.page_limit)?;

    let (entries, total) = state.vault.list_dir(dir, limit, offset).await?;
    Ok(Json(ListResponse::new(entries, total, limit, offset)))
}

/// Clear every managed vault directory and the index.
pub async fn clear_vault(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let cleared_files = state.vault.clear_all().await?;

    // A cleared vault with a populated index would answer questions about
    // documents that no longer exist.
    let index_cleared = match state.index.clear().await {
        Ok(removed) => {
            info!(removed, op = "clear_all", "index cleared with vault");
            true
        }
        Err(e) => {
            warn!(error = %e, op = "clear_all", "index clear failed after vault clear");
            false
        }
    };

    Ok(Json(serde_json::json!({
        "cleared_files": cleared_files,
        "index_cleared": index_cleared,
    })))
}
