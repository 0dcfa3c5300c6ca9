//! Health and service status routes.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::ApiError;
use crate::AppState;

/// Liveness probe.
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "life-archivist",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Aggregated service status: vault accounting plus index reachability.
///
/// Always 200; an unreachable index shows up as `status: "degraded"` with
/// per-part detail rather than failing the probe itself.
pub async fn service_status(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let vault_stats = state.vault.stats().await?;
    let index_health = state.index.health().await;

    let status = if index_health.reachable {
        "ok"
    } else {
        "degraded"
    };

    Ok(Json(serde_json::json!({
        "status": status,
        "vault": vault_stats,
        "index": index_health,
    })))
}
