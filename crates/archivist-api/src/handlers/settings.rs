//! Settings routes: get, partial update, reset, export.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use archivist_core::SettingsUpdate;

use crate::error::ApiError;
use crate::AppState;

/// Current settings snapshot.
pub async fn get_settings(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.settings.get().await)
}

/// Apply a partial settings update.
///
/// The body is decoded manually so unknown fields and bad values map to
/// 400 rather than axum's generic rejection.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let update: SettingsUpdate = serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid settings update: {}", e)))?;

    let settings = state.settings.update(update).await?;
    Ok(Json(settings))
}

/// Reset settings back to the startup defaults.
pub async fn reset_settings(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.settings.reset().await)
}

/// Export the current settings as YAML.
pub async fn export_settings(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let yaml = state.settings.export_yaml().await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/yaml")],
        yaml,
    ))
}
