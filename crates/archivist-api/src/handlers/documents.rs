//! Document import, retrieval, and index-backed inspection routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use archivist_core::defaults;
use archivist_core::{ImportReceipt, Result as CoreResult};

use crate::error::ApiError;
use crate::{AppState, ListResponse, PageParams};

/// Import a file's bytes: vault first, then index registration.
///
/// Index failures never fail the import; the receipt reports
/// `indexed: false` and the document can be re-registered later. Shared by
/// the import route, the tool executor, and the inbox watcher.
pub(crate) async fn import_bytes(
    state: &AppState,
    filename: &str,
    data: &[u8],
    register: bool,
) -> CoreResult<ImportReceipt> {
    let mut receipt = state.vault.store(filename, data).await?;

    if register {
        match state.index.add_document(&receipt.document, data).await {
            Ok(()) => {
                receipt.document = state
                    .vault
                    .mark_indexed(&receipt.document.content_hash, true)
                    .await?;
            }
            Err(e) => {
                warn!(
                    content_hash = %receipt.document.content_hash,
                    error = %e,
                    op = "import",
                    "index registration failed; document stored unindexed"
                );
            }
        }
    }

    info!(
        content_hash = %receipt.document.content_hash,
        size_bytes = receipt.document.size_bytes,
        deduplicated = receipt.deduplicated,
        indexed = receipt.document.indexed,
        op = "import",
        "document imported"
    );

    Ok(receipt)
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub filename: String,
    pub data_base64: String,
    /// Override the settings-level auto_index flag for this import.
    #[serde(default)]
    pub index: Option<bool>,
}

/// Import a document from a base64 payload.
pub async fn import_document(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.filename.trim().is_empty() {
        return Err(ApiError::BadRequest("filename must not be empty".into()));
    }

    let data = base64::engine::general_purpose::STANDARD
        .decode(&request.data_base64)
        .map_err(|_| ApiError::BadRequest("data_base64 is not valid base64".into()))?;

    let settings = state.settings.get().await;
    let register = request.index.unwrap_or(settings.auto_index);

    let receipt = import_bytes(&state, &request.filename, &data, register).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// List archived documents, newest first.
pub async fn list_documents(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let settings = state.settings.get().await;
    let (limit, offset) = params.resolve(settings.page_limit)?;

    let (documents, total) = state.vault.list_documents(limit, offset).await?;
    Ok(Json(ListResponse::new(documents, total, limit, offset)))
}

/// Fetch document metadata by content hash.
pub async fn get_document(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.vault.get_document(&hash).await?;
    Ok(Json(document))
}

#[derive(Debug, Serialize)]
struct DownloadResponse {
    data: String,
    content_type: String,
    filename: String,
}

/// Download document content as base64.
pub async fn download_document(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (data, document) = state.vault.open_document(&hash).await?;

    Ok(Json(DownloadResponse {
        data: base64::engine::general_purpose::STANDARD.encode(&data),
        content_type: document.content_type,
        filename: document.filename,
    }))
}

/// Delete a document from the vault and the index.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.vault.get_document(&hash).await?;
    state.vault.delete(&hash).await?;

    // Index removal is best-effort; the blob is already gone.
    if let Err(e) = state.index.remove_document(&document.content_hash).await {
        warn!(
            content_hash = %document.content_hash,
            error = %e,
            op = "delete",
            "index removal failed for deleted document"
        );
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Paginate the chunks of one indexed document.
pub async fn list_document_chunks(
    State(state): State<AppState>,
    Path(hash): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let settings = state.settings.get().await;
    let (limit, offset) = params.resolve(settings.page_limit)?;

    let document = state.vault.get_document(&hash).await?;
    let (chunks, total) = state
        .index
        .list_chunks(&document.content_hash, limit, offset)
        .await?;
    Ok(Json(ListResponse::new(chunks, total, limit, offset)))
}

#[derive(Debug, Deserialize)]
pub struct NeighborParams {
    pub top_k: Option<usize>,
}

/// Find documents semantically close to the given one.
pub async fn document_neighbors(
    State(state): State<AppState>,
    Path(hash): Path<String>,
    Query(params): Query<NeighborParams>,
) -> Result<impl IntoResponse, ApiError> {
    let settings = state.settings.get().await;
    let top_k = params.top_k.unwrap_or(settings.top_k);
    if top_k < 1 || top_k > defaults::TOP_K_MAX {
        return Err(ApiError::BadRequest(format!(
            "top_k must be between 1 and {}",
            defaults::TOP_K_MAX
        )));
    }

    let document = state.vault.get_document(&hash).await?;
    let neighbors = state.index.neighbors(&document.content_hash, top_k).await?;
    Ok(Json(serde_json::json!({
        "content_hash": document.content_hash,
        "neighbors": neighbors,
    })))
}

/// Index-side analysis of a single document.
pub async fn analyze_document(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.vault.get_document(&hash).await?;
    let report = state.index.analyze(&document.content_hash).await?;
    Ok(Json(report))
}
