//! Uniform tool-execution dispatch surface.
//!
//! `POST /api/tools/execute` routes named operations to the same service
//! paths the REST routes use, with one response envelope:
//! `{success: true, result}` or `{success: false, error}`. Tool-level
//! failures are HTTP 200; only a malformed envelope (400) or an unknown
//! tool name (404) surfaces as an HTTP error.

use std::time::Instant;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use archivist_core::{Error, PromptStyle, Result as CoreResult};

use crate::error::ApiError;
use crate::handlers::{documents, search};
use crate::AppState;

/// Known tool names, in dispatch order.
pub const TOOL_NAMES: &[&str] = &[
    "file.import",
    "file.delete",
    "index.search",
    "index.clear",
    "rag.query",
    "vault.stats",
];

#[derive(Debug, Deserialize)]
pub struct ToolRequest {
    pub name: String,
    #[serde(default)]
    pub params: Value,
}

/// Uniform tool response envelope.
#[derive(Debug, Serialize)]
pub struct ToolResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResponse {
    fn ok(result: Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(message.into()),
        }
    }
}

/// Execute a named tool against the application state.
///
/// Unknown names are an `Err` (HTTP 404); every other failure is folded
/// into the `{success: false, error}` envelope.
pub async fn execute_tool(
    state: &AppState,
    name: &str,
    params: Value,
) -> Result<ToolResponse, ApiError> {
    if !TOOL_NAMES.contains(&name) {
        return Err(ApiError::NotFound(format!("Unknown tool: {}", name)));
    }

    let start = Instant::now();
    let outcome = dispatch(state, name, params).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    let response = match outcome {
        Ok(result) => ToolResponse::ok(result),
        Err(e) => ToolResponse::err(e.to_string()),
    };

    info!(
        tool = name,
        success = response.success,
        duration_ms,
        op = "execute_tool",
        "tool executed"
    );

    Ok(response)
}

fn decode_params<T: for<'de> Deserialize<'de>>(params: Value) -> CoreResult<T> {
    serde_json::from_value(params)
        .map_err(|e| Error::InvalidInput(format!("Invalid tool params: {}", e)))
}

#[derive(Deserialize)]
struct FileImportParams {
    filename: String,
    data_base64: String,
    #[serde(default)]
    index: Option<bool>,
}

#[derive(Deserialize)]
struct FileDeleteParams {
    content_hash: String,
}

#[derive(Deserialize)]
struct IndexSearchParams {
    query: String,
    #[serde(default)]
    top_k: Option<usize>,
    #[serde(default)]
    similarity_cutoff: Option<f32>,
}

#[derive(Deserialize)]
struct RagQueryParams {
    question: String,
    #[serde(default)]
    top_k: Option<usize>,
    #[serde(default)]
    style: Option<PromptStyle>,
}

async fn dispatch(state: &AppState, name: &str, params: Value) -> CoreResult<Value> {
    match name {
        "file.import" => {
            let p: FileImportParams = decode_params(params)?;
            let data = base64::engine::general_purpose::STANDARD
                .decode(&p.data_base64)
                .map_err(|_| Error::InvalidInput("data_base64 is not valid base64".into()))?;
            let settings = state.settings.get().await;
            let register = p.index.unwrap_or(settings.auto_index);
            let receipt = documents::import_bytes(state, &p.filename, &data, register).await?;
            Ok(serde_json::to_value(receipt)?)
        }
        "file.delete" => {
            let p: FileDeleteParams = decode_params(params)?;
            let document = state.vault.get_document(&p.content_hash).await?;
            state.vault.delete(&p.content_hash).await?;
            // Best-effort, matching the delete route; the blob is already gone.
            if let Err(e) = state.index.remove_document(&document.content_hash).await {
                tracing::warn!(
                    content_hash = %document.content_hash,
                    error = %e,
                    op = "execute_tool",
                    "index removal failed for deleted document"
                );
            }
            Ok(serde_json::json!({ "deleted": document.content_hash }))
        }
        "index.search" => {
            let p: IndexSearchParams = decode_params(params)?;
            if p.query.trim().is_empty() {
                return Err(Error::InvalidInput("query must not be empty".into()));
            }
            let settings = state.settings.get().await;
            let hits = state
                .index
                .search(
                    p.query.trim(),
                    p.top_k.unwrap_or(settings.top_k),
                    p.similarity_cutoff.unwrap_or(settings.similarity_cutoff),
                )
                .await?;
            Ok(serde_json::json!({ "hits": hits }))
        }
        "index.clear" => {
            let removed = state.index.clear().await?;
            Ok(serde_json::json!({ "removed": removed }))
        }
        "rag.query" => {
            let p: RagQueryParams = decode_params(params)?;
            let (answer, themes, elapsed_ms) =
                search::run_query(state, &p.question, p.top_k, p.style).await?;
            Ok(serde_json::json!({
                "answer": answer.answer,
                "sources": answer.sources,
                "themes": themes,
                "elapsed_ms": elapsed_ms,
            }))
        }
        "vault.stats" => {
            let stats = state.vault.stats().await?;
            Ok(serde_json::to_value(stats)?)
        }
        // Guarded by the TOOL_NAMES check in execute_tool.
        other => Err(Error::Internal(format!("unroutable tool: {}", other))),
    }
}

/// `POST /api/tools/execute` route.
///
/// The envelope is decoded manually so a missing `name` or wrong field
/// type maps to 400 rather than axum's generic rejection.
pub async fn execute_tool_route(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let request: ToolRequest = serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid tool request: {}", e)))?;
    let response = execute_tool(&state, &request.name, request.params).await?;
    Ok(Json(response))
}
