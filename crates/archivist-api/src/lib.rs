//! archivist-api - HTTP API server for life-archivist.
//!
//! Thin route handlers over the vault and the external index service:
//! validate input, delegate, shape the JSON response, map failures onto
//! status codes (400 validation, 404 not found, 500 internal, 503 index
//! unavailable).

pub mod error;
pub mod handlers;
pub mod tools;
pub mod watcher;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use archivist_core::defaults;
use archivist_core::SettingsStore;
use archivist_index::IndexBackend;
use archivist_vault::Vault;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// log correlation when tracing an import through vault and index calls.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub vault: Arc<Vault>,
    pub index: Arc<dyn IndexBackend>,
    pub settings: SettingsStore,
}

impl AppState {
    pub fn new(vault: Arc<Vault>, index: Arc<dyn IndexBackend>, settings: SettingsStore) -> Self {
        Self {
            vault,
            index,
            settings,
        }
    }
}

// =============================================================================
// STANDARD RESPONSE TYPES
// =============================================================================

/// Standardized pagination metadata for list responses.
#[derive(Serialize, Deserialize, Debug)]
pub struct PaginationMeta {
    /// Total number of items matching the query (across all pages)
    pub total: usize,
    /// Maximum number of items per page (request parameter)
    pub limit: usize,
    /// Number of items skipped (request parameter)
    pub offset: usize,
    /// True if more items are available after this page
    pub has_more: bool,
}

/// Standardized list response wrapper with pagination metadata.
///
/// All list endpoints return this structure.
#[derive(Serialize, Deserialize, Debug)]
pub struct ListResponse<T> {
    /// The list of items for the current page
    pub data: Vec<T>,
    /// Pagination metadata
    pub pagination: PaginationMeta,
}

impl<T: Serialize> ListResponse<T> {
    /// Create a new paginated list response.
    pub fn new(data: Vec<T>, total: usize, limit: usize, offset: usize) -> Self {
        let has_more = offset + data.len() < total;
        Self {
            data,
            pagination: PaginationMeta {
                total,
                limit,
                offset,
                has_more,
            },
        }
    }
}

/// Common pagination query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl PageParams {
    /// Resolve against a default limit, rejecting out-of-range values.
    pub fn resolve(&self, default_limit: usize) -> Result<(usize, usize), error::ApiError> {
        let limit = self.limit.unwrap_or(default_limit);
        if limit < 1 || limit > defaults::PAGE_LIMIT_MAX {
            return Err(error::ApiError::BadRequest(format!(
                "limit must be between 1 and {}",
                defaults::PAGE_LIMIT_MAX
            )));
        }
        Ok((limit, self.offset.unwrap_or(defaults::PAGE_OFFSET)))
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the full application router with middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::system::health_check))
        .route("/api/status", get(handlers::system::service_status))
        .route("/api/documents/import", post(handlers::documents::import_document))
        .route("/api/documents", get(handlers::documents::list_documents))
        .route("/api/documents/:hash", get(handlers::documents::get_document))
        .route("/api/documents/:hash", delete(handlers::documents::delete_document))
        .route(
            "/api/documents/:hash/download",
            get(handlers::documents::download_document),
        )
        .route(
            "/api/documents/:hash/chunks",
            get(handlers::documents::list_document_chunks),
        )
        .route(
            "/api/documents/:hash/neighbors",
            get(handlers::documents::document_neighbors),
        )
        .route(
            "/api/documents/:hash/analysis",
            get(handlers::documents::analyze_document),
        )
        .route("/api/search", post(handlers::search::search))
        .route("/api/query", post(handlers::search::query))
        .route("/api/vault/stats", get(handlers::vault::vault_stats))
        .route("/api/vault/clear", post(handlers::vault::clear_vault))
        .route(
            "/api/vault/:directory/files",
            get(handlers::vault::list_vault_files),
        )
        .route("/api/settings", get(handlers::settings::get_settings))
        .route("/api/settings", patch(handlers::settings::update_settings))
        .route("/api/settings/reset", post(handlers::settings::reset_settings))
        .route("/api/settings/export", get(handlers::settings::export_settings))
        .route("/api/tools/execute", post(tools::execute_tool_route))
        .layer(RequestBodyLimitLayer::new(defaults::MAX_BODY_BYTES))
        .layer(build_cors_layer())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS allow-list from `ARCHIVIST_CORS_ORIGINS` (comma-separated).
///
/// Unset means a permissive policy for local development.
fn build_cors_layer() -> CorsLayer {
    match std::env::var("ARCHIVIST_CORS_ORIGINS") {
        Ok(origins) if !origins.trim().is_empty() => {
            let list: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(list))
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any)
        }
        _ => CorsLayer::permissive(),
    }
}
