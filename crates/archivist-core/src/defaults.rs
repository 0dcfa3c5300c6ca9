//! Centralized default constants for the life-archivist system.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates reference these constants instead of defining their
//! own magic numbers.

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 7007;

/// Default bind address.
pub const SERVER_HOST: &str = "127.0.0.1";

/// Maximum request body size in bytes (covers base64-encoded uploads).
pub const MAX_BODY_BYTES: usize = 150 * 1024 * 1024;

// =============================================================================
// VAULT
// =============================================================================

/// Default vault base directory.
pub const VAULT_DIR: &str = "./vault";

/// Content-addressed blob directory.
pub const CONTENT_DIR: &str = "content";

/// Thumbnail directory.
pub const THUMBNAILS_DIR: &str = "thumbnails";

/// Scratch directory for in-flight writes.
pub const TEMP_DIR: &str = "temp";

/// Export bundle directory.
pub const EXPORTS_DIR: &str = "exports";

/// Maximum accepted file size for import (bytes).
pub const MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;

// =============================================================================
// INDEX SERVICE
// =============================================================================

/// Default base URL for the external document index / RAG service.
pub const INDEX_URL: &str = "http://localhost:8100";

/// Timeout for index search/add requests (seconds).
pub const INDEX_TIMEOUT_SECS: u64 = 30;

/// Timeout for RAG query requests (seconds). Generation is slow.
pub const QUERY_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// RETRIEVAL
// =============================================================================

/// Default number of results for search and RAG retrieval.
pub const TOP_K: usize = 5;

/// Maximum accepted top_k.
pub const TOP_K_MAX: usize = 50;

/// Default minimum similarity score for search hits.
pub const SIMILARITY_CUTOFF: f32 = 0.0;

/// Character budget for RAG prompt context blocks.
pub const PROMPT_CONTEXT_BUDGET: usize = 6000;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for list endpoints.
pub const PAGE_LIMIT: usize = 50;

/// Maximum accepted page size.
pub const PAGE_LIMIT_MAX: usize = 500;

/// Default page offset.
pub const PAGE_OFFSET: usize = 0;

// =============================================================================
// SNIPPET
// =============================================================================

/// Default snippet/preview length in characters for search results.
pub const SNIPPET_LENGTH: usize = 200;
