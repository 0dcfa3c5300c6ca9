//! Core data models for life-archivist.
//!
//! These types are shared across the vault, index client, and API crates
//! and represent the core domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// DOCUMENT TYPES
// =============================================================================

/// Metadata record for an archived document.
///
/// This is the content of the vault's JSON sidecar; the blob itself is
/// addressed by `content_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    /// Content hash in `blake3:<64-hex>` format.
    pub content_hash: String,
    /// Sanitized original filename.
    pub filename: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub imported_at: DateTime<Utc>,
    /// Whether the document was registered with the index service.
    pub indexed: bool,
}

/// Result of importing a file into the vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReceipt {
    pub document: Document,
    /// True when an identical blob already existed and was reused.
    pub deduplicated: bool,
    /// Vault-relative path of the stored blob.
    pub stored_path: String,
}

// =============================================================================
// VAULT ACCOUNTING
// =============================================================================

/// A single file within a managed vault directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultFileEntry {
    pub name: String,
    /// Path relative to the vault base directory.
    pub path: String,
    pub size_bytes: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

/// File count and byte accounting for one managed directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryStats {
    pub directory: String,
    pub file_count: u64,
    pub total_bytes: u64,
}

/// Aggregated vault accounting across all managed directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultStats {
    pub directories: Vec<DirectoryStats>,
    pub total_files: u64,
    pub total_bytes: u64,
}

// =============================================================================
// SEARCH / RAG TYPES
// =============================================================================

/// A single hit from keyword/semantic search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub content_hash: String,
    pub filename: String,
    pub score: f32,
    /// Short excerpt around the match.
    pub snippet: String,
}

/// A retrieved source backing a RAG answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceNode {
    pub content_hash: String,
    pub filename: String,
    pub score: f32,
    pub excerpt: String,
}

/// Answer produced by the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub sources: Vec<SourceNode>,
}

/// One chunk of an indexed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub document_hash: String,
    /// Zero-based position of the chunk within the document.
    pub position: usize,
    pub text: String,
}

/// A semantically similar document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborHit {
    pub content_hash: String,
    pub filename: String,
    pub score: f32,
}

/// Index-side analysis of a single document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub content_hash: String,
    pub chunk_count: usize,
    pub total_characters: usize,
    #[serde(default)]
    pub themes: Vec<String>,
}

/// Health report from the index service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexHealth {
    pub reachable: bool,
    pub document_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_round_trips_through_json() {
        let doc = Document {
            id: Uuid::now_v7(),
            content_hash: format!("blake3:{}", "ab".repeat(32)),
            filename: "tax-return-2024.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            size_bytes: 1234,
            imported_at: Utc::now(),
            indexed: true,
        };
        let json = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content_hash, doc.content_hash);
        assert_eq!(back.size_bytes, 1234);
        assert!(back.indexed);
    }

    #[test]
    fn test_analysis_report_themes_default_empty() {
        let json = r#"{"content_hash":"blake3:00","chunk_count":3,"total_characters":900}"#;
        let report: AnalysisReport = serde_json::from_str(json).unwrap();
        assert!(report.themes.is_empty());
    }
}
