//! # archivist-index
//!
//! Client abstraction for the external document-indexing / RAG service.
//!
//! The service owns the hard parts (chunking, embeddings, vector search,
//! answer generation); this crate provides:
//! - The [`IndexBackend`] trait the API server programs against
//! - An HTTP implementation over `reqwest`
//! - A deterministic in-memory mock for tests

pub mod http;
pub mod mock;

use async_trait::async_trait;

use archivist_core::{
    AnalysisReport, Document, DocumentChunk, IndexHealth, NeighborHit, QueryAnswer, Result,
    SearchHit,
};

/// Document index / RAG service backend.
#[async_trait]
pub trait IndexBackend: Send + Sync {
    /// Register a document's content with the index.
    async fn add_document(&self, document: &Document, data: &[u8]) -> Result<()>;

    /// Remove a document from the index. Unknown hashes are not an error.
    async fn remove_document(&self, content_hash: &str) -> Result<()>;

    /// Keyword/semantic search over the indexed corpus.
    async fn search(&self, query: &str, top_k: usize, cutoff: f32) -> Result<Vec<SearchHit>>;

    /// Answer a natural-language question over the corpus.
    ///
    /// `prompt` is the fully formatted instruction built by the caller;
    /// `question` is the raw question used for retrieval.
    async fn query(&self, question: &str, prompt: &str, top_k: usize) -> Result<QueryAnswer>;

    /// Paginate the chunks of one indexed document.
    async fn list_chunks(
        &self,
        content_hash: &str,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<DocumentChunk>, usize)>;

    /// Find documents semantically close to the given one.
    async fn neighbors(&self, content_hash: &str, top_k: usize) -> Result<Vec<NeighborHit>>;

    /// Index-side analysis of a single document.
    async fn analyze(&self, content_hash: &str) -> Result<AnalysisReport>;

    /// Drop the entire index. Returns the number of documents removed.
    async fn clear(&self) -> Result<u64>;

    /// Reachability and corpus-size probe.
    async fn health(&self) -> IndexHealth;
}

pub use http::HttpIndexBackend;
pub use mock::MockIndexBackend;
