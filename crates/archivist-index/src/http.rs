//! HTTP implementation of [`IndexBackend`].
//!
//! Speaks JSON to the external index / RAG service. Connect and timeout
//! failures surface as `Error::Unavailable` (HTTP 503 at the API edge);
//! any non-2xx response becomes `Error::Index` carrying the body text.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use archivist_core::{
    defaults, AnalysisReport, Document, DocumentChunk, Error, IndexHealth, NeighborHit,
    QueryAnswer, Result, SearchHit,
};

use crate::IndexBackend;

/// HTTP client for the external index service.
pub struct HttpIndexBackend {
    client: Client,
    query_client: Client,
    base_url: String,
}

impl HttpIndexBackend {
    /// Create a backend for the given base URL with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeouts(
            base_url,
            defaults::INDEX_TIMEOUT_SECS,
            defaults::QUERY_TIMEOUT_SECS,
        )
    }

    /// Create a backend with explicit timeouts (seconds).
    ///
    /// RAG queries run generation and get a separate, longer timeout than
    /// index maintenance calls.
    pub fn with_timeouts(
        base_url: impl Into<String>,
        index_timeout_secs: u64,
        query_timeout_secs: u64,
    ) -> Self {
        let base_url = base_url.into();
        let client = Client::builder()
            .timeout(Duration::from_secs(index_timeout_secs))
            .build()
            .unwrap_or_default();
        let query_client = Client::builder()
            .timeout(Duration::from_secs(query_timeout_secs))
            .build()
            .unwrap_or_default();

        info!(index_url = %base_url, "Initializing index service client");

        Self {
            client,
            query_client,
            base_url,
        }
    }

    /// Create from environment variables (`ARCHIVIST_INDEX_URL`,
    /// `ARCHIVIST_INDEX_TIMEOUT_SECS`, `ARCHIVIST_QUERY_TIMEOUT_SECS`).
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("ARCHIVIST_INDEX_URL").unwrap_or_else(|_| defaults::INDEX_URL.to_string());
        let index_timeout = std::env::var("ARCHIVIST_INDEX_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::INDEX_TIMEOUT_SECS);
        let query_timeout = std::env::var("ARCHIVIST_QUERY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::QUERY_TIMEOUT_SECS);
        Self::with_timeouts(base_url, index_timeout, query_timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Check the response status and decode the JSON body.
    async fn decode<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Index(format!(
                "index service returned {}: {}",
                status,
                body.chars().take(500).collect::<String>()
            )));
        }
        Ok(response.json().await?)
    }
}

#[derive(Serialize)]
struct AddDocumentRequest<'a> {
    content_hash: &'a str,
    filename: &'a str,
    content_type: &'a str,
    data_base64: String,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    top_k: usize,
    similarity_cutoff: f32,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    question: &'a str,
    prompt: &'a str,
    top_k: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct ChunksResponse {
    chunks: Vec<DocumentChunk>,
    total: usize,
}

#[derive(Deserialize)]
struct NeighborsResponse {
    neighbors: Vec<NeighborHit>,
}

#[derive(Deserialize)]
struct ClearResponse {
    removed: u64,
}

#[derive(Deserialize)]
struct HealthResponse {
    document_count: u64,
}

#[derive(Deserialize)]
struct EmptyResponse {}

#[async_trait]
impl IndexBackend for HttpIndexBackend {
    async fn add_document(&self, document: &Document, data: &[u8]) -> Result<()> {
        let start = Instant::now();
        let request = AddDocumentRequest {
            content_hash: &document.content_hash,
            filename: &document.filename,
            content_type: &document.content_type,
            data_base64: base64::engine::general_purpose::STANDARD.encode(data),
        };
        let response = self
            .client
            .post(self.url("/documents"))
            .json(&request)
            .send()
            .await?;
        let _: EmptyResponse = Self::decode(response).await?;
        debug!(
            content_hash = %document.content_hash,
            duration_ms = start.elapsed().as_millis() as u64,
            op = "add_document",
            "index: document registered"
        );
        Ok(())
    }

    async fn remove_document(&self, content_hash: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/documents/{}", content_hash)))
            .send()
            .await?;
        // Unknown hash: removal is idempotent.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        let _: EmptyResponse = Self::decode(response).await?;
        Ok(())
    }

    async fn search(&self, query: &str, top_k: usize, cutoff: f32) -> Result<Vec<SearchHit>> {
        let start = Instant::now();
        let response = self
            .client
            .post(self.url("/search"))
            .json(&SearchRequest {
                query,
                top_k,
                similarity_cutoff: cutoff,
            })
            .send()
            .await?;
        let decoded: SearchResponse = Self::decode(response).await?;
        debug!(
            result_count = decoded.hits.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            op = "search",
            "index: search complete"
        );
        Ok(decoded.hits)
    }

    async fn query(&self, question: &str, prompt: &str, top_k: usize) -> Result<QueryAnswer> {
        let start = Instant::now();
        let response = self
            .query_client
            .post(self.url("/query"))
            .json(&QueryRequest {
                question,
                prompt,
                top_k,
            })
            .send()
            .await?;
        let answer: QueryAnswer = Self::decode(response).await?;
        debug!(
            result_count = answer.sources.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            op = "query",
            "index: query answered"
        );
        Ok(answer)
    }

    async fn list_chunks(
        &self,
        content_hash: &str,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<DocumentChunk>, usize)> {
        let response = self
            .client
            .get(self.url(&format!(
                "/documents/{}/chunks?limit={}&offset={}",
                content_hash, limit, offset
            )))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::DocumentNotFound(content_hash.to_string()));
        }
        let decoded: ChunksResponse = Self::decode(response).await?;
        Ok((decoded.chunks, decoded.total))
    }

    async fn neighbors(&self, content_hash: &str, top_k: usize) -> Result<Vec<NeighborHit>> {
        let response = self
            .client
            .get(self.url(&format!(
                "/documents/{}/neighbors?top_k={}",
                content_hash, top_k
            )))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::DocumentNotFound(content_hash.to_string()));
        }
        let decoded: NeighborsResponse = Self::decode(response).await?;
        Ok(decoded.neighbors)
    }

    async fn analyze(&self, content_hash: &str) -> Result<AnalysisReport> {
        let response = self
            .client
            .get(self.url(&format!("/documents/{}/analysis", content_hash)))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::DocumentNotFound(content_hash.to_string()));
        }
        Self::decode(response).await
    }

    async fn clear(&self) -> Result<u64> {
        let response = self.client.post(self.url("/clear")).send().await?;
        let decoded: ClearResponse = Self::decode(response).await?;
        info!(removed = decoded.removed, op = "clear", "index: cleared");
        Ok(decoded.removed)
    }

    async fn health(&self) -> IndexHealth {
        match self.client.get(self.url("/health")).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<HealthResponse>().await {
                    Ok(body) => IndexHealth {
                        reachable: true,
                        document_count: Some(body.document_count),
                        detail: None,
                    },
                    Err(e) => IndexHealth {
                        reachable: true,
                        document_count: None,
                        detail: Some(format!("malformed health body: {}", e)),
                    },
                }
            }
            Ok(response) => IndexHealth {
                reachable: false,
                document_count: None,
                detail: Some(format!("health returned {}", response.status())),
            },
            Err(e) => {
                warn!(error = %e, op = "health", "index: unreachable");
                IndexHealth {
                    reachable: false,
                    document_count: None,
                    detail: Some(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let backend = HttpIndexBackend::new("http://localhost:8100/");
        assert_eq!(backend.url("/search"), "http://localhost:8100/search");
    }

    #[tokio::test]
    async fn test_unreachable_service_maps_to_unavailable() {
        // Port 9 (discard) is never listening in test environments.
        let backend = HttpIndexBackend::with_timeouts("http://127.0.0.1:9", 1, 1);
        let err = backend.search("anything", 5, 0.0).await.unwrap_err();
        assert!(matches!(err, Error::Unavailable(_) | Error::Request(_)));

        let health = backend.health().await;
        assert!(!health.reachable);
    }
}
