//! Mock index backend for deterministic testing.
//!
//! Keeps an in-memory corpus and ranks by term overlap, so API tests get
//! stable scores without a running index service. Supports canned answers,
//! a call log, and an injectable failure for exercising 503 paths.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use archivist_core::defaults;
use archivist_core::{
    classify_themes, AnalysisReport, Document, DocumentChunk, Error, IndexHealth, NeighborHit,
    QueryAnswer, Result, SearchHit, SourceNode,
};

use crate::IndexBackend;

/// Chunk size used by the mock when splitting document text.
const MOCK_CHUNK_CHARS: usize = 200;

#[derive(Debug, Clone)]
struct IndexedDoc {
    filename: String,
    text: String,
}

#[derive(Default)]
struct MockState {
    // BTreeMap keeps iteration (and therefore tie-breaking) deterministic.
    docs: BTreeMap<String, IndexedDoc>,
    canned_answer: Option<String>,
    fail_with: Option<String>,
    calls: Vec<String>,
}

/// Deterministic in-memory index backend.
#[derive(Clone, Default)]
pub struct MockIndexBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockIndexBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the answer returned by `query`.
    pub fn with_canned_answer(self, answer: impl Into<String>) -> Self {
        self.state.lock().unwrap().canned_answer = Some(answer.into());
        self
    }

    /// Make every subsequent operation fail as `Error::Unavailable`.
    pub fn set_unavailable(&self, reason: impl Into<String>) {
        self.state.lock().unwrap().fail_with = Some(reason.into());
    }

    /// Restore normal operation after `set_unavailable`.
    pub fn set_available(&self) {
        self.state.lock().unwrap().fail_with = None;
    }

    /// Names of operations invoked so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of documents currently indexed.
    pub fn document_count(&self) -> usize {
        self.state.lock().unwrap().docs.len()
    }

    fn check(&self, op: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(op.to_string());
        match &state.fail_with {
            Some(reason) => Err(Error::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    fn ranked(&self, query: &str, top_k: usize, cutoff: f32) -> Vec<(String, IndexedDoc, f32)> {
        let query_terms = terms(query);
        if query_terms.is_empty() {
            return Vec::new();
        }
        let state = self.state.lock().unwrap();
        let mut scored: Vec<(String, IndexedDoc, f32)> = state
            .docs
            .iter()
            .filter_map(|(hash, doc)| {
                let doc_terms = terms(&format!("{} {}", doc.filename, doc.text));
                let overlap = query_terms.intersection(&doc_terms).count();
                let score = overlap as f32 / query_terms.len() as f32;
                if score > 0.0 && score >= cutoff {
                    Some((hash.clone(), doc.clone(), score))
                } else {
                    None
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(top_k);
        scored
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(|t| t.to_string())
        .collect()
}

fn snippet(text: &str) -> String {
    text.chars().take(defaults::SNIPPET_LENGTH).collect()
}

#[async_trait]
impl IndexBackend for MockIndexBackend {
    async fn add_document(&self, document: &Document, data: &[u8]) -> Result<()> {
        self.check("add_document")?;
        let text = String::from_utf8_lossy(data).to_string();
        self.state.lock().unwrap().docs.insert(
            document.content_hash.clone(),
            IndexedDoc {
                filename: document.filename.clone(),
                text,
            },
        );
        Ok(())
    }

    async fn remove_document(&self, content_hash: &str) -> Result<()> {
        self.check("remove_document")?;
        self.state.lock().unwrap().docs.remove(content_hash);
        Ok(())
    }

    async fn search(&self, query: &str, top_k: usize, cutoff: f32) -> Result<Vec<SearchHit>> {
        self.check("search")?;
        Ok(self
            .ranked(query, top_k, cutoff)
            .into_iter()
            .map(|(hash, doc, score)| SearchHit {
                content_hash: hash,
                filename: doc.filename,
                score,
                snippet: snippet(&doc.text),
            })
            .collect())
    }

    async fn query(&self, question: &str, _prompt: &str, top_k: usize) -> Result<QueryAnswer> {
        self.check("query")?;
        let sources: Vec<SourceNode> = self
            .ranked(question, top_k, 0.0)
            .into_iter()
            .map(|(hash, doc, score)| SourceNode {
                content_hash: hash,
                filename: doc.filename,
                score,
                excerpt: snippet(&doc.text),
            })
            .collect();

        let canned = self.state.lock().unwrap().canned_answer.clone();
        let answer = canned.unwrap_or_else(|| {
            if sources.is_empty() {
                "The archive contains no sources relevant to that question.".to_string()
            } else {
                format!("Answer derived from {} archived source(s) [1].", sources.len())
            }
        });

        Ok(QueryAnswer { answer, sources })
    }

    async fn list_chunks(
        &self,
        content_hash: &str,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<DocumentChunk>, usize)> {
        self.check("list_chunks")?;
        let state = self.state.lock().unwrap();
        let doc = state
            .docs
            .get(content_hash)
            .ok_or_else(|| Error::DocumentNotFound(content_hash.to_string()))?;

        let chars: Vec<char> = doc.text.chars().collect();
        let chunks: Vec<DocumentChunk> = chars
            .chunks(MOCK_CHUNK_CHARS)
            .enumerate()
            .map(|(position, window)| DocumentChunk {
                document_hash: content_hash.to_string(),
                position,
                text: window.iter().collect(),
            })
            .collect();

        let total = chunks.len();
        let page = chunks.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    async fn neighbors(&self, content_hash: &str, top_k: usize) -> Result<Vec<NeighborHit>> {
        self.check("neighbors")?;
        let state = self.state.lock().unwrap();
        let doc = state
            .docs
            .get(content_hash)
            .ok_or_else(|| Error::DocumentNotFound(content_hash.to_string()))?;
        let doc_terms = terms(&doc.text);
        if doc_terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<NeighborHit> = state
            .docs
            .iter()
            .filter(|(hash, _)| hash.as_str() != content_hash)
            .filter_map(|(hash, other)| {
                let overlap = doc_terms.intersection(&terms(&other.text)).count();
                let score = overlap as f32 / doc_terms.len() as f32;
                if score > 0.0 {
                    Some(NeighborHit {
                        content_hash: hash.clone(),
                        filename: other.filename.clone(),
                        score,
                    })
                } else {
                    None
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.content_hash.cmp(&b.content_hash))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn analyze(&self, content_hash: &str) -> Result<AnalysisReport> {
        self.check("analyze")?;
        let state = self.state.lock().unwrap();
        let doc = state
            .docs
            .get(content_hash)
            .ok_or_else(|| Error::DocumentNotFound(content_hash.to_string()))?;
        let total_characters = doc.text.chars().count();
        Ok(AnalysisReport {
            content_hash: content_hash.to_string(),
            chunk_count: total_characters.div_ceil(MOCK_CHUNK_CHARS).max(1),
            total_characters,
            themes: classify_themes(&doc.text)
                .into_iter()
                .map(|t| t.as_str().to_string())
                .collect(),
        })
    }

    async fn clear(&self) -> Result<u64> {
        self.check("clear")?;
        let mut state = self.state.lock().unwrap();
        let removed = state.docs.len() as u64;
        state.docs.clear();
        Ok(removed)
    }

    async fn health(&self) -> IndexHealth {
        let state = self.state.lock().unwrap();
        match &state.fail_with {
            Some(reason) => IndexHealth {
                reachable: false,
                document_count: None,
                detail: Some(reason.clone()),
            },
            None => IndexHealth {
                reachable: true,
                document_count: Some(state.docs.len() as u64),
                detail: None,
            },
        }
    }
}
