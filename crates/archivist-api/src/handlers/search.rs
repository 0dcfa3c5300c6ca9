//! Search and RAG query routes.

use std::time::Instant;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use archivist_core::defaults;
use archivist_core::{
    build_rag_prompt, classify_themes, ContextBlock, PromptStyle, SearchHit, SourceNode,
};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub top_k: Option<usize>,
    pub similarity_cutoff: Option<f32>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    query: String,
    results: Vec<SearchHit>,
    total: usize,
    elapsed_ms: u64,
}

fn validate_top_k(top_k: usize) -> Result<usize, archivist_core::Error> {
    if top_k < 1 || top_k > defaults::TOP_K_MAX {
        return Err(archivist_core::Error::InvalidInput(format!(
            "top_k must be between 1 and {}",
            defaults::TOP_K_MAX
        )));
    }
    Ok(top_k)
}

/// Keyword/semantic search over the indexed corpus.
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let query = request.query.trim().to_string();
    if query.is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".into()));
    }

    let settings = state.settings.get().await;
    let top_k = validate_top_k(request.top_k.unwrap_or(settings.top_k))?;
    let cutoff = request
        .similarity_cutoff
        .unwrap_or(settings.similarity_cutoff);
    if !(0.0..=1.0).contains(&cutoff) {
        return Err(ApiError::BadRequest(
            "similarity_cutoff must be between 0.0 and 1.0".into(),
        ));
    }

    let start = Instant::now();
    let results = state.index.search(&query, top_k, cutoff).await?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    info!(
        query = %query,
        result_count = results.len(),
        duration_ms = elapsed_ms,
        op = "search",
        "search complete"
    );

    let total = results.len();
    Ok(Json(SearchResponse {
        query,
        results,
        total,
        elapsed_ms,
    }))
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    pub top_k: Option<usize>,
    pub style: Option<PromptStyle>,
}

#[derive(Debug, Serialize)]
struct QueryResponse {
    answer: String,
    sources: Vec<SourceNode>,
    themes: Vec<String>,
    elapsed_ms: u64,
}

/// Run the RAG pipeline: retrieve, format the prompt, query, classify.
///
/// Retrieval happens twice by design: a search pass feeds the prompt
/// formatter, then the index's query endpoint produces the grounded answer
/// with its own source attribution. Shared by the query route and the
/// `rag.query` tool.
pub(crate) async fn run_query(
    state: &AppState,
    question: &str,
    top_k: Option<usize>,
    style: Option<PromptStyle>,
) -> archivist_core::Result<(archivist_core::QueryAnswer, Vec<String>, u64)> {
    let question = question.trim();
    if question.is_empty() {
        return Err(archivist_core::Error::InvalidInput(
            "question must not be empty".into(),
        ));
    }

    let settings = state.settings.get().await;
    let top_k = validate_top_k(top_k.unwrap_or(settings.top_k))?;
    let style = style.unwrap_or(settings.prompt_style);

    let start = Instant::now();

    let hits = state
        .index
        .search(question, top_k, settings.similarity_cutoff)
        .await?;
    let blocks: Vec<ContextBlock> = hits
        .iter()
        .map(|hit| ContextBlock {
            source: hit.filename.clone(),
            text: hit.snippet.clone(),
            score: hit.score,
        })
        .collect();
    let prompt = build_rag_prompt(question, &blocks, style);

    let answer = state.index.query(question, &prompt, top_k).await?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    // Classify the answer together with its evidence so a one-line answer
    // still picks up the themes of its sources.
    let mut theme_text = answer.answer.clone();
    for source in &answer.sources {
        theme_text.push('\n');
        theme_text.push_str(&source.excerpt);
    }
    let themes: Vec<String> = classify_themes(&theme_text)
        .into_iter()
        .map(|t| t.as_str().to_string())
        .collect();

    info!(
        query = %question,
        result_count = answer.sources.len(),
        duration_ms = elapsed_ms,
        op = "query",
        "query answered"
    );

    Ok((answer, themes, elapsed_ms))
}

/// Answer a natural-language question over the archive (RAG).
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (answer, themes, elapsed_ms) =
        run_query(&state, &request.question, request.top_k, request.style).await?;

    Ok(Json(QueryResponse {
        answer: answer.answer,
        sources: answer.sources,
        themes,
        elapsed_ms,
    }))
}
