//! Search, RAG query, and index-backed document inspection routes.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use archivist_index::MockIndexBackend;
use common::{TestApp, MISSING_HASH};

#[tokio::test]
async fn test_search_returns_ranked_hits() {
    let app = TestApp::spawn().await;
    app.import_text("flight.txt", "flight itinerary lisbon june")
        .await;
    app.import_text("grocery.txt", "eggs milk flour").await;

    let (status, body) = app
        .post("/api/search", json!({ "query": "lisbon flight" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["results"][0]["filename"], "flight.txt");
    assert!(body["elapsed_ms"].is_u64());
}

#[tokio::test]
async fn test_search_rejects_empty_query() {
    let app = TestApp::spawn().await;
    let (status, body) = app.post("/api/search", json!({ "query": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("query"));
}

#[tokio::test]
async fn test_search_rejects_out_of_range_top_k() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .post("/api/search", json!({ "query": "x", "top_k": 0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/search", json!({ "query": "x", "top_k": 51 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_rejects_out_of_range_cutoff() {
    let app = TestApp::spawn().await;
    let (status, _) = app
        .post(
            "/api/search",
            json!({ "query": "x", "similarity_cutoff": 1.5 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_maps_index_outage_to_503() {
    let app = TestApp::spawn().await;
    app.index.set_unavailable("index offline");

    let (status, body) = app.post("/api/search", json!({ "query": "anything" })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_query_answers_with_sources_and_themes() {
    let index = MockIndexBackend::new().with_canned_answer("Your flight left on June 3rd [1].");
    let app = TestApp::spawn_with_index(index).await;
    app.import_text("itinerary.txt", "flight itinerary lisbon hotel booking confirmation")
        .await;

    let (status, body) = app
        .post("/api/query", json!({ "question": "when was my lisbon flight" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Your flight left on June 3rd [1].");
    assert_eq!(body["sources"].as_array().unwrap().len(), 1);
    // Evidence mentions flight/itinerary/hotel, so travel must classify.
    assert!(body["themes"]
        .as_array()
        .unwrap()
        .contains(&json!("travel")));
}

#[tokio::test]
async fn test_query_rejects_empty_question() {
    let app = TestApp::spawn().await;
    let (status, _) = app.post("/api/query", json!({ "question": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_query_maps_index_outage_to_503() {
    let app = TestApp::spawn().await;
    app.index.set_unavailable("maintenance");

    let (status, _) = app
        .post("/api/query", json!({ "question": "anything at all" }))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_document_chunks_paginate() {
    let app = TestApp::spawn().await;
    let text = "chunk ".repeat(100); // 600 chars, 3 mock chunks
    let receipt = app.import_text("long.txt", &text).await;
    let hash = receipt["document"]["content_hash"].as_str().unwrap();

    let (status, body) = app
        .get(&format!("/api/documents/{}/chunks?limit=2&offset=0", hash))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["position"], 0);
    assert_eq!(body["pagination"]["has_more"], true);
}

#[tokio::test]
async fn test_chunks_for_unknown_document_is_404() {
    let app = TestApp::spawn().await;
    let (status, _) = app
        .get(&format!("/api/documents/{}/chunks", MISSING_HASH))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_neighbors_exclude_self() {
    let app = TestApp::spawn().await;
    let receipt = app
        .import_text("trip.txt", "lisbon itinerary flight hotel")
        .await;
    app.import_text("hotel.txt", "hotel booking lisbon").await;
    let hash = receipt["document"]["content_hash"].as_str().unwrap();

    let (status, body) = app
        .get(&format!("/api/documents/{}/neighbors", hash))
        .await;

    assert_eq!(status, StatusCode::OK);
    let neighbors = body["neighbors"].as_array().unwrap();
    assert_eq!(neighbors.len(), 1);
    assert_eq!(neighbors[0]["filename"], "hotel.txt");
}

#[tokio::test]
async fn test_neighbors_rejects_zero_top_k() {
    let app = TestApp::spawn().await;
    let receipt = app.import_text("a.txt", "some content").await;
    let hash = receipt["document"]["content_hash"].as_str().unwrap();

    let (status, _) = app
        .get(&format!("/api/documents/{}/neighbors?top_k=0", hash))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analysis_reports_themes() {
    let app = TestApp::spawn().await;
    let receipt = app
        .import_text(
            "invoice.txt",
            "Attached is the invoice and the bank statement of account.",
        )
        .await;
    let hash = receipt["document"]["content_hash"].as_str().unwrap();

    let (status, body) = app
        .get(&format!("/api/documents/{}/analysis", hash))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content_hash"], hash);
    assert!(body["chunk_count"].as_u64().unwrap() >= 1);
    assert_eq!(body["themes"][0], "finance");
}
