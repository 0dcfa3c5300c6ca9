//! Shared harness for API integration tests: a router backed by a
//! temp-dir vault and the deterministic mock index.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::Engine;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use archivist_api::{build_router, AppState};
use archivist_core::{Settings, SettingsStore};
use archivist_index::MockIndexBackend;
use archivist_vault::Vault;

/// A well-formed content hash that no document has.
pub const MISSING_HASH: &str =
    "blake3:0000000000000000000000000000000000000000000000000000000000000000";

pub struct TestApp {
    pub router: Router,
    pub index: MockIndexBackend,
    _vault_dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_index(MockIndexBackend::new()).await
    }

    pub async fn spawn_with_index(index: MockIndexBackend) -> Self {
        let vault_dir = TempDir::new().unwrap();
        let vault = Arc::new(Vault::open(vault_dir.path()).await.unwrap());
        let state = AppState::new(
            vault,
            Arc::new(index.clone()),
            SettingsStore::new(Settings::default()),
        );
        Self {
            router: build_router(state),
            index,
            _vault_dir: vault_dir,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        read_json(self.router.clone().oneshot(request).await.unwrap()).await
    }

    pub async fn send_json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        read_json(self.router.clone().oneshot(request).await.unwrap()).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send_json("POST", uri, body).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send_json("PATCH", uri, body).await
    }

    pub async fn delete(&self, uri: &str) -> StatusCode {
        let request = Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.router
            .clone()
            .oneshot(request)
            .await
            .unwrap()
            .status()
    }

    /// Import `text` as a document and return the receipt.
    pub async fn import_text(&self, filename: &str, text: &str) -> Value {
        let (status, receipt) = self
            .post(
                "/api/documents/import",
                json!({
                    "filename": filename,
                    "data_base64": base64::engine::general_purpose::STANDARD.encode(text),
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "import failed: {}", receipt);
        receipt
    }
}

/// Read the response body as JSON; non-JSON bodies come back as a string.
async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return (status, Value::Null);
    }
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}
