//! Process-wide settings store.
//!
//! Settings are seeded from environment variables at startup, can be
//! partially updated at runtime through the API, reset back to the seeded
//! defaults, and exported as YAML. All reads and writes go through a
//! `tokio::sync::RwLock` so handlers share one store cheaply via `Clone`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::defaults;
use crate::error::{Error, Result};
use crate::prompt::PromptStyle;

/// Runtime-tunable configuration for the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Base URL of the external index / RAG service.
    pub index_url: String,
    /// Default number of retrieved results for search and RAG queries.
    pub top_k: usize,
    /// Minimum similarity score for search hits (0.0 disables the cutoff).
    pub similarity_cutoff: f32,
    /// Default page size for list endpoints.
    pub page_limit: usize,
    /// Prompt style used by the RAG query route.
    pub prompt_style: PromptStyle,
    /// Register imported files with the index service automatically.
    pub auto_index: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_url: defaults::INDEX_URL.to_string(),
            top_k: defaults::TOP_K,
            similarity_cutoff: defaults::SIMILARITY_CUTOFF,
            page_limit: defaults::PAGE_LIMIT,
            prompt_style: PromptStyle::Grounded,
            auto_index: true,
        }
    }
}

impl Settings {
    /// Build settings from environment variables, falling back to defaults.
    ///
    /// Recognized variables: `ARCHIVIST_INDEX_URL`, `ARCHIVIST_TOP_K`,
    /// `ARCHIVIST_SIMILARITY_CUTOFF`, `ARCHIVIST_PAGE_LIMIT`,
    /// `ARCHIVIST_AUTO_INDEX`.
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            index_url: std::env::var("ARCHIVIST_INDEX_URL").unwrap_or(base.index_url),
            top_k: env_parse("ARCHIVIST_TOP_K", base.top_k),
            similarity_cutoff: env_parse("ARCHIVIST_SIMILARITY_CUTOFF", base.similarity_cutoff),
            page_limit: env_parse("ARCHIVIST_PAGE_LIMIT", base.page_limit),
            prompt_style: base.prompt_style,
            auto_index: env_parse("ARCHIVIST_AUTO_INDEX", base.auto_index),
        }
    }

    /// Validate numeric bounds.
    fn validate(&self) -> Result<()> {
        if self.top_k < 1 || self.top_k > defaults::TOP_K_MAX {
            return Err(Error::InvalidInput(format!(
                "top_k must be between 1 and {}",
                defaults::TOP_K_MAX
            )));
        }
        if !(0.0..=1.0).contains(&self.similarity_cutoff) {
            return Err(Error::InvalidInput(
                "similarity_cutoff must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.page_limit < 1 || self.page_limit > defaults::PAGE_LIMIT_MAX {
            return Err(Error::InvalidInput(format!(
                "page_limit must be between 1 and {}",
                defaults::PAGE_LIMIT_MAX
            )));
        }
        if self.index_url.trim().is_empty() {
            return Err(Error::InvalidInput("index_url must not be empty".to_string()));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

/// Partial settings update. Unknown fields are rejected at deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsUpdate {
    pub index_url: Option<String>,
    pub top_k: Option<usize>,
    pub similarity_cutoff: Option<f32>,
    pub page_limit: Option<usize>,
    pub prompt_style: Option<PromptStyle>,
    pub auto_index: Option<bool>,
}

impl SettingsUpdate {
    fn apply(&self, base: &Settings) -> Settings {
        Settings {
            index_url: self.index_url.clone().unwrap_or_else(|| base.index_url.clone()),
            top_k: self.top_k.unwrap_or(base.top_k),
            similarity_cutoff: self.similarity_cutoff.unwrap_or(base.similarity_cutoff),
            page_limit: self.page_limit.unwrap_or(base.page_limit),
            prompt_style: self.prompt_style.unwrap_or(base.prompt_style),
            auto_index: self.auto_index.unwrap_or(base.auto_index),
        }
    }
}

/// Shared, process-wide settings store.
#[derive(Clone)]
pub struct SettingsStore {
    current: Arc<RwLock<Settings>>,
    seeded: Settings,
}

impl SettingsStore {
    /// Create a store seeded with the given settings.
    pub fn new(seeded: Settings) -> Self {
        Self {
            current: Arc::new(RwLock::new(seeded.clone())),
            seeded,
        }
    }

    /// Create a store seeded from environment variables.
    pub fn from_env() -> Self {
        Self::new(Settings::from_env())
    }

    /// Snapshot of the current settings.
    pub async fn get(&self) -> Settings {
        self.current.read().await.clone()
    }

    /// Apply a partial update. A rejected update leaves settings unchanged.
    pub async fn update(&self, update: SettingsUpdate) -> Result<Settings> {
        let mut guard = self.current.write().await;
        let candidate = update.apply(&guard);
        candidate.validate()?;
        debug!(op = "settings_update", "settings updated");
        *guard = candidate.clone();
        Ok(candidate)
    }

    /// Reset settings back to the values seeded at startup.
    pub async fn reset(&self) -> Settings {
        let mut guard = self.current.write().await;
        *guard = self.seeded.clone();
        guard.clone()
    }

    /// Export the current settings as YAML.
    pub async fn export_yaml(&self) -> Result<String> {
        let snapshot = self.current.read().await.clone();
        serde_yaml::to_string(&snapshot).map_err(|e| Error::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_merges_partial_fields() {
        let store = SettingsStore::new(Settings::default());
        let updated = store
            .update(SettingsUpdate {
                top_k: Some(10),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.top_k, 10);
        assert_eq!(updated.index_url, defaults::INDEX_URL);
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_settings_unchanged() {
        let store = SettingsStore::new(Settings::default());
        let before = store.get().await;
        let err = store
            .update(SettingsUpdate {
                top_k: Some(0),
                index_url: Some("http://other:9".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(store.get().await, before);
    }

    #[tokio::test]
    async fn test_similarity_cutoff_bounds() {
        let store = SettingsStore::new(Settings::default());
        let err = store
            .update(SettingsUpdate {
                similarity_cutoff: Some(1.5),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("similarity_cutoff"));
    }

    #[tokio::test]
    async fn test_reset_restores_seeded_values() {
        let store = SettingsStore::new(Settings::default());
        store
            .update(SettingsUpdate {
                page_limit: Some(100),
                ..Default::default()
            })
            .await
            .unwrap();
        let reset = store.reset().await;
        assert_eq!(reset, Settings::default());
    }

    #[tokio::test]
    async fn test_export_yaml_contains_fields() {
        let store = SettingsStore::new(Settings::default());
        let yaml = store.export_yaml().await.unwrap();
        assert!(yaml.contains("index_url"));
        assert!(yaml.contains("top_k"));
        assert!(yaml.contains("prompt_style"));
    }

    #[test]
    fn test_unknown_update_field_rejected() {
        let err = serde_json::from_str::<SettingsUpdate>(r#"{"no_such_field": 1}"#);
        assert!(err.is_err());
    }
}
