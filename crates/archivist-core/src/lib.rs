//! # archivist-core
//!
//! Core types, errors, and shared utilities for the life-archivist service.
//!
//! This crate provides the foundational data structures that the vault,
//! index client, and HTTP API crates depend on.

pub mod defaults;
pub mod error;
pub mod file_safety;
pub mod logging;
pub mod models;
pub mod prompt;
pub mod settings;
pub mod themes;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use file_safety::{detect_content_type, sanitize_filename, validate_file, ValidationResult};
pub use models::*;
pub use prompt::{build_condense_prompt, build_rag_prompt, ContextBlock, PromptStyle};
pub use settings::{Settings, SettingsStore, SettingsUpdate};
pub use themes::{classify_themes, Theme};
