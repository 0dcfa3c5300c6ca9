//! # archivist-vault
//!
//! Content-addressed filesystem vault for life-archivist.
//!
//! Files are stored deduplicated under a BLAKE3 content hash with a JSON
//! sidecar carrying the original filename, MIME type, and import metadata.
//! The vault manages four directories: `content`, `thumbnails`, `temp`,
//! and `exports`.

mod store;

pub use store::{compute_content_hash, normalize_hash, storage_rel_path, Vault, VaultDir};
