//! Content-addressed vault store with BLAKE3 deduplication.
//!
//! Layout under the vault base directory:
//!
//! ```text
//! content/{h[0..2]}/{h[2..4]}/{hash}.bin        blob
//! content/{h[0..2]}/{h[2..4]}/{hash}.meta.json  sidecar metadata
//! thumbnails/  temp/  exports/
//! ```
//!
//! Writes are atomic: data lands in `temp/` first, is fsynced, then renamed
//! into place. Sidecars record the original filename, MIME type, size, and
//! import timestamp so the vault can be re-scanned without any database.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use archivist_core::defaults;
use archivist_core::{
    detect_content_type, sanitize_filename, validate_file, Document, DirectoryStats, Error,
    ImportReceipt, Result, VaultFileEntry, VaultStats,
};

/// Sidecar filename suffix.
const META_SUFFIX: &str = ".meta.json";

/// A managed vault directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultDir {
    Content,
    Thumbnails,
    Temp,
    Exports,
}

impl VaultDir {
    /// All managed directories in canonical order.
    pub const ALL: [VaultDir; 4] = [
        VaultDir::Content,
        VaultDir::Thumbnails,
        VaultDir::Temp,
        VaultDir::Exports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VaultDir::Content => defaults::CONTENT_DIR,
            VaultDir::Thumbnails => defaults::THUMBNAILS_DIR,
            VaultDir::Temp => defaults::TEMP_DIR,
            VaultDir::Exports => defaults::EXPORTS_DIR,
        }
    }

    /// Parse a directory name; rejects anything outside the managed set.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            defaults::CONTENT_DIR => Ok(VaultDir::Content),
            defaults::THUMBNAILS_DIR => Ok(VaultDir::Thumbnails),
            defaults::TEMP_DIR => Ok(VaultDir::Temp),
            defaults::EXPORTS_DIR => Ok(VaultDir::Exports),
            other => Err(Error::InvalidInput(format!(
                "Unknown vault directory: {}",
                other
            ))),
        }
    }
}

/// Compute BLAKE3 hash of data with "blake3:" prefix.
///
/// Returns a string in the format: `blake3:{64-char-hex}`
pub fn compute_content_hash(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    format!("blake3:{}", hash.to_hex())
}

/// Normalize a user-supplied content hash to bare lowercase hex.
///
/// Accepts either `blake3:<64-hex>` or the bare 64-hex digest. Anything
/// else is invalid input; this is also what keeps hash-derived paths from
/// escaping the vault.
pub fn normalize_hash(input: &str) -> Result<String> {
    let hex = input.strip_prefix("blake3:").unwrap_or(input);
    if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidInput(format!(
            "Invalid content hash: {}",
            input
        )));
    }
    Ok(hex.to_ascii_lowercase())
}

/// Vault-relative blob path for a bare hex digest.
///
/// Example: `content/ab/cd/abcd...ef.bin`
pub fn storage_rel_path(hex: &str) -> String {
    format!(
        "{}/{}/{}/{}.bin",
        defaults::CONTENT_DIR,
        &hex[0..2],
        &hex[2..4],
        hex
    )
}

fn sidecar_rel_path(hex: &str) -> String {
    format!(
        "{}/{}/{}/{}{}",
        defaults::CONTENT_DIR,
        &hex[0..2],
        &hex[2..4],
        hex,
        META_SUFFIX
    )
}

/// Content-addressed filesystem vault.
pub struct Vault {
    base: PathBuf,
    max_file_bytes: u64,
}

impl Vault {
    /// Open (or create) a vault at the given base directory.
    pub async fn open(base: impl Into<PathBuf>) -> Result<Self> {
        let vault = Self {
            base: base.into(),
            max_file_bytes: defaults::MAX_FILE_BYTES,
        };
        vault.ensure_dirs().await?;
        Ok(vault)
    }

    /// Override the maximum accepted file size.
    pub fn with_max_file_bytes(mut self, max: u64) -> Self {
        self.max_file_bytes = max;
        self
    }

    /// Vault base directory.
    pub fn base_path(&self) -> &Path {
        &self.base
    }

    async fn ensure_dirs(&self) -> Result<()> {
        for dir in VaultDir::ALL {
            fs::create_dir_all(self.base.join(dir.as_str())).await?;
        }
        Ok(())
    }

    /// Validate that the vault can write, read, and delete files.
    ///
    /// Performs a full round-trip test at startup to catch filesystem issues
    /// (overlayfs quirks, permission errors, missing directories) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base.join(defaults::TEMP_DIR).join(".health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"vault-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await; // Best-effort cleanup

        Ok(())
    }

    /// Store a file, deduplicating by content hash.
    ///
    /// The filename is sanitized and the content safety-validated before
    /// anything touches disk. If a blob with the same hash already exists,
    /// its existing metadata is returned with `deduplicated: true`.
    pub async fn store(&self, filename: &str, data: &[u8]) -> Result<ImportReceipt> {
        let filename = sanitize_filename(filename);

        let verdict = validate_file(&filename, data, self.max_file_bytes);
        if !verdict.allowed {
            return Err(Error::InvalidInput(
                verdict
                    .block_reason
                    .unwrap_or_else(|| "File rejected".to_string()),
            ));
        }

        let content_hash = compute_content_hash(data);
        let hex = normalize_hash(&content_hash)?;
        let blob_rel = storage_rel_path(&hex);
        let blob_path = self.base.join(&blob_rel);

        if fs::try_exists(&blob_path).await? {
            // Reuse existing blob (deduplication)
            let document = match self.read_sidecar(&hex).await {
                Ok(document) => document,
                Err(Error::DocumentNotFound(_)) => {
                    // Blob without a sidecar: a crash between the blob
                    // rename and the metadata write. Regenerate it so the
                    // hash does not stay wedged.
                    warn!(
                        content_hash = %content_hash,
                        op = "store",
                        "vault: existing blob missing sidecar, regenerating"
                    );
                    let document = Document {
                        id: Uuid::now_v7(),
                        content_hash: content_hash.clone(),
                        filename: filename.clone(),
                        content_type: detect_content_type(&filename, data),
                        size_bytes: data.len() as u64,
                        imported_at: Utc::now(),
                        indexed: false,
                    };
                    self.write_sidecar(&hex, &document).await?;
                    document
                }
                Err(e) => return Err(e),
            };
            debug!(content_hash = %content_hash, op = "store", "vault: deduplicated");
            return Ok(ImportReceipt {
                document,
                deduplicated: true,
                stored_path: blob_rel,
            });
        }

        self.write_atomic(&blob_path, data).await?;

        let content_type = detect_content_type(&filename, data);
        let document = Document {
            id: Uuid::now_v7(),
            content_hash,
            filename,
            content_type,
            size_bytes: data.len() as u64,
            imported_at: Utc::now(),
            indexed: false,
        };
        self.write_sidecar(&hex, &document).await?;

        debug!(
            content_hash = %document.content_hash,
            size_bytes = document.size_bytes,
            op = "store",
            "vault: stored new blob"
        );

        Ok(ImportReceipt {
            document,
            deduplicated: false,
            stored_path: blob_rel,
        })
    }

    /// Look up document metadata by content hash.
    pub async fn get_document(&self, hash: &str) -> Result<Document> {
        let hex = normalize_hash(hash)?;
        self.read_sidecar(&hex).await
    }

    /// Read blob bytes and metadata by content hash.
    pub async fn open_document(&self, hash: &str) -> Result<(Vec<u8>, Document)> {
        let hex = normalize_hash(hash)?;
        let document = self.read_sidecar(&hex).await?;
        let data = fs::read(self.base.join(storage_rel_path(&hex))).await?;
        Ok((data, document))
    }

    /// Record whether the document is registered with the index service.
    pub async fn mark_indexed(&self, hash: &str, indexed: bool) -> Result<Document> {
        let hex = normalize_hash(hash)?;
        let mut document = self.read_sidecar(&hex).await?;
        document.indexed = indexed;
        self.write_sidecar(&hex, &document).await?;
        Ok(document)
    }

    /// Delete a document's blob and sidecar.
    pub async fn delete(&self, hash: &str) -> Result<()> {
        let hex = normalize_hash(hash)?;
        let blob_path = self.base.join(storage_rel_path(&hex));
        if !fs::try_exists(&blob_path).await? {
            return Err(Error::DocumentNotFound(hash.to_string()));
        }
        fs::remove_file(&blob_path).await?;
        let _ = fs::remove_file(self.base.join(sidecar_rel_path(&hex))).await;
        Ok(())
    }

    /// List archived documents, newest first.
    ///
    /// Returns the page plus the total document count for pagination
    /// metadata.
    pub async fn list_documents(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Document>, usize)> {
        let content_dir = self.base.join(defaults::CONTENT_DIR);
        let mut documents = Vec::new();
        for (path, _, _) in walk_files(&content_dir).await? {
            if !path.to_string_lossy().ends_with(META_SUFFIX) {
                continue;
            }
            match fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice::<Document>(&bytes) {
                    Ok(doc) => documents.push(doc),
                    Err(e) => warn!(path = %path.display(), error = %e, "vault: bad sidecar"),
                },
                Err(e) => warn!(path = %path.display(), error = %e, "vault: unreadable sidecar"),
            }
        }

        documents.sort_by(|a, b| {
            b.imported_at
                .cmp(&a.imported_at)
                .then_with(|| a.content_hash.cmp(&b.content_hash))
        });

        let total = documents.len();
        let page = documents.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    /// List raw files in one managed directory, sorted by name.
    pub async fn list_dir(
        &self,
        dir: VaultDir,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<VaultFileEntry>, usize)> {
        let dir_path = self.base.join(dir.as_str());
        let mut entries: Vec<VaultFileEntry> = walk_files(&dir_path)
            .await?
            .into_iter()
            .map(|(path, size, modified)| {
                let rel = path
                    .strip_prefix(&self.base)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .to_string();
                VaultFileEntry {
                    name: filename_of(&rel).to_string(),
                    path: rel,
                    size_bytes: size,
                    modified_at: modified,
                }
            })
            .collect();

        entries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));

        let total = entries.len();
        let page = entries.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    /// File-count and byte accounting across all managed directories.
    pub async fn stats(&self) -> Result<VaultStats> {
        let mut directories = Vec::with_capacity(VaultDir::ALL.len());
        let mut total_files = 0u64;
        let mut total_bytes = 0u64;

        for dir in VaultDir::ALL {
            let files = walk_files(&self.base.join(dir.as_str())).await?;
            let file_count = files.len() as u64;
            let bytes: u64 = files.iter().map(|(_, size, _)| size).sum();
            total_files += file_count;
            total_bytes += bytes;
            directories.push(DirectoryStats {
                directory: dir.as_str().to_string(),
                file_count,
                total_bytes: bytes,
            });
        }

        Ok(VaultStats {
            directories,
            total_files,
            total_bytes,
        })
    }

    /// Remove every file in one managed directory. Returns files removed.
    pub async fn clear(&self, dir: VaultDir) -> Result<u64> {
        let dir_path = self.base.join(dir.as_str());
        let removed = walk_files(&dir_path).await?.len() as u64;
        if fs::try_exists(&dir_path).await? {
            fs::remove_dir_all(&dir_path).await?;
        }
        fs::create_dir_all(&dir_path).await?;
        Ok(removed)
    }

    /// Remove every file in every managed directory. Returns files removed.
    pub async fn clear_all(&self) -> Result<u64> {
        let mut removed = 0u64;
        for dir in VaultDir::ALL {
            removed += self.clear(dir).await?;
        }
        Ok(removed)
    }

    async fn read_sidecar(&self, hex: &str) -> Result<Document> {
        let path = self.base.join(sidecar_rel_path(hex));
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::DocumentNotFound(hex.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_sidecar(&self, hex: &str, document: &Document) -> Result<()> {
        let path = self.base.join(sidecar_rel_path(hex));
        let bytes = serde_json::to_vec_pretty(document)?;
        self.write_atomic(&path, &bytes).await
    }

    /// Atomic write: temp file in `temp/`, fsync, rename into place.
    async fn write_atomic(&self, dest: &Path, data: &[u8]) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "vault: create_dir_all failed");
                e
            })?;
        }

        let temp_path = self
            .base
            .join(defaults::TEMP_DIR)
            .join(format!("{}.tmp", Uuid::now_v7()));
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, dest).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %dest.display(), error = %e, "vault: rename failed");
            e
        })?;

        // Set permissions to 0644 (rw-r--r--, no execute)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(dest, std::fs::Permissions::from_mode(0o644)).await?;
        }

        Ok(())
    }
}

fn filename_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Collect `(path, size, modified)` for every regular file under `dir`.
///
/// Iterative walk; the content directory is sharded two levels deep.
async fn walk_files(dir: &Path) -> Result<Vec<(PathBuf, u64, Option<DateTime<Utc>>)>> {
    let mut results = Vec::new();
    if !fs::try_exists(dir).await? {
        return Ok(results);
    }

    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let mut entries = fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if meta.is_dir() {
                stack.push(entry.path());
            } else {
                let modified = meta.modified().ok().map(DateTime::<Utc>::from);
                results.push((entry.path(), meta.len(), modified));
            }
        }
    }

    Ok(results)
}
