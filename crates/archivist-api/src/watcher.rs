//! Inbox watch folder.
//!
//! Watches a drop directory and imports newly created files through the
//! regular import path (vault + index). Imported originals are removed on
//! success so the inbox drains as it is processed. Enabled by setting
//! `ARCHIVIST_WATCH_DIR`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::handlers::documents::import_bytes;
use crate::AppState;

/// Handle keeping the filesystem watcher alive.
pub struct InboxWatcher {
    _watcher: RecommendedWatcher,
}

impl InboxWatcher {
    /// Watch `inbox` and import new files. Must be called within a tokio
    /// runtime; the import loop runs as a background task.
    pub fn spawn(state: AppState, inbox: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&inbox)?;

        let (tx, rx) = mpsc::unbounded_channel::<PathBuf>();
        let mut watcher =
            notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Create(_)) {
                        for path in event.paths {
                            let _ = tx.send(path);
                        }
                    }
                }
                Err(e) => warn!(error = %e, subsystem = "watcher", "watch error"),
            })?;

        watcher.watch(&inbox, RecursiveMode::NonRecursive)?;
        info!(inbox = %inbox.display(), subsystem = "watcher", "inbox watcher started");

        tokio::spawn(import_loop(state, rx));

        Ok(Self { _watcher: watcher })
    }
}

async fn import_loop(state: AppState, mut rx: mpsc::UnboundedReceiver<PathBuf>) {
    while let Some(path) = rx.recv().await {
        if !eligible(&path) {
            continue;
        }

        // Give the writer a moment to finish before reading.
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        match import_one(&state, &path).await {
            Ok(()) => {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %e, subsystem = "watcher",
                        "imported but could not remove inbox file");
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, subsystem = "watcher",
                    "inbox import failed");
            }
        }
    }
}

fn eligible(path: &Path) -> bool {
    match path.file_name().and_then(|n| n.to_str()) {
        // Skip dotfiles and editors' in-progress artifacts.
        Some(name) => !name.starts_with('.') && !name.ends_with(".tmp") && !name.ends_with('~'),
        None => false,
    }
}

async fn import_one(state: &AppState, path: &Path) -> anyhow::Result<()> {
    let metadata = tokio::fs::metadata(path).await?;
    if !metadata.is_file() {
        return Ok(());
    }

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed")
        .to_string();
    let data = tokio::fs::read(path).await?;

    let settings = state.settings.get().await;
    let receipt = import_bytes(state, &filename, &data, settings.auto_index).await?;
    info!(
        content_hash = %receipt.document.content_hash,
        deduplicated = receipt.deduplicated,
        subsystem = "watcher",
        op = "import",
        "inbox file imported"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligible_skips_partial_files() {
        assert!(eligible(Path::new("/inbox/statement.pdf")));
        assert!(!eligible(Path::new("/inbox/.hidden")));
        assert!(!eligible(Path::new("/inbox/upload.tmp")));
        assert!(!eligible(Path::new("/inbox/draft.txt~")));
    }
}
