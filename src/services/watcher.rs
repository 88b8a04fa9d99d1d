//! File watching for `CMakeCache.txt` and the settings file.
//!
//! A [`FileWatcher`] watches one directory (non-recursive) and sends a
//! [`Trigger`] on the resolve queue whenever a specific file in it changes.
//! Dropping the watcher stops it, so replacing a handle closes the old watch.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebouncedEvent, Debouncer, new_debouncer};
use std::time::Duration;
use tokio::sync::mpsc;

/// Debounce window for bursts of writes (CMake rewrites the cache several times).
const WATCH_DEBOUNCE_MS: u64 = 200;

/// Reason a re-resolution was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    ConfigChanged,
    CacheChanged,
    Command,
}

pub struct FileWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
    dir: Utf8PathBuf,
    file_name: String,
}

impl FileWatcher {
    /// Watch `dir` and send `trigger` on `tx` whenever `file_name` changes.
    ///
    /// # Errors
    ///
    /// Fails if the watcher cannot be created or `dir` cannot be watched
    /// (e.g. it does not exist yet).
    pub fn watch(
        dir: &Utf8Path,
        file_name: &str,
        trigger: Trigger,
        tx: mpsc::UnboundedSender<Trigger>,
    ) -> Result<Self> {
        let target = file_name.to_string();

        let mut debouncer = new_debouncer(
            Duration::from_millis(WATCH_DEBOUNCE_MS),
            move |events: Result<Vec<DebouncedEvent>, notify::Error>| {
                let events = match events {
                    Ok(events) => events,
                    Err(e) => {
                        tracing::warn!("File watch error: {}", e);
                        return;
                    }
                };

                let touched = events.iter().any(|event| {
                    event.path.file_name().and_then(|n| n.to_str()) == Some(target.as_str())
                });
                if touched {
                    tracing::info!("{} changed", target);
                    // Receiver gone means the queue was shut down.
                    let _ = tx.send(trigger);
                }
            },
        )
        .context("Failed to create file watcher")?;

        debouncer
            .watcher()
            .watch(dir.as_std_path(), RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", dir))?;

        tracing::debug!("Watching {} in {}", file_name, dir);
        Ok(Self {
            _debouncer: debouncer,
            dir: dir.to_path_buf(),
            file_name: file_name.to_string(),
        })
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("dir", &self.dir)
            .field("file_name", &self.file_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::time::timeout;

    #[test]
    fn test_watch_missing_directory_fails() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = FileWatcher::watch(
            Utf8Path::new("/definitely/not/a/build/dir"),
            "CMakeCache.txt",
            Trigger::CacheChanged,
            tx,
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_watch_sends_trigger_for_named_file() {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let watcher =
            FileWatcher::watch(&dir, "CMakeCache.txt", Trigger::CacheChanged, tx).unwrap();
        assert_eq!(watcher.file_name(), "CMakeCache.txt");

        std::fs::write(dir.join("CMakeCache.txt"), "Qt5_DIR:PATH=/opt/Qt\n").unwrap();

        let trigger = timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("Timeout waiting for trigger")
            .expect("Channel closed");
        assert_eq!(trigger, Trigger::CacheChanged);
    }
}
