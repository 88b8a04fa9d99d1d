//! Filesystem predicates used by root resolution and tool location.
//!
//! All checks go through the [`FileProbe`] trait so the resolver can run against
//! the real filesystem ([`FsProbe`], non-blocking via `tokio::fs`) or against an
//! in-memory layout ([`MemoryProbe`]) describing e.g. a Windows Qt install.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;

/// Existence checks that never block the caller's event loop.
#[async_trait]
pub trait FileProbe: Send + Sync {
    /// True if `path` names an existing file or directory.
    async fn exists(&self, path: &Utf8Path) -> bool;

    /// True if `path` names an existing directory.
    async fn is_dir(&self, path: &Utf8Path) -> bool;
}

/// Probe backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

#[async_trait]
impl FileProbe for FsProbe {
    async fn exists(&self, path: &Utf8Path) -> bool {
        if path.as_str().is_empty() {
            return false;
        }
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn is_dir(&self, path: &Utf8Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}

/// In-memory filesystem layout.
///
/// Paths are compared after replacing `\` with `/`. Adding a file also registers
/// every ancestor as a directory.
#[derive(Debug, Clone, Default)]
pub struct MemoryProbe {
    files: HashSet<String>,
    dirs: HashSet<String>,
}

impl MemoryProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`add_file`](Self::add_file).
    pub fn with_file(mut self, path: impl AsRef<str>) -> Self {
        self.add_file(path);
        self
    }

    /// Builder-style variant of [`add_dir`](Self::add_dir).
    pub fn with_dir(mut self, path: impl AsRef<str>) -> Self {
        self.add_dir(path);
        self
    }

    pub fn add_file(&mut self, path: impl AsRef<str>) {
        let normalized = normalize(path.as_ref());
        self.register_ancestors(&normalized);
        self.files.insert(normalized);
    }

    pub fn add_dir(&mut self, path: impl AsRef<str>) {
        let normalized = normalize(path.as_ref());
        self.register_ancestors(&normalized);
        self.dirs.insert(normalized);
    }

    fn register_ancestors(&mut self, path: &str) {
        for ancestor in Utf8Path::new(path).ancestors().skip(1) {
            if !ancestor.as_str().is_empty() {
                self.dirs.insert(ancestor.as_str().to_string());
            }
        }
    }
}

fn normalize(path: &str) -> String {
    let replaced = path.replace('\\', "/");
    match replaced.trim_end_matches('/') {
        "" if replaced.starts_with('/') => "/".to_string(),
        trimmed => trimmed.to_string(),
    }
}

#[async_trait]
impl FileProbe for MemoryProbe {
    async fn exists(&self, path: &Utf8Path) -> bool {
        let key = normalize(path.as_str());
        self.files.contains(&key) || self.dirs.contains(&key)
    }

    async fn is_dir(&self, path: &Utf8Path) -> bool {
        self.dirs.contains(&normalize(path.as_str()))
    }
}

/// Return the first `directory/filename` that exists.
///
/// Directories are tried in order, and within each directory the candidate
/// filenames are tried in order. Empty directory entries are skipped.
pub async fn find_first_existing<P>(
    probe: &P,
    directories: &[Utf8PathBuf],
    candidate_filenames: &[String],
) -> Option<Utf8PathBuf>
where
    P: FileProbe + ?Sized,
{
    for dir in directories {
        if dir.as_str().is_empty() {
            continue;
        }
        for name in candidate_filenames {
            let candidate = dir.join(name);
            if probe.exists(&candidate).await {
                tracing::debug!("Found {}", candidate);
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_fs_probe_exists() {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        fs::write(root.join("designer"), "").unwrap();

        assert!(FsProbe.exists(&root.join("designer")).await);
        assert!(!FsProbe.exists(&root.join("assistant")).await);
        assert!(FsProbe.is_dir(&root).await);
        assert!(!FsProbe.is_dir(&root.join("designer")).await);
        assert!(!FsProbe.exists(Utf8Path::new("")).await);
    }

    #[tokio::test]
    async fn test_memory_probe_registers_ancestors() {
        let probe = MemoryProbe::new().with_file("C:\\Qt\\5.15.2\\bin\\qmake.exe");

        assert!(probe.exists(Utf8Path::new("C:/Qt/5.15.2/bin/qmake.exe")).await);
        assert!(probe.is_dir(Utf8Path::new("C:/Qt/5.15.2/bin")).await);
        assert!(probe.is_dir(Utf8Path::new("C:/Qt")).await);
        assert!(!probe.is_dir(Utf8Path::new("C:/Qt/5.15.2/bin/qmake.exe")).await);
    }

    #[tokio::test]
    async fn test_find_first_existing_respects_directory_order() {
        let probe = MemoryProbe::new()
            .with_file("/a/designer")
            .with_file("/b/designer");
        let dirs = vec![Utf8PathBuf::from("/a"), Utf8PathBuf::from("/b")];

        let found = find_first_existing(&probe, &dirs, &names(&["designer"])).await;
        assert_eq!(found, Some(Utf8PathBuf::from("/a/designer")));
    }

    #[tokio::test]
    async fn test_find_first_existing_respects_filename_order() {
        let probe = MemoryProbe::new()
            .with_file("/a/Designer")
            .with_file("/a/designer");
        let dirs = vec![Utf8PathBuf::from("/a")];

        let found = find_first_existing(&probe, &dirs, &names(&["designer", "Designer"])).await;
        assert_eq!(found, Some(Utf8PathBuf::from("/a/designer")));
    }

    #[tokio::test]
    async fn test_find_first_existing_skips_empty_entries() {
        let probe = MemoryProbe::new().with_file("/b/designer");
        let dirs = vec![Utf8PathBuf::new(), Utf8PathBuf::from("/b")];

        let found = find_first_existing(&probe, &dirs, &names(&["designer"])).await;
        assert_eq!(found, Some(Utf8PathBuf::from("/b/designer")));
    }

    #[tokio::test]
    async fn test_find_first_existing_nothing_set() {
        let probe = MemoryProbe::new().with_file("/a/designer");

        assert_eq!(find_first_existing(&probe, &[], &names(&["designer"])).await, None);
        assert_eq!(
            find_first_existing(&probe, &[Utf8PathBuf::from("/a")], &[]).await,
            None
        );
    }
}
