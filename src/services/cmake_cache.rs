//! Reader for CMake's generated `CMakeCache.txt`.
//!
//! The cache is a plain text file with one `NAME:TYPE=VALUE` entry per line and
//! `#` / `//` comment lines. Only a handful of entries matter for locating Qt,
//! so the reader keeps keys starting with one of [`RECOGNIZED_PREFIXES`] and
//! silently drops everything else.
//!
//! # Examples
//!
//! ```no_run
//! use qttools::services::CMakeCache;
//!
//! # async fn print_hint() {
//! let cache = CMakeCache::read("build/CMakeCache.txt").await;
//! if let Some(hint) = cache.qt_dir_hint() {
//!     println!("{} = {}", hint.key, hint.value);
//! }
//! # }
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Name of the cache file inside a CMake build directory.
pub const CMAKE_CACHE_FILENAME: &str = "CMakeCache.txt";

/// Key prefixes retained by the reader (case-sensitive).
pub const RECOGNIZED_PREFIXES: [&str; 3] = ["Qt5", "Qt6", "CMAKE_PROJECT_NAME"];

/// Cache keys that point into a Qt installation, in lookup order.
const QT_DIR_KEYS: [(&str, QtVersionFamily); 4] = [
    ("Qt5_DIR", QtVersionFamily::Qt5),
    ("Qt5Core_DIR", QtVersionFamily::Qt5),
    ("Qt6_DIR", QtVersionFamily::Qt6),
    ("Qt6Core_DIR", QtVersionFamily::Qt6),
];

static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[^:]+):(?P<type>[^=]+)=(?P<value>.+)$")
        .expect("Invalid cache line regex")
});

/// Flat key/value view of the recognized cache entries.
pub type CacheStore = IndexMap<String, String>;

/// Major Qt release line a cache hint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QtVersionFamily {
    Qt5,
    Qt6,
}

impl QtVersionFamily {
    pub fn major(self) -> u8 {
        match self {
            QtVersionFamily::Qt5 => 5,
            QtVersionFamily::Qt6 => 6,
        }
    }
}

impl fmt::Display for QtVersionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Qt{}", self.major())
    }
}

/// A Qt package directory recorded in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QtDirHint {
    pub key: String,
    pub value: String,
    pub family: QtVersionFamily,
}

/// Parsed contents of one `CMakeCache.txt`.
///
/// Rebuilt from scratch on every [`read`](Self::read); there is no incremental merge.
#[derive(Debug, Clone, Default)]
pub struct CMakeCache {
    filename: Option<Utf8PathBuf>,
    values: CacheStore,
}

impl CMakeCache {
    /// Read and parse `filename`.
    ///
    /// A missing or unreadable file yields an empty cache, never an error.
    pub async fn read(filename: impl AsRef<Utf8Path>) -> Self {
        let filename = filename.as_ref();
        let values = match tokio::fs::read(filename).await {
            Ok(bytes) => parse_cache(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                tracing::debug!("No cache read from {}: {}", filename, e);
                CacheStore::new()
            }
        };

        tracing::debug!("Read {} cache entries from {}", values.len(), filename);
        Self {
            filename: Some(filename.to_path_buf()),
            values,
        }
    }

    /// Build a cache directly from already parsed text.
    pub fn from_text(text: &str) -> Self {
        Self {
            filename: None,
            values: parse_cache(text),
        }
    }

    pub fn filename(&self) -> Option<&Utf8Path> {
        self.filename.as_deref()
    }

    pub fn values(&self) -> &CacheStore {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default_value: &'a str) -> &'a str {
        self.get(key).unwrap_or(default_value)
    }

    /// First Qt package directory present in the cache.
    pub fn qt_dir_hint(&self) -> Option<QtDirHint> {
        QT_DIR_KEYS.iter().find_map(|(key, family)| {
            self.get(key)
                .filter(|value| !value.is_empty())
                .map(|value| QtDirHint {
                    key: key.to_string(),
                    value: value.to_string(),
                    family: *family,
                })
        })
    }

    pub fn project_name(&self) -> Option<&str> {
        self.get("CMAKE_PROJECT_NAME")
    }
}

/// Parse cache text into the recognized entries.
///
/// Comment lines and lines not matching `NAME:TYPE=VALUE` are skipped. The
/// value is everything after the first `=` behind the type, kept verbatim.
pub fn parse_cache(text: &str) -> CacheStore {
    let mut values = CacheStore::new();

    for line in text.lines() {
        let line = line.trim_start();
        if line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        let Some(caps) = LINE_PATTERN.captures(line) else {
            continue;
        };
        let name = &caps["name"];
        if is_recognized_key(name) {
            values.insert(name.to_string(), caps["value"].to_string());
        }
    }

    values
}

pub fn is_recognized_key(name: &str) -> bool {
    RECOGNIZED_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Read a single value from a cache file, empty if absent.
pub async fn get_cmake_cache_value(key: &str, cache_file: impl AsRef<Utf8Path>) -> String {
    CMakeCache::read(cache_file).await.get_or(key, "").to_string()
}
