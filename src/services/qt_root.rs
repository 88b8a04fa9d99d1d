//! Qt SDK root resolution.
//!
//! A directory `D` is a Qt root if and only if `D/bin/qmake[.exe]` exists. The
//! resolver tries, in order:
//! 1. a directly configured root (`qt_dir` setting), if it qualifies
//! 2. the `Qt5_DIR`/`Qt6_DIR` style hint from `CMakeCache.txt`, walking up from
//!    the package-config directory until a `bin/qmake` is found
//! 3. the `PATH` environment variable, taking the parent of the directory that
//!    holds `qmake`
//!
//! Not finding Qt is the normal steady state for projects that don't use it, so
//! resolution never fails; it returns [`QtRoot::Unresolved`] instead.

use crate::services::cmake_cache::{QtDirHint, QtVersionFamily};
use crate::services::path_probe::FileProbe;
use crate::services::platform::HostOs;
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use std::sync::Arc;

/// Result of a root lookup.
///
/// Crosses public string boundaries as `""` when unresolved (see [`as_str`](Self::as_str)).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QtRoot {
    #[default]
    Unresolved,
    Resolved(Utf8PathBuf),
}

impl QtRoot {
    pub fn is_resolved(&self) -> bool {
        matches!(self, QtRoot::Resolved(_))
    }

    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            QtRoot::Resolved(path) => Some(path),
            QtRoot::Unresolved => None,
        }
    }

    /// The root directory, or an empty string when Qt was not detected.
    pub fn as_str(&self) -> &str {
        self.path().map(Utf8Path::as_str).unwrap_or("")
    }

    /// `<root>/bin`, where qmake and the GUI tools live.
    pub fn bin_dir(&self) -> Option<Utf8PathBuf> {
        self.path().map(|root| root.join("bin"))
    }
}

impl From<Option<Utf8PathBuf>> for QtRoot {
    fn from(value: Option<Utf8PathBuf>) -> Self {
        value.map_or(QtRoot::Unresolved, QtRoot::Resolved)
    }
}

impl fmt::Display for QtRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which strategy produced a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootSource {
    Configured,
    CMakeCache,
    PathVariable,
    None,
}

impl fmt::Display for RootSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RootSource::Configured => "configured qt_dir",
            RootSource::CMakeCache => "CMakeCache.txt",
            RootSource::PathVariable => "PATH",
            RootSource::None => "none",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub root: QtRoot,
    pub source: RootSource,
    /// Known only when the cache hint named a versioned key.
    pub family: Option<QtVersionFamily>,
}

impl Resolution {
    pub fn unresolved() -> Self {
        Self {
            root: QtRoot::Unresolved,
            source: RootSource::None,
            family: None,
        }
    }
}

/// Everything one resolution pass looks at.
#[derive(Debug, Clone, Default)]
pub struct ResolveInputs {
    /// Root configured by the user, bypassing auto-detection when valid.
    pub configured_root: Option<Utf8PathBuf>,
    /// Qt package directory found in `CMakeCache.txt`.
    pub cache_hint: Option<QtDirHint>,
    /// Raw value of the `PATH` variable.
    pub path_var: Option<String>,
    /// Whether to fall back to scanning `PATH`.
    pub scan_path: bool,
}

/// True if `dir/bin/qmake[.exe]` exists.
pub async fn is_qt_root<P>(probe: &P, dir: &Utf8Path, os: HostOs) -> bool
where
    P: FileProbe + ?Sized,
{
    !dir.as_str().is_empty() && probe.exists(&dir.join("bin").join(os.qmake_filename())).await
}

/// Walk up from a CMake package directory to the Qt root.
///
/// `Qt5_DIR` usually points at `<root>/lib/cmake/Qt5`, but the depth is not
/// fixed, so every ancestor is tested starting with the hint itself.
pub async fn find_root_via_cmake_dir<P>(probe: &P, qt_dir: &str, os: HostOs) -> Option<Utf8PathBuf>
where
    P: FileProbe + ?Sized,
{
    let normalized = normalize_separators(qt_dir);

    for candidate in Utf8Path::new(&normalized).ancestors() {
        if is_qt_root(probe, candidate, os).await {
            return Some(candidate.to_path_buf());
        }
    }
    None
}

/// Find the root via the directory on `PATH` that contains qmake.
pub async fn find_root_via_path_var<P>(
    probe: &P,
    path_value: &str,
    os: HostOs,
) -> Option<Utf8PathBuf>
where
    P: FileProbe + ?Sized,
{
    let qmake = os.qmake_filename();

    for entry in path_value.split(os.path_list_separator()) {
        let entry = normalize_separators(entry.trim().trim_matches('"'));
        if entry.is_empty() {
            continue;
        }
        let dir = Utf8Path::new(&entry);
        if !probe.exists(&dir.join(&qmake)).await {
            continue;
        }
        match dir.parent() {
            Some(parent) if !parent.as_str().is_empty() => return Some(parent.to_path_buf()),
            _ => tracing::debug!("qmake found in {} but it has no parent directory", dir),
        }
    }
    None
}

fn normalize_separators(path: &str) -> String {
    let replaced = path.replace('\\', "/");
    match replaced.trim_end_matches('/') {
        "" if replaced.starts_with('/') => "/".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Chains the resolution strategies against a [`FileProbe`].
#[derive(Clone)]
pub struct QtRootResolver {
    probe: Arc<dyn FileProbe>,
    os: HostOs,
}

impl QtRootResolver {
    pub fn new(probe: Arc<dyn FileProbe>, os: HostOs) -> Self {
        Self { probe, os }
    }

    /// Determine the Qt root for `inputs`. Never fails.
    pub async fn resolve(&self, inputs: &ResolveInputs) -> Resolution {
        let probe = self.probe.as_ref();

        if let Some(configured) = inputs.configured_root.as_deref() {
            if is_qt_root(probe, configured, self.os).await {
                tracing::info!("Using configured Qt root {}", configured);
                return Resolution {
                    root: QtRoot::Resolved(configured.to_path_buf()),
                    source: RootSource::Configured,
                    family: inputs.cache_hint.as_ref().map(|h| h.family),
                };
            }
            tracing::warn!(
                "Configured qt_dir {} has no bin/{}, falling back to auto-detection",
                configured,
                self.os.qmake_filename()
            );
        }

        if let Some(hint) = &inputs.cache_hint {
            if let Some(root) = find_root_via_cmake_dir(probe, &hint.value, self.os).await {
                tracing::info!("Found Qt root {} via {}={}", root, hint.key, hint.value);
                return Resolution {
                    root: QtRoot::Resolved(root),
                    source: RootSource::CMakeCache,
                    family: Some(hint.family),
                };
            }
            tracing::info!(
                "No qmake above {}={}, trying PATH",
                hint.key,
                hint.value
            );
        }

        if inputs.scan_path {
            if let Some(path_value) = inputs.path_var.as_deref() {
                if let Some(root) = find_root_via_path_var(probe, path_value, self.os).await {
                    tracing::info!("Found Qt root {} via PATH", root);
                    return Resolution {
                        root: QtRoot::Resolved(root),
                        source: RootSource::PathVariable,
                        family: inputs.cache_hint.as_ref().map(|h| h.family),
                    };
                }
            }
        }

        tracing::debug!("Qt root not found");
        Resolution::unresolved()
    }
}
