use crate::services::{QtDirHint, QtRoot, QtVersionFamily, RootSource, Tool};
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

/// Status text shown while no Qt root is known.
pub const STATUS_NOT_FOUND: &str = "Qt not found";
/// Status text once a Qt root has been resolved.
pub const STATUS_FOUND: &str = "Qt found";

/// Progress of a single launch request.
///
/// `Idle -> Resolving -> Found -> Spawning -> Exited`, or `Resolving -> Failed`
/// when the executable is missing or the file type is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LaunchPhase {
    #[default]
    Idle,
    Resolving,
    Found(Utf8PathBuf),
    Spawning,
    /// Exit code, `None` if the process ended without one.
    Exited(Option<i32>),
    Failed(String),
}

impl fmt::Display for LaunchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchPhase::Idle => f.write_str("idle"),
            LaunchPhase::Resolving => f.write_str("resolving"),
            LaunchPhase::Found(path) => write!(f, "found {}", path),
            LaunchPhase::Spawning => f.write_str("spawning"),
            LaunchPhase::Exited(Some(code)) => write!(f, "exited with code {}", code),
            LaunchPhase::Exited(None) => f.write_str("exited"),
            LaunchPhase::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Single source of truth for the resolved Qt environment.
///
/// Recomputed on every update cycle; nothing here is cached across cycles.
/// Access it through [`crate::state::StateManager`], never directly.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    // Inputs of the last update
    pub workspace: Option<Utf8PathBuf>,
    pub build_directory: Option<Utf8PathBuf>,
    pub cache_file: Option<Utf8PathBuf>,
    pub extra_search_directories: Vec<Utf8PathBuf>,
    pub configured_creator: Option<Utf8PathBuf>,

    // Cache contents
    pub cache_entries: usize,
    pub project_name: Option<String>,
    pub qt_dir_hint: Option<QtDirHint>,

    // Resolution result
    pub qt_root: QtRoot,
    pub root_source: Option<RootSource>,
    pub qt_family: Option<QtVersionFamily>,

    // Launch tracking
    pub launch_tool: Option<Tool>,
    pub launch_phase: LaunchPhase,

    /// Number of completed update cycles.
    pub update_count: u64,
}

impl AppState {
    pub fn is_qt_found(&self) -> bool {
        self.qt_root.is_resolved()
    }

    /// Short status line ("Qt found" / "Qt not found").
    pub fn status_text(&self) -> &'static str {
        if self.is_qt_found() {
            STATUS_FOUND
        } else {
            STATUS_NOT_FOUND
        }
    }

    /// Detail for the status line: the root path, or a configuration hint.
    pub fn status_tooltip(&self) -> String {
        match self.qt_root.path() {
            Some(root) => root.to_string(),
            None => "cmake configured with Qt?".to_string(),
        }
    }

    pub fn qt_root_path(&self) -> Option<&Utf8Path> {
        self.qt_root.path()
    }
}
