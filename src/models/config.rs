use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Placeholder substituted with the active workspace directory.
pub const WORKSPACE_PLACEHOLDER: &str = "${workspaceFolder}";

/// User settings from `qttools.yaml`.
///
/// Every field has a default so partial files (and `QTTOOLS_*` environment
/// overrides) deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// CMake build directory holding `CMakeCache.txt`.
    pub cmake_build_directory: String,

    /// Directories searched for tools after `<qt root>/bin`, in order.
    pub extra_search_directories: Vec<String>,

    /// Qt root used instead of auto-detection when it contains `bin/qmake`.
    pub qt_dir: String,

    /// Qt Creator executable (or `.app` bundle on macOS); wins over detection.
    pub creator_path: String,

    /// Fall back to scanning `PATH` for qmake.
    pub scan_path: bool,

    /// Where to write the generated natvis file; empty means the config directory.
    pub natvis_output: String,

    /// Namespace prefix for natvis types; unset means the OS default.
    pub qt_namespace: Option<String>,

    pub debug_mode: bool,

    pub log_directory: String,

    /// Write the log file as JSON lines.
    pub log_json: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            cmake_build_directory: format!("{WORKSPACE_PLACEHOLDER}/build"),
            extra_search_directories: Vec::new(),
            qt_dir: String::new(),
            creator_path: String::new(),
            scan_path: true,
            natvis_output: String::new(),
            qt_namespace: None,
            debug_mode: false,
            log_directory: default_log_directory(),
            log_json: false,
        }
    }
}

fn default_log_directory() -> String {
    "logs".to_string()
}

/// Replace every `${workspaceFolder}` in `value`.
///
/// Without a workspace the value is returned unchanged.
pub fn substitute_workspace(value: &str, workspace: Option<&Utf8Path>) -> String {
    match workspace {
        Some(ws) => value.replace(WORKSPACE_PLACEHOLDER, ws.as_str()),
        None => value.to_string(),
    }
}

fn non_empty_path(value: &str, workspace: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
    let value = substitute_workspace(value, workspace);
    if value.is_empty() {
        None
    } else {
        Some(Utf8PathBuf::from(value))
    }
}

impl ToolsConfig {
    pub fn build_directory(&self, workspace: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
        non_empty_path(&self.cmake_build_directory, workspace)
    }

    /// `<build dir>/CMakeCache.txt`, if a build directory is configured.
    pub fn cache_file(&self, workspace: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
        self.build_directory(workspace)
            .map(|dir| dir.join(crate::services::CMAKE_CACHE_FILENAME))
    }

    /// Extra search directories with the workspace substituted, order kept.
    pub fn extra_search_dirs(&self, workspace: Option<&Utf8Path>) -> Vec<Utf8PathBuf> {
        self.extra_search_directories
            .iter()
            .map(|dir| Utf8PathBuf::from(substitute_workspace(dir, workspace)))
            .collect()
    }

    pub fn configured_qt_dir(&self, workspace: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
        non_empty_path(&self.qt_dir, workspace)
    }

    pub fn configured_creator(&self, workspace: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
        non_empty_path(&self.creator_path, workspace)
    }
}
