//! Locating Designer, Assistant and Creator executables.
//!
//! Search order is `<qt root>/bin` first, then the user's extra search
//! directories in configuration order. For each directory the candidate
//! filenames from [`candidate_filenames`] are tried in order and the first hit
//! wins. A configured Creator path always beats auto-detection.

use crate::services::path_probe::{FileProbe, find_first_existing};
use crate::services::platform::{HostOs, Tool, bundle_executable, candidate_filenames};
use crate::services::qt_root::QtRoot;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised when the caller asks to launch something invalid.
///
/// "Not found" during lookup is not an error (lookups return `None`); these are
/// only produced once a launch has been requested.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("{tool} executable does not exist '{path}'")]
    NotFound { tool: Tool, path: String },

    #[error("file to open in {tool} does not exist '{path}'")]
    FileNotFound { tool: Tool, path: String },

    #[error("file extension '{extension}' is not supported by {tool}")]
    UnsupportedFileType { tool: Tool, extension: String },

    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: Tool,
        #[source]
        source: std::io::Error,
    },
}

/// A validated launch: executable plus arguments. Built per request, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolTarget {
    pub tool: Tool,
    pub executable: Utf8PathBuf,
    pub args: Vec<String>,
}

#[derive(Clone)]
pub struct ToolLocator {
    probe: Arc<dyn FileProbe>,
    os: HostOs,
}

impl ToolLocator {
    pub fn new(probe: Arc<dyn FileProbe>, os: HostOs) -> Self {
        Self { probe, os }
    }

    /// Ordered directories searched for GUI tools.
    ///
    /// Duplicates are kept; precedence is declaration order.
    pub fn search_directories(&self, root: &QtRoot, extra_dirs: &[Utf8PathBuf]) -> Vec<Utf8PathBuf> {
        let mut dirs = Vec::with_capacity(extra_dirs.len() + 1);
        if let Some(bin) = root.bin_dir() {
            dirs.push(bin);
        }
        dirs.extend(extra_dirs.iter().cloned());
        dirs
    }

    /// Find `tool` below the Qt root or in `extra_dirs`.
    pub async fn locate(
        &self,
        tool: Tool,
        root: &QtRoot,
        extra_dirs: &[Utf8PathBuf],
    ) -> Option<Utf8PathBuf> {
        let dirs = self.search_directories(root, extra_dirs);
        let names = candidate_filenames(tool, self.os);
        find_first_existing(self.probe.as_ref(), &dirs, &names).await
    }

    /// Creator executable, preferring an explicitly configured path.
    ///
    /// The configured path is returned without consulting `root`; on macOS a
    /// `.app` bundle is rewritten to the executable inside it.
    pub async fn creator_filename(
        &self,
        configured: Option<&Utf8Path>,
        root: &QtRoot,
        extra_dirs: &[Utf8PathBuf],
    ) -> Option<Utf8PathBuf> {
        match configured.filter(|path| !path.as_str().is_empty()) {
            Some(path) => Some(bundle_executable(path, Tool::Creator, self.os)),
            None => self.locate(Tool::Creator, root, extra_dirs).await,
        }
    }

    /// Executable for any tool, honouring the Creator override.
    pub async fn executable_for(
        &self,
        tool: Tool,
        configured_creator: Option<&Utf8Path>,
        root: &QtRoot,
        extra_dirs: &[Utf8PathBuf],
    ) -> Option<Utf8PathBuf> {
        match tool {
            Tool::Creator => self.creator_filename(configured_creator, root, extra_dirs).await,
            Tool::Designer | Tool::Assistant => self.locate(tool, root, extra_dirs).await,
        }
    }

    /// Validate a launch request and build its [`ToolTarget`].
    ///
    /// # Errors
    ///
    /// - [`LaunchError::NotFound`] if `executable` is missing or does not exist
    /// - [`LaunchError::UnsupportedFileType`] if `file` has an extension the tool
    ///   does not open (directories are accepted by Creator without a check)
    /// - [`LaunchError::FileNotFound`] if `file` has the right extension but is missing
    pub async fn prepare_launch(
        &self,
        tool: Tool,
        executable: Option<&Utf8Path>,
        file: Option<&Utf8Path>,
    ) -> Result<ToolTarget, LaunchError> {
        let executable = executable.map(Utf8Path::to_path_buf).unwrap_or_default();
        if executable.as_str().is_empty() || !self.probe.exists(&executable).await {
            return Err(LaunchError::NotFound {
                tool,
                path: executable.to_string(),
            });
        }

        let mut args = Vec::new();
        if let Some(file) = file.filter(|f| !f.as_str().is_empty()) {
            let is_dir = tool.accepts_directories() && self.probe.is_dir(file).await;
            if !is_dir {
                let extension = file.extension().unwrap_or("");
                if !tool.accepted_extensions().contains(&extension) {
                    return Err(LaunchError::UnsupportedFileType {
                        tool,
                        extension: if extension.is_empty() {
                            String::new()
                        } else {
                            format!(".{extension}")
                        },
                    });
                }
                if !self.probe.exists(file).await {
                    return Err(LaunchError::FileNotFound {
                        tool,
                        path: file.to_string(),
                    });
                }
            }
            args.push(file.to_string());
        }

        Ok(ToolTarget {
            tool,
            executable,
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::path_probe::MemoryProbe;

    fn locator(probe: MemoryProbe, os: HostOs) -> ToolLocator {
        ToolLocator::new(Arc::new(probe), os)
    }

    fn root(path: &str) -> QtRoot {
        QtRoot::Resolved(Utf8PathBuf::from(path))
    }

    #[tokio::test]
    async fn test_locate_in_root_bin() {
        let loc = locator(
            MemoryProbe::new().with_file("C:/Qt/5.15.2/bin/designer.exe"),
            HostOs::Windows,
        );
        let found = loc.locate(Tool::Designer, &root("C:/Qt/5.15.2"), &[]).await;
        assert_eq!(found, Some(Utf8PathBuf::from("C:/Qt/5.15.2/bin/designer.exe")));
    }

    #[tokio::test]
    async fn test_root_precedes_extra_dirs() {
        let loc = locator(
            MemoryProbe::new()
                .with_file("/opt/Qt/bin/assistant")
                .with_file("/extra/assistant"),
            HostOs::Linux,
        );
        let extra = vec![Utf8PathBuf::from("/extra")];
        let found = loc.locate(Tool::Assistant, &root("/opt/Qt"), &extra).await;
        assert_eq!(found, Some(Utf8PathBuf::from("/opt/Qt/bin/assistant")));
    }

    #[tokio::test]
    async fn test_extra_dirs_used_without_root() {
        let loc = locator(MemoryProbe::new().with_file("/extra/Designer"), HostOs::Linux);
        let extra = vec![Utf8PathBuf::new(), Utf8PathBuf::from("/extra")];
        let found = loc.locate(Tool::Designer, &QtRoot::Unresolved, &extra).await;
        assert_eq!(found, Some(Utf8PathBuf::from("/extra/Designer")));
    }

    #[tokio::test]
    async fn test_macos_bundle_candidate() {
        let loc = locator(
            MemoryProbe::new().with_file("/Qt/5.15.2/clang_64/bin/Designer.app/Contents/MacOS/Designer"),
            HostOs::MacOs,
        );
        let found = loc.locate(Tool::Designer, &root("/Qt/5.15.2/clang_64"), &[]).await;
        assert_eq!(
            found,
            Some(Utf8PathBuf::from(
                "/Qt/5.15.2/clang_64/bin/Designer.app/Contents/MacOS/Designer"
            ))
        );
    }

    #[tokio::test]
    async fn test_configured_creator_skips_root() {
        let loc = locator(
            MemoryProbe::new().with_file("/opt/Qt/bin/qtcreator"),
            HostOs::MacOs,
        );
        let found = loc
            .creator_filename(Some(Utf8Path::new("/opt/qtcreator.app")), &root("/opt/Qt"), &[])
            .await;
        assert_eq!(
            found,
            Some(Utf8PathBuf::from("/opt/qtcreator.app/Contents/MacOS/Qt Creator"))
        );
    }

    #[tokio::test]
    async fn test_empty_configured_creator_is_ignored() {
        let loc = locator(MemoryProbe::new().with_file("/opt/Qt/bin/qtcreator"), HostOs::Linux);
        let found = loc
            .creator_filename(Some(Utf8Path::new("")), &root("/opt/Qt"), &[])
            .await;
        assert_eq!(found, Some(Utf8PathBuf::from("/opt/Qt/bin/qtcreator")));
    }

    #[tokio::test]
    async fn test_prepare_launch_missing_executable() {
        let loc = locator(MemoryProbe::new(), HostOs::Linux);

        let err = loc.prepare_launch(Tool::Designer, None, None).await.unwrap_err();
        assert!(matches!(err, LaunchError::NotFound { .. }));

        let err = loc
            .prepare_launch(Tool::Designer, Some(Utf8Path::new("/opt/Qt/bin/designer")), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/opt/Qt/bin/designer"));
    }

    #[tokio::test]
    async fn test_prepare_launch_designer_extension_rules() {
        let loc = locator(
            MemoryProbe::new()
                .with_file("/opt/Qt/bin/designer")
                .with_file("form.ui"),
            HostOs::Linux,
        );
        let exe = Utf8Path::new("/opt/Qt/bin/designer");

        let err = loc
            .prepare_launch(Tool::Designer, Some(exe), Some(Utf8Path::new("notes.txt")))
            .await
            .unwrap_err();
        assert!(
            matches!(err, LaunchError::UnsupportedFileType { ref extension, .. } if extension == ".txt")
        );

        let target = loc
            .prepare_launch(Tool::Designer, Some(exe), Some(Utf8Path::new("form.ui")))
            .await
            .unwrap();
        assert_eq!(target.args, vec!["form.ui".to_string()]);

        let err = loc
            .prepare_launch(Tool::Designer, Some(exe), Some(Utf8Path::new("missing.ui")))
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_prepare_launch_creator_accepts_directories() {
        let loc = locator(
            MemoryProbe::new()
                .with_file("/opt/creator/bin/qtcreator")
                .with_file("res.qrc")
                .with_dir("/work/project.d"),
            HostOs::Linux,
        );
        let exe = Utf8Path::new("/opt/creator/bin/qtcreator");

        let target = loc
            .prepare_launch(Tool::Creator, Some(exe), Some(Utf8Path::new("/work/project.d")))
            .await
            .unwrap();
        assert_eq!(target.args, vec!["/work/project.d".to_string()]);

        let target = loc
            .prepare_launch(Tool::Creator, Some(exe), Some(Utf8Path::new("res.qrc")))
            .await
            .unwrap();
        assert_eq!(target.args, vec!["res.qrc".to_string()]);
    }

    #[tokio::test]
    async fn test_prepare_launch_assistant_takes_no_file() {
        let loc = locator(MemoryProbe::new().with_file("/opt/Qt/bin/assistant"), HostOs::Linux);
        let exe = Utf8Path::new("/opt/Qt/bin/assistant");

        let target = loc.prepare_launch(Tool::Assistant, Some(exe), None).await.unwrap();
        assert!(target.args.is_empty());

        let err = loc
            .prepare_launch(Tool::Assistant, Some(exe), Some(Utf8Path::new("form.ui")))
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::UnsupportedFileType { .. }));
    }
}
