//! Host OS naming policy for Qt executables.
//!
//! Every OS-dependent filename decision lives here so the resolver and the tool
//! locator never branch on the platform themselves:
//! - executable extension (`.exe` on Windows)
//! - `PATH` list separator
//! - candidate filenames per [`Tool`], including macOS `.app` bundle layouts

use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

/// Operating system family the naming rules are evaluated for.
///
/// Passed explicitly (instead of reading `cfg!` at each call site) so tests can
/// exercise Windows and macOS layouts on any host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    MacOs,
    Linux,
}

impl HostOs {
    /// The OS this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            HostOs::Windows
        } else if cfg!(target_os = "macos") {
            HostOs::MacOs
        } else {
            HostOs::Linux
        }
    }

    /// `.exe` on Windows, empty otherwise.
    pub fn exe_extension(self) -> &'static str {
        match self {
            HostOs::Windows => ".exe",
            HostOs::MacOs | HostOs::Linux => "",
        }
    }

    /// Separator used by the `PATH` environment variable.
    pub fn path_list_separator(self) -> char {
        match self {
            HostOs::Windows => ';',
            HostOs::MacOs | HostOs::Linux => ':',
        }
    }

    /// Whether GUI tools ship as `.app` bundles.
    pub fn is_bundle_os(self) -> bool {
        self == HostOs::MacOs
    }

    /// Filename of the qmake marker executable.
    pub fn qmake_filename(self) -> String {
        format!("qmake{}", self.exe_extension())
    }
}

/// Companion GUI applications that can be located and launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Designer,
    Assistant,
    Creator,
}

impl Tool {
    /// Human readable name used in logs and error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Tool::Designer => "Qt Designer",
            Tool::Assistant => "Qt Assistant",
            Tool::Creator => "Qt Creator",
        }
    }

    /// Name of the executable inside the macOS bundle.
    pub fn bundle_name(self) -> &'static str {
        match self {
            Tool::Designer => "Designer",
            Tool::Assistant => "Assistant",
            Tool::Creator => "Qt Creator",
        }
    }

    /// File extensions (without dot) accepted as a launch argument.
    ///
    /// An empty slice means the tool is launched without a file.
    pub fn accepted_extensions(self) -> &'static [&'static str] {
        match self {
            Tool::Designer => &["ui"],
            Tool::Assistant => &[],
            Tool::Creator => &["ui", "qrc"],
        }
    }

    /// Whether a directory may be passed instead of a file.
    pub fn accepts_directories(self) -> bool {
        self == Tool::Creator
    }

    fn base_names(self) -> (&'static str, &'static str) {
        match self {
            Tool::Designer => ("designer", "Designer"),
            Tool::Assistant => ("assistant", "Assistant"),
            Tool::Creator => ("qtcreator", "QtCreator"),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Ordered candidate filenames for `tool` on `os`.
///
/// Plain name first, then the capitalized variant, then (macOS only) the
/// executable nested in the application bundle.
pub fn candidate_filenames(tool: Tool, os: HostOs) -> Vec<String> {
    let ext = os.exe_extension();
    let (plain, capitalized) = tool.base_names();

    let mut names = vec![format!("{plain}{ext}"), format!("{capitalized}{ext}")];
    if os.is_bundle_os() {
        let bundle = tool.bundle_name();
        names.push(format!("{bundle}.app/Contents/MacOS/{bundle}"));
    }
    names
}

/// Rewrite a `.app` bundle path to the executable inside it.
///
/// Only applies on macOS; any other path (or OS) is returned unchanged.
pub fn bundle_executable(path: &Utf8Path, tool: Tool, os: HostOs) -> Utf8PathBuf {
    if os.is_bundle_os() && path.extension() == Some("app") {
        path.join("Contents").join("MacOS").join(tool.bundle_name())
    } else {
        path.to_path_buf()
    }
}
