//! Debugger visualizer (`.natvis`) generation for Qt types.
//!
//! The bundled template uses `%%QT_NAMESPACE%%` in front of every Qt type name.
//! Windows debuggers need `::` there when Qt was built without a namespace.

use crate::services::platform::HostOs;
use anyhow::{Context, Result};
use camino::Utf8Path;

/// Default output filename.
pub const NATVIS_FILENAME: &str = "qt.natvis.xml";

const NAMESPACE_PLACEHOLDER: &str = "%%QT_NAMESPACE%%";

const TEMPLATE: &str = include_str!("../../resources/qt.natvis.xml");

/// Namespace prefix used when none is configured.
pub fn default_namespace(os: HostOs) -> &'static str {
    match os {
        HostOs::Windows => "::",
        HostOs::MacOs | HostOs::Linux => "",
    }
}

/// Render the template with every placeholder replaced by `namespace`.
pub fn render(namespace: &str) -> String {
    TEMPLATE.replace(NAMESPACE_PLACEHOLDER, namespace)
}

/// Write the rendered visualizer file, creating parent directories.
pub async fn generate_natvis_file(output: &Utf8Path, namespace: &str) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create natvis directory: {}", parent))?;
    }

    tokio::fs::write(output, render(namespace))
        .await
        .with_context(|| format!("Failed to write natvis file: {}", output))?;

    tracing::info!("Generated natvis file {}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_render_replaces_every_placeholder() {
        let rendered = render("::");
        assert!(!rendered.contains(NAMESPACE_PLACEHOLDER));
        assert!(rendered.contains("Name=\"::QString\""));
        assert!(rendered.contains("Name=\"::QList&lt;*&gt;\""));
    }

    #[test]
    fn test_render_without_namespace() {
        let rendered = render("");
        assert!(rendered.contains("Name=\"QString\""));
    }

    #[test]
    fn test_default_namespace() {
        assert_eq!(default_namespace(HostOs::Windows), "::");
        assert_eq!(default_namespace(HostOs::Linux), "");
    }

    #[tokio::test]
    async fn test_generate_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let output = root.join("storage").join("nested").join(NATVIS_FILENAME);

        generate_natvis_file(&output, "qt6").await.unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.contains("qt6QByteArray"));
    }
}
