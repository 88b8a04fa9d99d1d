use crate::models::ToolsConfig;
use crate::services::natvis::NATVIS_FILENAME;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use std::fs;

/// Settings filename inside the configuration directory.
pub const SETTINGS_FILENAME: &str = "qttools.yaml";

/// Prefix of environment variables overriding settings (`QTTOOLS_QT_DIR`, ...).
pub const ENV_PREFIX: &str = "QTTOOLS";

/// Configuration manager for loading and saving the YAML settings file.
///
/// Loading is layered: defaults, then `qttools.yaml`, then `QTTOOLS_*`
/// environment variables. `extra_search_directories` may be given in the
/// environment as a comma separated list.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing `qttools.yaml` (e.g., ".qttools")
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            settings_path: config_dir.join(SETTINGS_FILENAME),
            config_dir,
        })
    }

    /// Load the settings.
    ///
    /// # Returns
    /// The layered ToolsConfig; defaults (plus environment) if the file doesn't exist
    pub fn load_config(&self) -> Result<ToolsConfig> {
        if !self.settings_path.exists() {
            tracing::debug!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
        }

        let settings = Config::builder()
            .add_source(File::new(self.settings_path.as_str(), FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("extra_search_directories"),
            )
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let config: ToolsConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::debug!("Loaded settings from {}", self.settings_path);
        Ok(config)
    }

    /// Save the settings file.
    pub fn save_config(&self, config: &ToolsConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Where the natvis file goes: the configured output, else the config directory.
    pub fn natvis_output_path(
        &self,
        config: &ToolsConfig,
        workspace: Option<&Utf8Path>,
    ) -> Utf8PathBuf {
        let configured = crate::models::substitute_workspace(&config.natvis_output, workspace);
        if configured.is_empty() {
            self.config_dir.join(NATVIS_FILENAME)
        } else {
            Utf8PathBuf::from(configured)
        }
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}
