use std::path::Path;

use serde_json::Value;

use crate::config::data::ConfigData;
use crate::config::error::ConfigError;
use crate::utils::files_with_extensions;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the canonical file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Every extension recognised with the enabled features
    pub fn known_extensions() -> Vec<&'static str> {
        let mut extensions = vec!["json"];
        #[cfg(feature = "yaml-config")]
        extensions.extend(["yaml", "yml"]);
        #[cfg(feature = "toml-config")]
        extensions.push("toml");
        extensions
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }

    /// Parse `data` into a JSON value tree
    pub fn parse(&self, data: &str, path: &Path) -> Result<Value, ConfigError> {
        let wrap = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::DeserializationError {
            format: self.extension().to_string(),
            path: path.to_path_buf(),
            source,
        };
        match self {
            ConfigFormat::Json => serde_json::from_str(data).map_err(|e| wrap(Box::new(e))),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(|e| wrap(Box::new(e))),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(|e| wrap(Box::new(e))),
        }
    }
}

/// Reads configuration files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a single file. The format comes from its extension.
    ///
    /// Returns `Ok(None)` for unknown extensions.
    pub fn load_file(path: &Path) -> Result<Option<Value>, ConfigError> {
        let Some(format) = ConfigFormat::from_path(path) else {
            log::debug!("Skipping configuration file with unknown format: {}", path.display());
            return Ok(None);
        };
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        format.parse(&content, path).map(Some)
    }

    /// Load every known configuration file in `dir`, keyed by file stem.
    ///
    /// `config/app.toml` lands under `app`. Files are merged in file-name order,
    /// so `app.json` and `app.toml` both feed `app` with the later one winning
    /// on conflicts. A missing directory yields an empty configuration.
    pub fn load_dir(dir: &Path) -> Result<ConfigData, ConfigError> {
        let files = files_with_extensions(dir, &ConfigFormat::known_extensions()).map_err(|source| {
            ConfigError::Io {
                path: dir.to_path_buf(),
                source,
            }
        })?;

        let mut config = ConfigData::new();
        for path in files {
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()).map(str::to_string) else {
                continue;
            };
            let Some(value) = Self::load_file(&path)? else {
                continue;
            };
            let mut fragment = ConfigData::new();
            fragment.set_value(&stem, value)?;
            config.merge(&fragment);
            log::debug!("Loaded configuration '{}' from {}", stem, path.display());
        }
        Ok(config)
    }
}
