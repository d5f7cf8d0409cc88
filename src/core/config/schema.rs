//! core::config::schema
//!
//! Configuration file schema.
//!
//! # Validation
//!
//! Values are validated after parsing; unknown keys are rejected by serde.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Contents of `config.toml`.
///
/// # Example
///
/// ```toml
/// store_path = "/var/lib/damn/store"
/// output_path = "/var/lib/damn/out"
///
/// [plugins]
/// disabled = ["text"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Default store root for `damn analyze`
    pub store_path: Option<PathBuf>,

    /// Root directory transcoders write into
    pub output_path: Option<PathBuf>,

    /// Plugin settings
    pub plugins: Option<PluginsConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, path) in [("store_path", &self.store_path), ("output_path", &self.output_path)] {
            if matches!(path, Some(p) if p.as_os_str().is_empty()) {
                return Err(ConfigError::InvalidValue(format!("{} cannot be empty", key)));
            }
        }

        if let Some(plugins) = &self.plugins {
            plugins.validate()?;
        }

        Ok(())
    }
}

/// `[plugins]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PluginsConfig {
    /// Plugin names treated as not activated
    pub disabled: Vec<String>,
}

impl PluginsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.disabled.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::InvalidValue(
                "plugin names in [plugins].disabled cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
