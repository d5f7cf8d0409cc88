//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first existing file wins:
//! 1. `--config <path>` (must exist)
//! 2. `$DAMN_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/damn/config.toml`
//! 4. `~/.damn/config.toml`
//!
//! A missing file is not an error; defaults are used.
//!
//! # Example
//!
//! ```no_run
//! use damn::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! if let Some(root) = config.store_path() {
//!     println!("Store: {}", root.display());
//! }
//! println!("Disabled: {:?}", config.disabled_plugins());
//! ```

pub mod schema;

pub use schema::{FileConfig, PluginsConfig};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("config file not found: '{0}'")]
    NotFound(PathBuf),

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub file: FileConfig,
    /// Path the config was read from (if any)
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load configuration.
    ///
    /// `explicit` is the `--config` flag; when given the file must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from(path);
        }

        let candidates = candidate_paths(|key| std::env::var(key).ok(), dirs::home_dir());
        match candidates.into_iter().find(|p| p.is_file()) {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("no config file found, using defaults");
                Ok(Config::default())
            }
        }
    }

    /// Read, parse and validate a specific config file.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(Config {
            file,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    /// Wrap an in-memory config, e.g. for tests.
    pub fn from_file(file: FileConfig) -> Config {
        Config {
            file,
            loaded_from: None,
        }
    }

    /// Default store root, if configured.
    pub fn store_path(&self) -> Option<&Path> {
        self.file.store_path.as_deref()
    }

    /// Transcoder output root, if configured.
    pub fn output_path(&self) -> Option<&Path> {
        self.file.output_path.as_deref()
    }

    /// Plugin names disabled by configuration.
    pub fn disabled_plugins(&self) -> &[String] {
        self.file
            .plugins
            .as_ref()
            .map(|p| p.disabled.as_slice())
            .unwrap_or(&[])
    }

    /// Path of the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}

/// Candidate config locations in lookup order.
fn candidate_paths(
    env: impl Fn(&str) -> Option<String>,
    home: Option<PathBuf>,
) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(path) = env("DAMN_CONFIG") {
        paths.push(PathBuf::from(path));
    }
    if let Some(xdg_home) = env("XDG_CONFIG_HOME") {
        paths.push(PathBuf::from(xdg_home).join("damn/config.toml"));
    }
    if let Some(home) = home {
        paths.push(home.join(".damn/config.toml"));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn candidate_order() {
        let env = |key: &str| match key {
            "DAMN_CONFIG" => Some("/etc/damn.toml".to_string()),
            "XDG_CONFIG_HOME" => Some("/xdg".to_string()),
            _ => None,
        };
        assert_eq!(
            candidate_paths(env, Some(PathBuf::from("/home/u"))),
            vec![
                PathBuf::from("/etc/damn.toml"),
                PathBuf::from("/xdg/damn/config.toml"),
                PathBuf::from("/home/u/.damn/config.toml"),
            ]
        );
        assert!(candidate_paths(|_| None, None).is_empty());
    }

    #[test]
    fn load_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
            store_path = "/srv/store"

            [plugins]
            disabled = ["text"]
            "#,
        )
        .unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.store_path(), Some(Path::new("/srv/store")));
        assert!(config.output_path().is_none());
        assert_eq!(config.disabled_plugins(), &["text".to_string()]);
        assert_eq!(config.loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let result = Config::load(Some(temp.path().join("nope.toml").as_path()));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn parse_error_names_the_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "store_path = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.store_path().is_none());
        assert!(config.disabled_plugins().is_empty());
        assert!(config.loaded_from().is_none());
    }
}
