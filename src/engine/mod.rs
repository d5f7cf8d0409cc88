//! engine
//!
//! Ties the store, the plugin registry and the dispatcher together.
//!
//! # Architecture
//!
//! Commands build a [`Context`] from CLI flags and configuration, then go
//! through the functions here rather than touching plugins directly:
//!
//! ```text
//! analyze:   file -> Registry::analyze -> validate -> MetadataStore::write
//! transcode: entry -> MetadataStore::read -> resolve asset -> dispatch
//! ```
//!
//! A store entry is addressed by its path: the parent directory is the store
//! root and the file name is the key.
//!
//! # Example
//!
//! ```no_run
//! use damn::engine::{load_entry, Context};
//! use std::path::Path;
//!
//! let ctx = Context::default();
//! let (store, file) = load_entry(Path::new("/srv/store/3f2a9c")).unwrap();
//! let dispatcher = ctx.dispatcher(store.root());
//! for (source, targets) in dispatcher.get_target_mimetypes() {
//!     println!("{}: {} targets", source, targets.len());
//! }
//! # let _ = file;
//! ```

pub mod dispatch;

pub use dispatch::{DispatchError, TranscodeDispatcher};

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::config::Config;
use crate::core::metadata::{FileReference, MetadataStore, StoreError};
use crate::plugins::{PluginError, Registry};
use crate::ui::output::Verbosity;

/// Execution context for commands.
///
/// Global settings derived from CLI flags and the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    pub config: Config,
}

impl Context {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }

    /// Built-in plugins minus those disabled in the configuration.
    pub fn registry(&self) -> Registry {
        Registry::builtin().with_disabled(self.config.disabled_plugins().iter().cloned())
    }

    /// Dispatcher writing under the configured output root, or `store_root`.
    pub fn dispatcher(&self, store_root: &Path) -> TranscodeDispatcher {
        let output_root = self.config.output_path().unwrap_or(store_root);
        TranscodeDispatcher::new(&self.registry(), output_root)
    }
}

/// Errors from engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The path cannot address a store entry.
    #[error("not a store entry path: '{0}'")]
    InvalidEntry(PathBuf),
}

/// Split an entry path into its store root and key.
pub fn split_entry(entry: &Path) -> Result<(PathBuf, String), EngineError> {
    let key = entry
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| EngineError::InvalidEntry(entry.to_path_buf()))?;
    let root = match entry.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((root, key.to_string()))
}

/// Read the `FileReference` stored at `entry`.
///
/// # Errors
///
/// - [`StoreError::NotFound`] if the entry does not exist
/// - [`StoreError::Malformed`] if it does not decode
pub fn load_entry(entry: &Path) -> Result<(MetadataStore, FileReference), EngineError> {
    let (root, key) = split_entry(entry)?;
    let store = MetadataStore::open(root)?;
    let file = store.read(&key)?;
    Ok((store, file))
}

/// Analyze `path` and store the result under its hash in `store_root`.
///
/// Returns the entry path and the stored graph.
pub fn analyze_into_store(
    registry: &Registry,
    path: &Path,
    store_root: &Path,
) -> Result<(PathBuf, FileReference), EngineError> {
    let file = registry.analyze(path)?;
    let store = MetadataStore::open(store_root)?;
    let key = if file.hash.is_empty() {
        // Analyzers without a content hash are keyed by file name.
        path.file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| EngineError::InvalidEntry(path.to_path_buf()))?
            .to_string()
    } else {
        file.hash.clone()
    };
    store.write(&key, &file)?;
    let entry = store.path_for(&key)?;
    tracing::debug!(entry = %entry.display(), assets = file.assets.len(), "stored analysis");
    Ok((entry, file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{FileConfig, PluginsConfig};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn split_entry_paths() {
        let (root, key) = split_entry(Path::new("/srv/store/abc")).unwrap();
        assert_eq!(root, PathBuf::from("/srv/store"));
        assert_eq!(key, "abc");

        let (root, key) = split_entry(Path::new("abc")).unwrap();
        assert_eq!(root, PathBuf::from("."));
        assert_eq!(key, "abc");

        assert!(split_entry(Path::new("/")).is_err());
    }

    #[test]
    fn analyze_then_load() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("readme.txt");
        fs::write(&source, "hello world\n").unwrap();
        let store_root = dir.path().join("store");

        let ctx = Context::default();
        let (entry, stored) = analyze_into_store(&ctx.registry(), &source, &store_root).unwrap();
        assert_eq!(entry.parent(), Some(store_root.as_path()));
        assert_eq!(entry.file_name().unwrap().to_str().unwrap(), stored.hash);

        let (store, loaded) = load_entry(&entry).unwrap();
        assert_eq!(store.root(), store_root.as_path());
        assert_eq!(loaded, stored);
    }

    #[test]
    fn load_missing_entry() {
        let dir = TempDir::new().unwrap();
        let err = load_entry(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, EngineError::Store(StoreError::NotFound(_))));
    }

    #[test]
    fn disabled_plugins_leave_the_index() {
        let ctx = Context {
            config: Config::from_file(FileConfig {
                plugins: Some(PluginsConfig {
                    disabled: vec!["text".to_string()],
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(ctx.dispatcher(Path::new("/tmp")).get_target_mimetypes().is_empty());
        assert!(ctx.registry().analyzer_for("text/plain").is_none());
    }

    #[test]
    fn output_root_prefers_config() {
        let ctx = Context::default();
        assert_eq!(ctx.dispatcher(Path::new("/store")).output_root(), Path::new("/store"));

        let ctx = Context {
            config: Config::from_file(FileConfig {
                output_path: Some(PathBuf::from("/out")),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(ctx.dispatcher(Path::new("/store")).output_root(), Path::new("/out"));
    }
}
