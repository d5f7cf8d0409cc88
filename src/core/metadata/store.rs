//! core::metadata::store
//!
//! Filesystem metadata store.
//!
//! # Layout
//!
//! A store is a directory. Each key is one file directly inside it whose
//! contents are the [`codec`](super::codec) encoding of a `FileReference`.
//! There is no index, manifest or subdirectory; the directory listing is
//! the catalog.
//!
//! # Concurrency
//!
//! Reads and writes are whole-file with no locking and no atomic rename.
//! Two writers racing on the same key may leave a corrupt entry, which later
//! reads report as [`StoreError::Malformed`]. Callers that need safety must
//! serialize writes per key themselves.
//!
//! # Example
//!
//! ```no_run
//! use damn::core::metadata::store::MetadataStore;
//! use damn::core::metadata::FileReference;
//! use damn::core::types::FileId;
//!
//! let store = MetadataStore::open("/tmp/damn-store")?;
//! let graph = FileReference::new(FileId::new("/tmp/a.txt"), "abc");
//!
//! store.write("abc", &graph)?;
//! assert!(store.exists("abc")?);
//! assert_eq!(store.read("abc")?, graph);
//! # Ok::<(), damn::core::metadata::store::StoreError>(())
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::codec::{self, CodecError};
use super::schema::FileReference;

/// Errors from metadata storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No entry exists for the key.
    #[error("metadata not found for key: {0}")]
    NotFound(String),

    /// The entry exists but does not decode.
    #[error("corrupt metadata for key '{key}': {source}")]
    Malformed {
        key: String,
        #[source]
        source: CodecError,
    },

    /// The key cannot name a file directly inside the store.
    #[error("invalid store key: '{0}'")]
    InvalidKey(String),

    /// Filesystem failure.
    #[error("store I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A local, file-per-key store of serialized asset graphs.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    root: PathBuf,
}

impl MetadataStore {
    /// Open a store rooted at `root`, creating the directory if absent.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        tracing::debug!(root = %root.display(), "opened metadata store");
        Ok(Self { root })
    }

    /// The store directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk path of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] for empty keys, `.`/`..`, and keys
    /// containing a path separator.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let has_separator = key.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
        if key.is_empty() || key == "." || key == ".." || has_separator {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }

    /// Check whether an entry exists for `key`.
    ///
    /// # Errors
    ///
    /// A key that [`path_for`](Self::path_for) rejects can never have been
    /// written, but it is reported as [`StoreError::InvalidKey`] rather than
    /// `Ok(false)`, the same as for `read` and `write`.
    pub fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.path_for(key)?.is_file())
    }

    /// Read and decode the entry for `key`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no entry exists
    /// - [`StoreError::Malformed`] if the entry does not decode
    pub fn read(&self, key: &str) -> Result<FileReference, StoreError> {
        let path = self.path_for(key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(key.to_string()))
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        tracing::debug!(key, bytes = bytes.len(), "read metadata entry");
        codec::decode(&bytes).map_err(|source| StoreError::Malformed {
            key: key.to_string(),
            source,
        })
    }

    /// Encode and write `file` under `key`, overwriting any previous entry.
    ///
    /// Returns the written value for chaining.
    pub fn write<'f>(
        &self,
        key: &str,
        file: &'f FileReference,
    ) -> Result<&'f FileReference, StoreError> {
        let path = self.path_for(key)?;
        let bytes = codec::encode(file);
        fs::write(&path, &bytes).map_err(|e| StoreError::io(&path, e))?;
        tracing::debug!(
            key,
            bytes = bytes.len(),
            assets = file.assets.len(),
            "wrote metadata entry"
        );
        Ok(file)
    }

    /// List the keys present in the store, sorted.
    ///
    /// Subdirectories and names that are not valid UTF-8 are ignored.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            let is_file = entry
                .file_type()
                .map_err(|e| StoreError::io(&entry.path(), e))?
                .is_file();
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                keys.push(name.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}
