//! core::metadata::schema
//!
//! Asset graph schema: one [`FileReference`] per analyzed source file,
//! holding an ordered list of [`AssetReference`]s.
//!
//! # Design
//!
//! - Values are plain data, immutable once built (use [`FileReference::builder`])
//! - Metadata keys are unique and kept sorted, so encoding is deterministic
//! - Dependencies are ordered and may point into other files
//!
//! # Example
//!
//! ```
//! use damn::core::metadata::schema::{AssetReference, FileReference};
//! use damn::core::types::{AssetId, FileId};
//!
//! let file = FileId::new("/scenes/car.blend");
//! let texture = AssetId::new("paint", "image/png", file.clone());
//! let material = AssetId::new("body", "application/x-blender.material", file.clone());
//!
//! let graph = FileReference::builder(file, "3f7a")
//!     .asset(AssetReference::new(texture.clone()).with_metadata("width", 512i64))
//!     .asset(AssetReference::new(material).depends_on(texture))
//!     .build();
//!
//! assert_eq!(graph.assets.len(), 2);
//! assert!(graph.find("paint", "image/png").is_some());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{AssetId, FileId, MetaDataValue};

/// One sub-asset: its id, typed properties and outgoing edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetReference {
    pub asset: AssetId,
    pub metadata: BTreeMap<String, MetaDataValue>,
    pub dependencies: Vec<AssetId>,
}

impl AssetReference {
    /// Create an asset reference without metadata or dependencies.
    pub fn new(asset: AssetId) -> Self {
        Self {
            asset,
            metadata: BTreeMap::new(),
            dependencies: Vec::new(),
        }
    }

    /// Attach a metadata entry, replacing any previous value for `key`.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetaDataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Append a dependency edge.
    pub fn depends_on(mut self, dependency: AssetId) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Look up a metadata value.
    pub fn get(&self, key: &str) -> Option<&MetaDataValue> {
        self.metadata.get(key)
    }
}

/// The analyzed asset graph of one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReference {
    pub file: FileId,
    /// Content hash of the source file, as computed by the analyzer.
    pub hash: String,
    pub assets: Vec<AssetReference>,
}

impl FileReference {
    /// Create an empty file reference.
    pub fn new(file: FileId, hash: impl Into<String>) -> Self {
        Self {
            file,
            hash: hash.into(),
            assets: Vec::new(),
        }
    }

    /// Start building a file reference.
    pub fn builder(file: FileId, hash: impl Into<String>) -> FileReferenceBuilder {
        FileReferenceBuilder {
            inner: Self::new(file, hash),
        }
    }

    /// All asset ids, in declaration order.
    pub fn asset_ids(&self) -> impl Iterator<Item = &AssetId> {
        self.assets.iter().map(|a| &a.asset)
    }

    /// Find an asset by its `(subname, mimetype)` identity.
    pub fn find(&self, subname: &str, mimetype: &str) -> Option<&AssetReference> {
        self.assets
            .iter()
            .find(|a| a.asset.subname == subname && a.asset.mimetype == mimetype)
    }

    /// All assets sharing `subname`, whatever their mimetype.
    pub fn find_by_subname<'a>(&'a self, subname: &'a str) -> impl Iterator<Item = &'a AssetReference> {
        self.assets.iter().filter(move |a| a.asset.subname == subname)
    }
}

/// Builder for [`FileReference`].
#[derive(Debug, Clone)]
pub struct FileReferenceBuilder {
    inner: FileReference,
}

impl FileReferenceBuilder {
    /// Append an asset.
    pub fn asset(mut self, asset: AssetReference) -> Self {
        self.inner.assets.push(asset);
        self
    }

    pub fn build(self) -> FileReference {
        self.inner
    }
}
