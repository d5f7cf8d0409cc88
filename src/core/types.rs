//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`FileId`] - Reference to an analyzed source file
//! - [`AssetId`] - `(subname, mimetype, file)` key of one sub-asset
//! - [`MetaDataValue`] - Typed metadata value (bool, int, double, string)
//! - [`AssetSelector`] - Parsed `name(mimetype)` command-line selector
//!
//! # Identity
//!
//! Within one file, an asset is identified by `(subname, mimetype)`. The
//! `subname` alone may be shared by several assets of different mimetypes
//! (e.g. a texture exported both as PNG and JPEG).
//!
//! # Examples
//!
//! ```
//! use damn::core::types::{AssetId, FileId, MetaDataValue};
//!
//! let file = FileId::new("/scenes/car.blend");
//! let wheel = AssetId::new("wheel", "application/x-blender.mesh", file.clone());
//! assert_eq!(wheel.to_string(), "wheel(application/x-blender.mesh)");
//!
//! let faces = MetaDataValue::Int(128);
//! assert_eq!(faces.as_int(), Some(128));
//! assert_eq!(faces.as_str(), None);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid asset selector: {0}")]
    InvalidSelector(String),

    #[error("unknown metadata type tag: {0}")]
    UnknownMetaDataType(i32),
}

/// Opaque reference to a source file.
///
/// Identity is by path value; no normalization is applied beyond what the
/// producer (usually an analyzer) chose to store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Create a file reference from a path string.
    pub fn new(filename: impl Into<String>) -> Self {
        Self(filename.into())
    }

    /// The stored path.
    pub fn filename(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key identifying one asset inside a source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId {
    /// Name of the asset inside its file.
    pub subname: String,
    /// Mimetype of the asset.
    pub mimetype: String,
    /// File containing the asset.
    pub file: FileId,
}

impl AssetId {
    /// Create a new asset id.
    pub fn new(subname: impl Into<String>, mimetype: impl Into<String>, file: FileId) -> Self {
        Self {
            subname: subname.into(),
            mimetype: mimetype.into(),
            file,
        }
    }

    /// The identity key within a single file: `(subname, mimetype)`.
    pub fn key(&self) -> (&str, &str) {
        (&self.subname, &self.mimetype)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.subname, self.mimetype)
    }
}

/// Wire discriminant of a [`MetaDataValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaDataType {
    Bool,
    Int,
    Double,
    String,
}

impl MetaDataType {
    /// The numeric tag written on the wire.
    pub fn tag(self) -> i32 {
        match self {
            MetaDataType::Bool => 1,
            MetaDataType::Int => 2,
            MetaDataType::Double => 3,
            MetaDataType::String => 4,
        }
    }

    /// Map a wire tag back to its type.
    pub fn from_tag(tag: i32) -> Result<Self, TypeError> {
        match tag {
            1 => Ok(MetaDataType::Bool),
            2 => Ok(MetaDataType::Int),
            3 => Ok(MetaDataType::Double),
            4 => Ok(MetaDataType::String),
            other => Err(TypeError::UnknownMetaDataType(other)),
        }
    }

    /// Uppercase name, as shown by `damn inspect`.
    pub fn name(self) -> &'static str {
        match self {
            MetaDataType::Bool => "BOOL",
            MetaDataType::Int => "INT",
            MetaDataType::Double => "DOUBLE",
            MetaDataType::String => "STRING",
        }
    }
}

/// A typed metadata value attached to an asset.
///
/// Exactly one payload exists per value, so a tag/payload mismatch cannot
/// be represented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaDataValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl MetaDataValue {
    /// The discriminant of this value.
    pub fn kind(&self) -> MetaDataType {
        match self {
            MetaDataValue::Bool(_) => MetaDataType::Bool,
            MetaDataValue::Int(_) => MetaDataType::Int,
            MetaDataValue::Double(_) => MetaDataType::Double,
            MetaDataValue::String(_) => MetaDataType::String,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaDataValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            MetaDataValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            MetaDataValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaDataValue::String(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for MetaDataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaDataValue::Bool(v) => write!(f, "{}", v),
            MetaDataValue::Int(v) => write!(f, "{}", v),
            MetaDataValue::Double(v) => write!(f, "{}", v),
            MetaDataValue::String(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for MetaDataValue {
    fn from(v: bool) -> Self {
        MetaDataValue::Bool(v)
    }
}

impl From<i64> for MetaDataValue {
    fn from(v: i64) -> Self {
        MetaDataValue::Int(v)
    }
}

impl From<f64> for MetaDataValue {
    fn from(v: f64) -> Self {
        MetaDataValue::Double(v)
    }
}

impl From<&str> for MetaDataValue {
    fn from(v: &str) -> Self {
        MetaDataValue::String(v.to_string())
    }
}

impl From<String> for MetaDataValue {
    fn from(v: String) -> Self {
        MetaDataValue::String(v)
    }
}

/// An asset selector as typed on the command line: `name` or `name(mimetype)`.
///
/// # Example
///
/// ```
/// use damn::core::types::AssetSelector;
///
/// let sel = AssetSelector::parse("diffuse(image/png)").unwrap();
/// assert_eq!(sel.subname, "diffuse");
/// assert_eq!(sel.mimetype.as_deref(), Some("image/png"));
///
/// let sel = AssetSelector::parse("diffuse").unwrap();
/// assert!(sel.mimetype.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSelector {
    pub subname: String,
    pub mimetype: Option<String>,
}

impl AssetSelector {
    /// Parse a selector.
    ///
    /// The mimetype hint is the text between the last `(` and a trailing `)`,
    /// so subnames may themselves contain parentheses.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TypeError::InvalidSelector("empty asset name".into()));
        }

        if let Some(inner) = raw.strip_suffix(')') {
            let open = inner.rfind('(').ok_or_else(|| {
                TypeError::InvalidSelector(format!("unbalanced parentheses in '{}'", raw))
            })?;
            let subname = &inner[..open];
            let mimetype = &inner[open + 1..];
            if subname.is_empty() || mimetype.is_empty() {
                return Err(TypeError::InvalidSelector(format!(
                    "expected 'name(mimetype)', got '{}'",
                    raw
                )));
            }
            return Ok(Self {
                subname: subname.to_string(),
                mimetype: Some(mimetype.to_string()),
            });
        }

        Ok(Self {
            subname: raw.to_string(),
            mimetype: None,
        })
    }
}
