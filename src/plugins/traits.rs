//! plugins::traits
//!
//! Capability interfaces implemented by analyzer and transcoder plugins.
//!
//! # Design
//!
//! Plugins are plain values registered on a [`Registry`](super::Registry).
//! Calls are synchronous; a transcoder may block for as long as its
//! conversion takes, and callers wanting a bound must impose it themselves.

use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::core::graph::GraphError;
use crate::core::metadata::FileReference;
use crate::core::options::{BaseOption, OptionDescriptor, Options, PathTemplate};
use crate::core::types::AssetId;

/// Errors from plugin operations.
#[derive(Debug, Error)]
pub enum PluginError {
    /// No extension-based mimetype for the file.
    #[error("cannot determine the mimetype of '{0}'")]
    UnknownFileType(PathBuf),

    /// No active analyzer handles the mimetype.
    #[error("no analyzer for mimetype '{0}'")]
    NoAnalyzer(String),

    #[error("analysis of '{path}' failed: {message}")]
    AnalysisFailed { path: PathBuf, message: String },

    /// The analyzer produced an inconsistent graph.
    #[error("analyzer produced an invalid graph: {0}")]
    InvalidGraph(#[from] GraphError),

    #[error("transcode failed: {0}")]
    TranscodeFailed(String),

    /// A computed output path would leave the output root.
    #[error("output path escapes the output directory: '{0}'")]
    InvalidOutputPath(String),

    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PluginError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        PluginError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One conversion offered for a source mimetype.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub target: String,
    pub options: Vec<OptionDescriptor>,
}

/// Ordered `source → [(target, options)]` declaration of a transcoder.
///
/// Insertion order is preserved so the capability index built from it is
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct ConvertMap {
    entries: Vec<(String, Vec<Conversion>)>,
}

impl ConvertMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `source → target` with its option descriptors.
    pub fn with(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        options: Vec<OptionDescriptor>,
    ) -> Self {
        let source = source.into();
        let conversion = Conversion {
            target: target.into(),
            options,
        };
        match self.entries.iter_mut().find(|(s, _)| *s == source) {
            Some((_, conversions)) => conversions.push(conversion),
            None => self.entries.push((source, vec![conversion])),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Conversion])> {
        self.entries.iter().map(|(s, c)| (s.as_str(), c.as_slice()))
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(s, _)| s.as_str())
    }

    /// Option descriptors for `source → target`, if declared.
    pub fn options(&self, source: &str, target: &str) -> Option<&[OptionDescriptor]> {
        self.entries
            .iter()
            .find(|(s, _)| s == source)
            .and_then(|(_, conversions)| conversions.iter().find(|c| c.target == target))
            .map(|c| c.options.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Human-readable description of one conversion option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetMimetypeOption {
    pub name: String,
    pub description: String,
    pub type_description: String,
    pub constraint_description: String,
    pub default_value: String,
    pub is_array: bool,
}

impl TargetMimetypeOption {
    pub fn from_descriptor(descriptor: &dyn BaseOption) -> Self {
        Self {
            name: descriptor.name().to_string(),
            description: descriptor.description().to_string(),
            type_description: descriptor.type_description(),
            constraint_description: descriptor.constraint_description(),
            default_value: descriptor.default_description(),
            is_array: descriptor.is_array(),
        }
    }
}

/// A destination format offered for a source mimetype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetMimetype {
    pub mimetype: String,
    /// Description of the plugin offering it
    pub description: String,
    pub template: PathTemplate,
    pub options: Vec<TargetMimetypeOption>,
}

/// Everything a transcoder needs to convert one asset.
#[derive(Debug, Clone, Copy)]
pub struct TranscodeRequest<'a> {
    /// Directory the output paths are relative to
    pub output_root: &'a Path,
    pub file: &'a FileReference,
    pub asset: &'a AssetId,
    pub target: &'a TargetMimetype,
    /// Typed options, defaults included
    pub options: &'a Options,
    /// Relative output paths, one per file to write
    pub paths: &'a [String],
}

impl TranscodeRequest<'_> {
    /// Join a relative output path onto the output root.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidOutputPath`] for absolute paths and
    /// paths with `..` components.
    pub fn output_path(&self, relative: &str) -> Result<PathBuf, PluginError> {
        let path = Path::new(relative);
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.is_empty() || escapes {
            return Err(PluginError::InvalidOutputPath(relative.to_string()));
        }
        Ok(self.output_root.join(path))
    }
}

/// Extracts an asset graph from source files of the handled mimetypes.
pub trait Analyzer: Send + Sync {
    fn name(&self) -> &str;

    /// Source mimetypes this analyzer understands.
    fn handled_types(&self) -> &[String];

    fn analyze(&self, path: &Path) -> Result<FileReference, PluginError>;
}

/// Converts assets between mimetypes.
pub trait Transcoder: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Inactive transcoders are left out of the capability index.
    fn is_activated(&self) -> bool {
        true
    }

    fn convert_map(&self) -> &ConvertMap;

    /// Perform the conversion and return the paths written.
    fn transcode(&self, request: &TranscodeRequest<'_>) -> Result<Vec<PathBuf>, PluginError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::{ArrayOption, FloatOption, IntVectorOption};
    use crate::core::types::FileId;
    use std::sync::Arc;

    #[test]
    fn convert_map_groups_by_source_in_order() {
        let map = ConvertMap::new()
            .with("a/x", "b/y", vec![])
            .with("c/z", "b/y", vec![])
            .with("a/x", "d/w", vec![Arc::new(FloatOption::new("angle", "Angle"))]);

        assert_eq!(map.sources().collect::<Vec<_>>(), vec!["a/x", "c/z"]);
        let targets: Vec<_> = map
            .iter()
            .next()
            .unwrap()
            .1
            .iter()
            .map(|c| c.target.as_str())
            .collect();
        assert_eq!(targets, vec!["b/y", "d/w"]);
        assert_eq!(map.options("a/x", "d/w").unwrap().len(), 1);
        assert!(map.options("a/x", "q/q").is_none());
        assert!(map.options("q/q", "b/y").is_none());
    }

    #[test]
    fn option_record_from_descriptor() {
        let descriptor = IntVectorOption::new("size", "Output size")
            .with_size(2)
            .with_range(1, 4096)
            .with_default(vec![256, 256]);
        let record = TargetMimetypeOption::from_descriptor(&descriptor);
        assert_eq!(record.name, "size");
        assert_eq!(record.description, "Output size");
        assert_eq!(record.type_description, "int2");
        assert_eq!(record.constraint_description, "Value needs to be between 1 and 4096");
        assert_eq!(record.default_value, "256,256");
        assert!(!record.is_array);

        let array = ArrayOption::new(Arc::new(FloatOption::new("angle", "Angle")));
        assert!(TargetMimetypeOption::from_descriptor(&array).is_array);
    }

    #[test]
    fn output_path_stays_under_root() {
        let file = FileReference::new(FileId::new("/tmp/a.txt"), "h");
        let asset = AssetId::new("a.txt", "text/plain", file.file.clone());
        let target = TargetMimetype {
            mimetype: "text/html".into(),
            description: String::new(),
            template: PathTemplate::default(),
            options: vec![],
        };
        let options = Options::new();
        let request = TranscodeRequest {
            output_root: Path::new("/out"),
            file: &file,
            asset: &asset,
            target: &target,
            options: &options,
            paths: &[],
        };

        assert_eq!(
            request.output_path("assets/x/y.html").unwrap(),
            PathBuf::from("/out/assets/x/y.html")
        );
        for bad in ["", "/etc/passwd", "assets/../../x"] {
            assert!(
                matches!(request.output_path(bad), Err(PluginError::InvalidOutputPath(_))),
                "{bad}"
            );
        }
    }
}
