//! plugins::mock
//!
//! Mock plugins for deterministic testing.
//!
//! # Design
//!
//! [`MockAnalyzer`] returns a canned graph. [`MockTranscoder`] writes
//! nothing; it records every request and reports the paths it was asked to
//! produce, joined onto the output root.
//!
//! # Example
//!
//! ```
//! use damn::plugins::mock::MockTranscoder;
//! use damn::plugins::{ConvertMap, Transcoder};
//!
//! let mock = MockTranscoder::new(
//!     "mock",
//!     ConvertMap::new().with("image/png", "image/jpeg", vec![]),
//! );
//! assert!(mock.is_activated());
//! assert!(mock.calls().is_empty());
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::traits::{Analyzer, ConvertMap, PluginError, Transcoder, TranscodeRequest};
use crate::core::metadata::FileReference;
use crate::core::options::Options;
use crate::core::types::AssetId;

/// Analyzer returning a fixed graph.
#[derive(Debug, Clone)]
pub struct MockAnalyzer {
    name: String,
    handled_types: Vec<String>,
    result: FileReference,
}

impl MockAnalyzer {
    pub fn new<I, S>(name: impl Into<String>, handled_types: I, result: FileReference) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            handled_types: handled_types.into_iter().map(Into::into).collect(),
            result,
        }
    }
}

impl Analyzer for MockAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    fn handled_types(&self) -> &[String] {
        &self.handled_types
    }

    fn analyze(&self, _path: &Path) -> Result<FileReference, PluginError> {
        Ok(self.result.clone())
    }
}

/// A recorded transcode request.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub asset: AssetId,
    pub target: String,
    pub options: Options,
    pub paths: Vec<String>,
}

/// Transcoder recording its calls.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share the
/// recorded calls.
#[derive(Debug, Clone)]
pub struct MockTranscoder {
    name: String,
    description: String,
    activated: bool,
    convert_map: ConvertMap,
    inner: Arc<Mutex<MockTranscoderInner>>,
}

#[derive(Debug, Default)]
struct MockTranscoderInner {
    calls: Vec<MockCall>,
    fail_with: Option<String>,
}

impl MockTranscoder {
    pub fn new(name: impl Into<String>, convert_map: ConvertMap) -> Self {
        let name = name.into();
        Self {
            description: format!("{} (mock)", name),
            name,
            activated: true,
            convert_map,
            inner: Arc::default(),
        }
    }

    /// Mark the transcoder as not activated.
    pub fn inactive(mut self) -> Self {
        self.activated = false;
        self
    }

    /// Fail every subsequent transcode with `message`.
    pub fn fail_with(self, message: impl Into<String>) -> Self {
        self.inner.lock().unwrap().fail_with = Some(message.into());
        self
    }

    /// Calls recorded so far.
    pub fn calls(&self) -> Vec<MockCall> {
        self.inner.lock().unwrap().calls.clone()
    }
}

impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_activated(&self) -> bool {
        self.activated
    }

    fn convert_map(&self) -> &ConvertMap {
        &self.convert_map
    }

    fn transcode(&self, request: &TranscodeRequest<'_>) -> Result<Vec<PathBuf>, PluginError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(MockCall {
            asset: request.asset.clone(),
            target: request.target.mimetype.clone(),
            options: request.options.clone(),
            paths: request.paths.to_vec(),
        });

        if let Some(message) = &inner.fail_with {
            return Err(PluginError::TranscodeFailed(message.clone()));
        }

        request
            .paths
            .iter()
            .map(|p| request.output_path(p))
            .collect()
    }
}
