//! plugins::registry
//!
//! Explicit plugin registry.
//!
//! The host program builds a [`Registry`], registers plugin values on it and
//! hands it by reference to whatever needs plugins. There is no discovery
//! and no global state.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::text::{TextAnalyzer, TextTranscoder};
use super::traits::{Analyzer, PluginError, Transcoder};
use crate::core::graph::AssetGraph;
use crate::core::metadata::FileReference;
use crate::core::mimetypes;

/// Registered analyzers and transcoders.
#[derive(Clone, Default)]
pub struct Registry {
    analyzers: Vec<Arc<dyn Analyzer>>,
    transcoders: Vec<Arc<dyn Transcoder>>,
    disabled: BTreeSet<String>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in plugins.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register_analyzer(Arc::new(TextAnalyzer::new()));
        registry.register_transcoder(Arc::new(TextTranscoder::new()));
        registry
    }

    pub fn register_analyzer(&mut self, analyzer: Arc<dyn Analyzer>) -> &mut Self {
        tracing::debug!(plugin = analyzer.name(), "registered analyzer");
        self.analyzers.push(analyzer);
        self
    }

    pub fn register_transcoder(&mut self, transcoder: Arc<dyn Transcoder>) -> &mut Self {
        tracing::debug!(plugin = transcoder.name(), "registered transcoder");
        self.transcoders.push(transcoder);
        self
    }

    /// Treat the named plugins as not activated.
    pub fn with_disabled<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled.extend(names.into_iter().map(Into::into));
        self
    }

    fn is_disabled(&self, name: &str) -> bool {
        self.disabled.contains(name)
    }

    /// Analyzers not disabled by name.
    pub fn analyzers(&self) -> impl Iterator<Item = &Arc<dyn Analyzer>> {
        self.analyzers.iter().filter(|a| !self.is_disabled(a.name()))
    }

    /// Transcoders that are activated and not disabled, in registration order.
    pub fn active_transcoders(&self) -> impl Iterator<Item = &Arc<dyn Transcoder>> {
        self.transcoders
            .iter()
            .filter(|t| t.is_activated() && !self.is_disabled(t.name()))
    }

    /// First analyzer handling `mimetype`.
    pub fn analyzer_for(&self, mimetype: &str) -> Option<&Arc<dyn Analyzer>> {
        self.analyzers()
            .find(|a| a.handled_types().iter().any(|t| t == mimetype))
    }

    /// Analyze `path` with the analyzer for its mimetype and validate the
    /// resulting graph.
    ///
    /// # Errors
    ///
    /// - [`PluginError::UnknownFileType`] if the extension is not recognized
    /// - [`PluginError::NoAnalyzer`] if nothing handles the mimetype
    /// - [`PluginError::InvalidGraph`] if the graph has duplicates, dangling
    ///   dependencies or cycles
    pub fn analyze(&self, path: &Path) -> Result<FileReference, PluginError> {
        let mimetype = path
            .to_str()
            .and_then(mimetypes::guess_type)
            .ok_or_else(|| PluginError::UnknownFileType(path.to_path_buf()))?;
        let analyzer = self
            .analyzer_for(mimetype)
            .ok_or_else(|| PluginError::NoAnalyzer(mimetype.to_string()))?;

        tracing::debug!(plugin = analyzer.name(), mimetype, path = %path.display(), "analyzing");
        let file = analyzer.analyze(path)?;
        AssetGraph::from_file(&file).validate()?;
        Ok(file)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field(
                "analyzers",
                &self.analyzers.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .field(
                "transcoders",
                &self.transcoders.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("disabled", &self.disabled)
            .finish()
    }
}
