//! engine::dispatch
//!
//! Routes conversion requests to transcoder plugins.
//!
//! # Index
//!
//! Built once at construction from the registry's active transcoders: for
//! every `source → target` a plugin declares, one [`TargetMimetype`] is
//! appended to the list for `source`, alongside the plugin that declared it.
//! Two plugins offering the same conversion both appear; the first one wins
//! lookups by mimetype. The index is read-only afterwards.
//!
//! Mimetype matching is exact, case-sensitive string equality.
//!
//! # Path expansion
//!
//! [`TranscodeDispatcher::get_paths`] binds every scalar option into the
//! target's template, then emits one path per element of the first array
//! option that has a value. Further array options are not expanded and any
//! placeholder they own stays in the path.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::core::metadata::FileReference;
use crate::core::options::{
    self, expand_path_template, options_to_template, OptionDescriptor, OptionError, OptionValue,
    Options,
};
use crate::core::types::{AssetId, AssetSelector};
use crate::plugins::{
    PluginError, Registry, TargetMimetype, TargetMimetypeOption, TranscodeRequest, Transcoder,
};

/// Errors from dispatch operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The requested subname is absent, or ambiguous without a mimetype.
    #[error("unknown asset '{name}': {reason}")]
    UnknownAsset {
        name: String,
        reason: String,
        candidates: Vec<AssetId>,
    },

    /// No active transcoder converts `source_mimetype` to `target`.
    #[error(
        "no transcoder converts '{source_mimetype}' to '{target}' (available: {})",
        join_or_none(.available)
    )]
    UnknownType {
        source_mimetype: String,
        target: String,
        available: Vec<String>,
    },

    #[error(transparent)]
    Option(#[from] OptionError),

    #[error(transparent)]
    Plugin(#[from] PluginError),
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn describe(assets: &[AssetId]) -> String {
    assets
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Capability index over the active transcoders of a registry.
#[derive(Clone)]
pub struct TranscodeDispatcher {
    target_mimetypes: BTreeMap<String, Vec<TargetMimetype>>,
    /// Same shape as `target_mimetypes`; entry `i` declared target `i`.
    plugins: BTreeMap<String, Vec<Arc<dyn Transcoder>>>,
    output_root: PathBuf,
}

impl TranscodeDispatcher {
    /// Build the index from `registry`. Transcoders write under `output_root`.
    pub fn new(registry: &Registry, output_root: impl Into<PathBuf>) -> Self {
        let mut target_mimetypes: BTreeMap<String, Vec<TargetMimetype>> = BTreeMap::new();
        let mut plugins: BTreeMap<String, Vec<Arc<dyn Transcoder>>> = BTreeMap::new();

        for transcoder in registry.active_transcoders() {
            for (source, conversions) in transcoder.convert_map().iter() {
                for conversion in conversions {
                    let target = TargetMimetype {
                        mimetype: conversion.target.clone(),
                        description: transcoder.description().to_string(),
                        template: options_to_template(&conversion.options),
                        options: conversion
                            .options
                            .iter()
                            .map(|d| TargetMimetypeOption::from_descriptor(d.as_ref()))
                            .collect(),
                    };
                    tracing::trace!(
                        plugin = transcoder.name(),
                        source,
                        target = %target.mimetype,
                        "indexed conversion"
                    );
                    target_mimetypes
                        .entry(source.to_string())
                        .or_default()
                        .push(target);
                    plugins
                        .entry(source.to_string())
                        .or_default()
                        .push(Arc::clone(transcoder));
                }
            }
        }

        Self {
            target_mimetypes,
            plugins,
            output_root: output_root.into(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Full capability index: source mimetype → targets.
    pub fn get_target_mimetypes(&self) -> &BTreeMap<String, Vec<TargetMimetype>> {
        &self.target_mimetypes
    }

    pub fn source_mimetypes(&self) -> impl Iterator<Item = &str> {
        self.target_mimetypes.keys().map(String::as_str)
    }

    /// Target mimetypes offered for `source`, in index order.
    pub fn target_mimetype_names(&self, source: &str) -> Vec<&str> {
        self.target_mimetypes
            .get(source)
            .map(|targets| targets.iter().map(|t| t.mimetype.as_str()).collect())
            .unwrap_or_default()
    }

    /// First target for `source` whose mimetype is exactly `target`.
    pub fn get_target_mimetype(&self, source: &str, target: &str) -> Option<&TargetMimetype> {
        self.target_mimetypes
            .get(source)?
            .iter()
            .find(|t| t.mimetype == target)
    }

    fn unknown_type(&self, source: &str, target: &str) -> DispatchError {
        DispatchError::UnknownType {
            source_mimetype: source.to_string(),
            target: target.to_string(),
            available: self
                .target_mimetype_names(source)
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    /// The plugin that declared `target` for `source`.
    fn owner(
        &self,
        source: &str,
        target: &TargetMimetype,
    ) -> Result<&Arc<dyn Transcoder>, DispatchError> {
        let index = self
            .target_mimetypes
            .get(source)
            .and_then(|targets| targets.iter().position(|t| t == target))
            .ok_or_else(|| self.unknown_type(source, &target.mimetype))?;
        self.plugins
            .get(source)
            .and_then(|plugins| plugins.get(index))
            .ok_or_else(|| self.unknown_type(source, &target.mimetype))
    }

    /// Option descriptors the owning plugin declared for `source → target`.
    fn descriptors(
        &self,
        source: &str,
        target: &TargetMimetype,
    ) -> Result<&[OptionDescriptor], DispatchError> {
        self.owner(source, target)?
            .convert_map()
            .options(source, &target.mimetype)
            .ok_or_else(|| self.unknown_type(source, &target.mimetype))
    }

    /// Find the asset in `graph` named `subname`.
    ///
    /// A single match is returned whatever the hint. Several matches are
    /// narrowed by exact `mimetype`; without a hint they are ambiguous.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownAsset`] when nothing matches or the match is
    /// ambiguous; the error lists the candidates.
    pub fn resolve_asset(
        &self,
        graph: &FileReference,
        subname: &str,
        mimetype: Option<&str>,
    ) -> Result<AssetId, DispatchError> {
        let matches: Vec<AssetId> = graph
            .find_by_subname(subname)
            .map(|a| a.asset.clone())
            .collect();

        match (matches.as_slice(), mimetype) {
            ([], _) => {
                let available: Vec<AssetId> = graph.asset_ids().cloned().collect();
                Err(DispatchError::UnknownAsset {
                    name: subname.to_string(),
                    reason: format!("not found (available: {})", describe(&available)),
                    candidates: available,
                })
            }
            ([only], _) => Ok(only.clone()),
            (_, Some(mimetype)) => {
                let mut narrowed = matches.iter().filter(|a| a.mimetype == mimetype);
                match (narrowed.next(), narrowed.next()) {
                    (Some(asset), None) => Ok(asset.clone()),
                    _ => Err(DispatchError::UnknownAsset {
                        name: subname.to_string(),
                        reason: format!(
                            "no single match for mimetype '{}' among {}",
                            mimetype,
                            describe(&matches)
                        ),
                        candidates: matches.clone(),
                    }),
                }
            }
            (_, None) => Err(DispatchError::UnknownAsset {
                name: subname.to_string(),
                reason: format!(
                    "ambiguous, specify one of {} using name(mimetype)",
                    describe(&matches)
                ),
                candidates: matches.clone(),
            }),
        }
    }

    /// [`resolve_asset`](Self::resolve_asset) from a parsed `name[(mimetype)]`.
    pub fn resolve_selector(
        &self,
        graph: &FileReference,
        selector: &AssetSelector,
    ) -> Result<AssetId, DispatchError> {
        self.resolve_asset(graph, &selector.subname, selector.mimetype.as_deref())
    }

    /// Parse raw option strings with the descriptors for `source → target`.
    ///
    /// Raw entries the conversion does not declare are ignored.
    pub fn parse_options(
        &self,
        source: &str,
        target: &TargetMimetype,
        raw: &BTreeMap<String, String>,
    ) -> Result<Options, DispatchError> {
        Ok(options::parse_options(self.descriptors(source, target)?, raw)?)
    }

    /// [`parse_options`](Self::parse_options) with defaults filled in.
    pub fn resolve_options(
        &self,
        source: &str,
        target: &TargetMimetype,
        raw: &BTreeMap<String, String>,
    ) -> Result<Options, DispatchError> {
        let descriptors = self.descriptors(source, target)?;
        let parsed = options::parse_options(descriptors, raw)?;
        Ok(options::with_defaults(descriptors, parsed))
    }

    /// Output paths for converting `asset` to `target` with `options`.
    ///
    /// One path, or one per element of the first array option given.
    ///
    /// # Errors
    ///
    /// An array option bound to an empty list is an [`OptionError::Parse`]:
    /// it would produce no paths and the conversion would write nothing.
    pub fn get_paths(
        &self,
        asset: &AssetId,
        target: &TargetMimetype,
        options: &Options,
    ) -> Result<Vec<String>, DispatchError> {
        let descriptors = self.descriptors(&asset.mimetype, target)?;

        let is_array = |name: &str| {
            descriptors
                .iter()
                .any(|d| d.name() == name && d.is_array())
        };
        let single: Options = options
            .iter()
            .filter(|(name, _)| !is_array(name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        let first_array = descriptors
            .iter()
            .filter(|d| d.is_array())
            .find_map(|d| options.get(d.name()).map(|value| (d.name(), value)));

        let template = expand_path_template(&target.template, &target.mimetype, asset, &single);

        let paths = match first_array {
            Some((name, value)) => {
                let elements = match value {
                    OptionValue::List(items) => items.as_slice(),
                    other => std::slice::from_ref(other),
                };
                if elements.is_empty() {
                    return Err(OptionError::Parse {
                        name: name.to_string(),
                        message: "empty list".to_string(),
                    }
                    .into());
                }
                elements
                    .iter()
                    .map(|element| template.bind(name, &element.to_string()).to_string())
                    .collect()
            }
            None => vec![template.to_string()],
        };
        Ok(paths)
    }

    /// Convert `asset` to `target` with typed options.
    ///
    /// Missing options take their defaults. Returns the paths the plugin
    /// reports as written.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::UnknownType`] if no active plugin declares the
    ///   conversion
    /// - [`DispatchError::Plugin`] if the plugin fails
    pub fn transcode(
        &self,
        graph: &FileReference,
        asset: &AssetId,
        target: &str,
        options: &Options,
    ) -> Result<Vec<PathBuf>, DispatchError> {
        let target_mimetype = self
            .get_target_mimetype(&asset.mimetype, target)
            .ok_or_else(|| self.unknown_type(&asset.mimetype, target))?;
        let plugin = self.owner(&asset.mimetype, target_mimetype)?;
        let descriptors = self.descriptors(&asset.mimetype, target_mimetype)?;

        let options = options::with_defaults(descriptors, options.clone());
        let paths = self.get_paths(asset, target_mimetype, &options)?;

        tracing::debug!(
            plugin = plugin.name(),
            asset = %asset,
            target,
            paths = paths.len(),
            "dispatching transcode"
        );

        let written = plugin.transcode(&TranscodeRequest {
            output_root: &self.output_root,
            file: graph,
            asset,
            target: target_mimetype,
            options: &options,
            paths: &paths,
        })?;
        Ok(written)
    }

    /// [`transcode`](Self::transcode) from raw option strings.
    pub fn transcode_raw(
        &self,
        graph: &FileReference,
        asset: &AssetId,
        target: &str,
        raw: &BTreeMap<String, String>,
    ) -> Result<Vec<PathBuf>, DispatchError> {
        let target_mimetype = self
            .get_target_mimetype(&asset.mimetype, target)
            .ok_or_else(|| self.unknown_type(&asset.mimetype, target))?;
        let options = self.parse_options(&asset.mimetype, target_mimetype, raw)?;
        self.transcode(graph, asset, target, &options)
    }
}

impl fmt::Debug for TranscodeDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscodeDispatcher")
            .field("target_mimetypes", &self.target_mimetypes)
            .field("output_root", &self.output_root)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::AssetReference;
    use crate::core::options::{ArrayOption, FloatOption, StringOption};
    use crate::core::types::FileId;
    use crate::plugins::mock::MockTranscoder;
    use crate::plugins::ConvertMap;

    const OBJ: &str = "application/wavefront-obj";

    fn graph() -> FileReference {
        let file = FileId::new("/tmp/material.blend");
        FileReference::builder(file.clone(), "h")
            .asset(AssetReference::new(AssetId::new("diffuse", "image/png", file.clone())))
            .asset(AssetReference::new(AssetId::new("diffuse", "image/jpeg", file.clone())))
            .asset(AssetReference::new(AssetId::new("Cube", OBJ, file)))
            .build()
    }

    fn mock() -> MockTranscoder {
        MockTranscoder::new(
            "preview",
            ConvertMap::new()
                .with(
                    OBJ,
                    "image/png",
                    vec![
                        Arc::new(FloatOption::new("angle", "Angle")),
                        Arc::new(ArrayOption::new(Arc::new(StringOption::new("name", "Name")))),
                    ],
                )
                .with("image/png", "image/jpeg", vec![]),
        )
    }

    fn dispatcher_with(transcoders: Vec<Arc<dyn Transcoder>>) -> TranscodeDispatcher {
        let mut registry = Registry::new();
        for t in transcoders {
            registry.register_transcoder(t);
        }
        TranscodeDispatcher::new(&registry, "/out")
    }

    fn dispatcher() -> TranscodeDispatcher {
        dispatcher_with(vec![Arc::new(mock())])
    }

    mod index {
        use super::*;

        #[test]
        fn lists_targets_per_source() {
            let d = dispatcher();
            assert_eq!(d.source_mimetypes().collect::<Vec<_>>(), vec![OBJ, "image/png"]);
            assert_eq!(d.target_mimetype_names(OBJ), vec!["image/png"]);

            let target = d.get_target_mimetype(OBJ, "image/png").unwrap();
            assert_eq!(target.description, "preview (mock)");
            assert_eq!(
                target.template.to_string(),
                "assets/{uuid}/{dstFormat}/{angle}/{name}/{uuid}{extension}"
            );
            assert_eq!(target.options.len(), 2);
            assert!(target.options[1].is_array);
        }

        #[test]
        fn unknown_pairs_are_absent() {
            let d = dispatcher();
            assert!(d.get_target_mimetype(OBJ, "application/x-unknown").is_none());
            assert!(d.get_target_mimetype("text/x-unknown", "image/png").is_none());
        }

        #[test]
        fn duplicates_across_plugins_are_kept() {
            let other = MockTranscoder::new(
                "other",
                ConvertMap::new().with("image/png", "image/jpeg", vec![]),
            );
            let d = dispatcher_with(vec![Arc::new(mock()), Arc::new(other)]);
            assert_eq!(
                d.target_mimetype_names("image/png"),
                vec!["image/jpeg", "image/jpeg"]
            );
            assert_eq!(
                d.get_target_mimetype("image/png", "image/jpeg")
                    .unwrap()
                    .description,
                "preview (mock)"
            );
        }

        #[test]
        fn inactive_transcoders_are_excluded() {
            let d = dispatcher_with(vec![Arc::new(mock().inactive())]);
            assert!(d.get_target_mimetypes().is_empty());
        }
    }

    mod resolve {
        use super::*;

        #[test]
        fn ambiguous_without_hint() {
            let err = dispatcher().resolve_asset(&graph(), "diffuse", None).unwrap_err();
            match err {
                DispatchError::UnknownAsset { candidates, reason, .. } => {
                    assert_eq!(candidates.len(), 2);
                    assert!(reason.contains("diffuse(image/png)"));
                    assert!(reason.contains("diffuse(image/jpeg)"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn hint_disambiguates() {
            let asset = dispatcher()
                .resolve_asset(&graph(), "diffuse", Some("image/png"))
                .unwrap();
            assert_eq!(asset.mimetype, "image/png");
        }

        #[test]
        fn hint_without_match_fails() {
            let err = dispatcher()
                .resolve_asset(&graph(), "diffuse", Some("image/gif"))
                .unwrap_err();
            assert!(matches!(err, DispatchError::UnknownAsset { .. }));
        }

        #[test]
        fn single_match_ignores_hint() {
            let asset = dispatcher()
                .resolve_asset(&graph(), "Cube", Some("image/gif"))
                .unwrap();
            assert_eq!(asset.mimetype, OBJ);
        }

        #[test]
        fn missing_subname_lists_all_assets() {
            let err = dispatcher().resolve_asset(&graph(), "Sphere", None).unwrap_err();
            assert!(err.to_string().contains("Cube(application/wavefront-obj)"));
        }

        #[test]
        fn selector() {
            let selector = AssetSelector::parse("diffuse(image/jpeg)").unwrap();
            let asset = dispatcher().resolve_selector(&graph(), &selector).unwrap();
            assert_eq!(asset.mimetype, "image/jpeg");
        }
    }

    mod option_parsing {
        use super::*;

        fn raw(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        }

        #[test]
        fn parse_and_resolve() {
            let d = dispatcher();
            let target = d.get_target_mimetype(OBJ, "image/png").unwrap().clone();

            let parsed = d
                .parse_options(OBJ, &target, &raw(&[("angle", "90"), ("bogus", "x")]))
                .unwrap();
            assert_eq!(parsed.len(), 1);

            let resolved = d.resolve_options(OBJ, &target, &raw(&[])).unwrap();
            assert_eq!(resolved["angle"], OptionValue::Float(0.0));
            assert_eq!(
                resolved["name"],
                OptionValue::List(vec![OptionValue::Text(String::new())])
            );
        }

        #[test]
        fn parse_errors_surface() {
            let d = dispatcher();
            let target = d.get_target_mimetype(OBJ, "image/png").unwrap().clone();
            let err = d
                .parse_options(OBJ, &target, &raw(&[("angle", "wide")]))
                .unwrap_err();
            assert!(matches!(err, DispatchError::Option(OptionError::Parse { .. })));
        }
    }

    mod paths {
        use super::*;
        use crate::core::options::asset_uuid;

        #[test]
        fn array_option_yields_one_path_per_element() {
            let d = dispatcher();
            let asset = AssetId::new("Cube", OBJ, FileId::new("/tmp/material.blend"));
            let target = d.get_target_mimetype(OBJ, "image/png").unwrap();
            let options = Options::from([
                ("angle".to_string(), OptionValue::Float(45.0)),
                (
                    "name".to_string(),
                    OptionValue::List(vec![
                        OptionValue::Text("a".into()),
                        OptionValue::Text("b".into()),
                    ]),
                ),
            ]);

            let paths = d.get_paths(&asset, target, &options).unwrap();
            let uuid = asset_uuid(&asset);
            assert_eq!(
                paths,
                vec![
                    format!("assets/{uuid}/image/png/45/a/{uuid}.png"),
                    format!("assets/{uuid}/image/png/45/b/{uuid}.png"),
                ]
            );
        }

        #[test]
        fn no_array_option_yields_one_path() {
            let d = dispatcher();
            let asset = AssetId::new("Cube", OBJ, FileId::new("/tmp/material.blend"));
            let target = d.get_target_mimetype(OBJ, "image/png").unwrap();
            let options = Options::from([("angle".to_string(), OptionValue::Float(45.0))]);

            let paths = d.get_paths(&asset, target, &options).unwrap();
            assert_eq!(paths.len(), 1);
            let uuid = asset_uuid(&asset);
            assert_eq!(paths[0], format!("assets/{uuid}/image/png/45/{{name}}/{uuid}.png"));
        }

        #[test]
        fn only_the_first_array_is_expanded() {
            let transcoder = MockTranscoder::new(
                "multi",
                ConvertMap::new().with(
                    OBJ,
                    "image/png",
                    vec![
                        Arc::new(ArrayOption::new(Arc::new(StringOption::new("a", "A")))),
                        Arc::new(ArrayOption::new(Arc::new(StringOption::new("b", "B")))),
                    ],
                ),
            );
            let d = dispatcher_with(vec![Arc::new(transcoder)]);
            let asset = AssetId::new("Cube", OBJ, FileId::new("/tmp/material.blend"));
            let target = d.get_target_mimetype(OBJ, "image/png").unwrap();
            let list = |xs: &[&str]| {
                OptionValue::List(xs.iter().map(|x| OptionValue::Text(x.to_string())).collect())
            };
            let options = Options::from([
                ("a".to_string(), list(&["1", "2"])),
                ("b".to_string(), list(&["x", "y"])),
            ]);

            let paths = d.get_paths(&asset, target, &options).unwrap();
            assert_eq!(paths.len(), 2);
            assert!(paths.iter().all(|p| p.contains("/{b}/")));
        }

        #[test]
        fn empty_array_option_is_rejected() {
            let transcoder = mock();
            let d = dispatcher_with(vec![Arc::new(transcoder.clone())]);
            let asset = AssetId::new("Cube", OBJ, FileId::new("/tmp/material.blend"));
            let target = d.get_target_mimetype(OBJ, "image/png").unwrap();
            let options = Options::from([("name".to_string(), OptionValue::List(vec![]))]);

            let err = d.get_paths(&asset, target, &options).unwrap_err();
            assert!(matches!(
                err,
                DispatchError::Option(OptionError::Parse { ref name, .. }) if name == "name"
            ));

            let err = d.transcode(&graph(), &asset, "image/png", &options).unwrap_err();
            assert!(matches!(err, DispatchError::Option(_)));
            assert!(transcoder.calls().is_empty());
        }
    }

    mod transcode {
        use super::*;

        #[test]
        fn unknown_target_is_unknown_type() {
            let d = dispatcher();
            let asset = AssetId::new("Cube", OBJ, FileId::new("/tmp/material.blend"));
            let err = d
                .transcode(&graph(), &asset, "application/x-unknown", &Options::new())
                .unwrap_err();
            match err {
                DispatchError::UnknownType { available, .. } => {
                    assert_eq!(available, vec!["image/png".to_string()]);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn delegates_with_defaults_and_paths() {
            let transcoder = mock();
            let d = dispatcher_with(vec![Arc::new(transcoder.clone())]);
            let asset = AssetId::new("Cube", OBJ, FileId::new("/tmp/material.blend"));
            let raw = BTreeMap::from([("name".to_string(), "front;back".to_string())]);

            let written = d.transcode_raw(&graph(), &asset, "image/png", &raw).unwrap();
            assert_eq!(written.len(), 2);
            assert!(written.iter().all(|p| p.starts_with("/out/assets")));

            let calls = transcoder.calls();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].target, "image/png");
            assert_eq!(calls[0].options["angle"], OptionValue::Float(0.0));
            assert!(calls[0].paths[0].contains("/front/"));
            assert!(calls[0].paths[1].contains("/back/"));
        }

        #[test]
        fn plugin_failure_is_reported() {
            let d = dispatcher_with(vec![Arc::new(mock().fail_with("boom"))]);
            let asset = AssetId::new("Cube", OBJ, FileId::new("/tmp/material.blend"));
            let err = d
                .transcode(&graph(), &asset, "image/png", &Options::new())
                .unwrap_err();
            assert!(matches!(err, DispatchError::Plugin(PluginError::TranscodeFailed(_))));
        }
    }
}
