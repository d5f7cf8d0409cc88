//! core::options::template
//!
//! Output path templates.
//!
//! A template is a sequence of literal text and named placeholders. Both
//! `{name}` and `${name}` are accepted when parsing; rendering always uses
//! `{name}`. Substitution is partial: placeholders without a binding stay in
//! the output untouched, so a template can be bound in several passes.

use std::collections::BTreeMap;
use std::fmt;

use uuid::Uuid;

use super::{OptionDescriptor, Options};
use crate::core::mimetypes;
use crate::core::types::AssetId;

/// A piece of a [`PathTemplate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed output path template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTemplate {
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template string.
    ///
    /// An unterminated or empty brace pair is kept as literal text.
    pub fn parse(raw: &str) -> Self {
        let mut template = PathTemplate::default();
        let mut rest = raw;

        while let Some(open) = rest.find('{') {
            let Some(len) = rest[open + 1..].find('}') else {
                break;
            };
            let name = &rest[open + 1..open + 1 + len];
            let literal_end = if open > 0 && rest.as_bytes()[open - 1] == b'$' {
                open - 1
            } else {
                open
            };

            if name.is_empty() || name.contains('{') {
                template.push_literal(&rest[..open + 1]);
                rest = &rest[open + 1..];
                continue;
            }

            template.push_literal(&rest[..literal_end]);
            template.segments.push(Segment::Placeholder(name.to_string()));
            rest = &rest[open + len + 2..];
        }

        template.push_literal(rest);
        template
    }

    fn push_literal(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Literal(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(Segment::Literal(text.to_string()));
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the placeholders still unbound, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Whether every placeholder has been bound.
    pub fn is_complete(&self) -> bool {
        self.placeholders().next().is_none()
    }

    /// Replace every placeholder that has a binding; leave the rest.
    pub fn substitute(&self, bindings: &BTreeMap<String, String>) -> PathTemplate {
        let mut out = PathTemplate::default();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_literal(text),
                Segment::Placeholder(name) => match bindings.get(name) {
                    Some(value) => out.push_literal(value),
                    None => out.segments.push(segment.clone()),
                },
            }
        }
        out
    }

    /// Bind a single placeholder.
    pub fn bind(&self, name: &str, value: &str) -> PathTemplate {
        let bindings = BTreeMap::from([(name.to_string(), value.to_string())]);
        self.substitute(&bindings)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(text)?,
                Segment::Placeholder(name) => write!(f, "{{{}}}", name)?,
            }
        }
        Ok(())
    }
}

/// Default template for a conversion:
/// `assets/{uuid}/{dstFormat}/{opt1}/.../{uuid}{extension}`.
pub fn options_to_template(descriptors: &[OptionDescriptor]) -> PathTemplate {
    let mut template = PathTemplate::default();
    template.push_literal("assets/");
    template.segments.push(Segment::Placeholder("uuid".into()));
    template.push_literal("/");
    template.segments.push(Segment::Placeholder("dstFormat".into()));
    template.push_literal("/");
    for descriptor in descriptors {
        template
            .segments
            .push(Segment::Placeholder(descriptor.name().to_string()));
        template.push_literal("/");
    }
    template.segments.push(Segment::Placeholder("uuid".into()));
    template
        .segments
        .push(Segment::Placeholder("extension".into()));
    template
}

/// Deterministic identifier of an asset.
///
/// Name-based (v5, URL namespace) over `filename#subname(mimetype)`, so the
/// same asset yields the same id across runs and machines.
pub fn asset_uuid(asset: &AssetId) -> Uuid {
    let name = format!("{}#{}", asset.file.filename(), asset);
    Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes())
}

/// Bind `uuid`, `dstFormat`, `extension` and every option value.
///
/// `extension` is `.ext` for mimetypes in the table and empty otherwise.
/// Placeholders without a binding are left in place.
pub fn expand_path_template(
    template: &PathTemplate,
    mimetype: &str,
    asset: &AssetId,
    options: &Options,
) -> PathTemplate {
    let mut bindings: BTreeMap<String, String> = options
        .iter()
        .map(|(name, value)| (name.clone(), value.to_string()))
        .collect();
    bindings.insert("uuid".into(), asset_uuid(asset).to_string());
    bindings.insert("dstFormat".into(), mimetype.to_string());
    bindings.insert(
        "extension".into(),
        mimetypes::guess_extension(mimetype)
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default(),
    );
    template.substitute(&bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::{FloatOption, OptionValue, StringOption};
    use crate::core::types::FileId;
    use std::sync::Arc;

    fn asset() -> AssetId {
        AssetId::new("Cube", "application/x-blender.mesh", FileId::new("/tmp/a.blend"))
    }

    #[test]
    fn parse_accepts_both_placeholder_forms() {
        let t = PathTemplate::parse("a/${x}/{y}.z");
        assert_eq!(
            t.segments(),
            &[
                Segment::Literal("a/".into()),
                Segment::Placeholder("x".into()),
                Segment::Literal("/".into()),
                Segment::Placeholder("y".into()),
                Segment::Literal(".z".into()),
            ]
        );
        assert_eq!(t.to_string(), "a/{x}/{y}.z");
    }

    #[test]
    fn parse_keeps_unterminated_and_empty_braces() {
        assert_eq!(PathTemplate::parse("a{b").to_string(), "a{b");
        assert!(PathTemplate::parse("a{}b").is_complete());
        assert_eq!(PathTemplate::parse("a{}b").to_string(), "a{}b");
    }

    #[test]
    fn substitution_is_partial() {
        let t = PathTemplate::parse("{a}/{b}");
        let bound = t.bind("a", "1");
        assert_eq!(bound.to_string(), "1/{b}");
        assert!(!bound.is_complete());
        assert_eq!(bound.bind("b", "2").to_string(), "1/2");
    }

    #[test]
    fn default_template_lists_options_in_order() {
        let descriptors: Vec<OptionDescriptor> = vec![
            Arc::new(FloatOption::new("angle", "Angle")),
            Arc::new(StringOption::new("name", "Name")),
        ];
        assert_eq!(
            options_to_template(&descriptors).to_string(),
            "assets/{uuid}/{dstFormat}/{angle}/{name}/{uuid}{extension}"
        );
        assert_eq!(
            options_to_template(&[]).to_string(),
            "assets/{uuid}/{dstFormat}/{uuid}{extension}"
        );
    }

    #[test]
    fn uuid_is_deterministic_and_distinct() {
        let a = asset();
        assert_eq!(asset_uuid(&a), asset_uuid(&a.clone()));

        let other = AssetId::new("Sphere", &a.mimetype, a.file.clone());
        assert_ne!(asset_uuid(&a), asset_uuid(&other));
    }

    #[test]
    fn expand_binds_known_values() {
        let template = options_to_template(&[Arc::new(FloatOption::new("angle", "Angle"))]);
        let options = Options::from([("angle".to_string(), OptionValue::Float(90.0))]);
        let path = expand_path_template(&template, "image/png", &asset(), &options);
        let uuid = asset_uuid(&asset());
        assert!(path.is_complete());
        assert_eq!(
            path.to_string(),
            format!("assets/{uuid}/image/png/90/{uuid}.png")
        );
    }

    #[test]
    fn unknown_mimetype_has_empty_extension() {
        let template = PathTemplate::parse("{uuid}{extension}");
        let path = expand_path_template(&template, "application/x-nope", &asset(), &Options::new());
        assert_eq!(path.to_string(), asset_uuid(&asset()).to_string());
    }

    #[test]
    fn unbound_options_stay_as_placeholders() {
        let template = PathTemplate::parse("{dstFormat}/{size}");
        let path = expand_path_template(&template, "image/png", &asset(), &Options::new());
        assert_eq!(path.to_string(), "image/png/{size}");
    }
}
