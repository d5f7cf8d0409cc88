//! plugins::text
//!
//! Built-in plugins for plain text files.
//!
//! A text file holds a single asset named after the file. The analyzer
//! records line, word and character counts; the transcoder renders the text
//! as an HTML page or as a JSON document of lines.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::traits::{Analyzer, ConvertMap, PluginError, Transcoder, TranscodeRequest};
use crate::core::metadata::{AssetReference, FileReference};
use crate::core::options::{IntVectorOption, OptionValue};
use crate::core::types::{AssetId, FileId};

const TEXT_PLAIN: &str = "text/plain";

/// SHA-256 of `bytes`, lowercase hex.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn read_text(path: &Path) -> Result<String, PluginError> {
    let bytes = fs::read(path).map_err(|e| PluginError::io(path, e))?;
    String::from_utf8(bytes).map_err(|_| PluginError::AnalysisFailed {
        path: path.to_path_buf(),
        message: "file is not valid UTF-8".to_string(),
    })
}

/// Analyzer for `text/plain`.
#[derive(Debug, Clone)]
pub struct TextAnalyzer {
    handled_types: Vec<String>,
}

impl TextAnalyzer {
    pub fn new() -> Self {
        Self {
            handled_types: vec![TEXT_PLAIN.to_string()],
        }
    }
}

impl Default for TextAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for TextAnalyzer {
    fn name(&self) -> &str {
        "text"
    }

    fn handled_types(&self) -> &[String] {
        &self.handled_types
    }

    fn analyze(&self, path: &Path) -> Result<FileReference, PluginError> {
        let text = read_text(path)?;
        let file = FileId::new(path.display().to_string());
        let subname = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let asset = AssetReference::new(AssetId::new(subname, TEXT_PLAIN, file.clone()))
            .with_metadata("lines", text.lines().count() as i64)
            .with_metadata("words", text.split_whitespace().count() as i64)
            .with_metadata("characters", text.chars().count() as i64);

        Ok(FileReference::builder(file, content_hash(text.as_bytes()))
            .asset(asset)
            .build())
    }
}

/// Transcoder from `text/plain` to HTML and JSON.
#[derive(Debug, Clone)]
pub struct TextTranscoder {
    convert_map: ConvertMap,
}

impl TextTranscoder {
    pub fn new() -> Self {
        let lines = IntVectorOption::new("lines", "Inclusive 1-based line range; 0,0 for all")
            .with_size(2)
            .with_range(0, i64::MAX);
        Self {
            convert_map: ConvertMap::new()
                .with(TEXT_PLAIN, "text/html", vec![])
                .with(TEXT_PLAIN, "application/json", vec![Arc::new(lines)]),
        }
    }
}

impl Default for TextTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_html(title: &str, text: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body><pre>{}</pre></body>\n</html>\n",
        escape_html(title),
        escape_html(text)
    )
}

/// Select an inclusive 1-based range of lines; `(0, 0)` selects everything.
fn select_lines<'t>(text: &'t str, range: Option<&OptionValue>) -> Result<Vec<&'t str>, PluginError> {
    let all: Vec<&str> = text.lines().collect();
    let bounds = range
        .and_then(OptionValue::as_list)
        .map(|items| items.iter().filter_map(OptionValue::as_int).collect::<Vec<_>>());

    match bounds.as_deref() {
        None | Some([0, 0]) => Ok(all),
        Some(&[first, last]) if first >= 1 && first <= last => {
            let start = usize::try_from(first - 1).unwrap_or(usize::MAX).min(all.len());
            let end = usize::try_from(last).unwrap_or(usize::MAX).min(all.len());
            Ok(all[start..end].to_vec())
        }
        Some(other) => Err(PluginError::TranscodeFailed(format!(
            "invalid line range {:?}",
            other
        ))),
    }
}

impl Transcoder for TextTranscoder {
    fn name(&self) -> &str {
        "text"
    }

    fn description(&self) -> &str {
        "Plain text to HTML and JSON"
    }

    fn convert_map(&self) -> &ConvertMap {
        &self.convert_map
    }

    fn transcode(&self, request: &TranscodeRequest<'_>) -> Result<Vec<PathBuf>, PluginError> {
        if request.asset.mimetype != TEXT_PLAIN {
            return Err(PluginError::TranscodeFailed(format!(
                "cannot convert {}",
                request.asset
            )));
        }

        let source = Path::new(request.file.file.filename());
        let text = read_text(source)?;

        let contents = match request.target.mimetype.as_str() {
            "text/html" => render_html(&request.asset.subname, &text),
            "application/json" => {
                let lines = select_lines(&text, request.options.get("lines"))?;
                let document = serde_json::json!({
                    "asset": request.asset.subname,
                    "lines": lines,
                });
                serde_json::to_string_pretty(&document)
                    .map_err(|e| PluginError::TranscodeFailed(e.to_string()))?
            }
            other => {
                return Err(PluginError::TranscodeFailed(format!(
                    "unsupported target '{}'",
                    other
                )))
            }
        };

        let mut written = Vec::with_capacity(request.paths.len());
        for relative in request.paths {
            let path = request.output_path(relative)?;
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| PluginError::io(parent, e))?;
            }
            fs::write(&path, &contents).map_err(|e| PluginError::io(&path, e))?;
            tracing::debug!(path = %path.display(), "wrote output");
            written.push(path);
        }
        Ok(written)
    }
}
