//! ui::pretty
//!
//! Pure functions rendering asset graphs and capability indexes as text.
//!
//! # Design
//!
//! Every function takes immutable inputs and returns a `String`; printing is
//! left to the caller so the output can be tested directly.
//!
//! # Example Output
//!
//! ```text
//! file: /data/scene.blend
//! hash: 3f2a9c
//! assets (2):
//!   Cube (application/x-blender.mesh)
//!     vertices: 8
//!     depends on:
//!       - Material(application/x-blender.material)
//!   Material (application/x-blender.material)
//! ```

use std::collections::BTreeMap;

use crate::core::metadata::FileReference;
use crate::plugins::TargetMimetype;

/// Render a file's asset graph.
pub fn render_file_reference(file: &FileReference) -> String {
    let hash = if file.hash.is_empty() { "-" } else { file.hash.as_str() };
    let mut lines = vec![
        format!("file: {}", file.file),
        format!("hash: {}", hash),
        format!("assets ({}):", file.assets.len()),
    ];

    for asset in &file.assets {
        lines.push(format!("  {} ({})", asset.asset.subname, asset.asset.mimetype));
        for (key, value) in &asset.metadata {
            lines.push(format!("    {}: {}", key, value));
        }
        if asset.dependencies.is_empty() {
            continue;
        }
        lines.push("    depends on:".to_string());
        for dependency in &asset.dependencies {
            if dependency.file == file.file {
                lines.push(format!("      - {}", dependency));
            } else {
                lines.push(format!("      - {} in {}", dependency, dependency.file));
            }
        }
    }

    lines.join("\n")
}

/// Render the capability index, one block per source mimetype.
///
/// An empty index renders as an empty string.
pub fn render_target_mimetypes(index: &BTreeMap<String, Vec<TargetMimetype>>) -> String {
    let mut lines = Vec::new();
    for (source, targets) in index {
        lines.push(source.clone());
        for target in targets {
            lines.push(format!("  -> {}  [{}]", target.mimetype, target.description));
            lines.push(format!("     path: {}", target.template));
            for option in &target.options {
                lines.push(format!(
                    "     --{} <{}{}>  {} (default: {}; {})",
                    option.name,
                    option.type_description,
                    if option.is_array { ";..." } else { "" },
                    option.description,
                    option.default_value,
                    option.constraint_description
                ));
            }
        }
    }
    lines.join("\n")
}
