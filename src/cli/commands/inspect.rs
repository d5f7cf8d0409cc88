//! inspect command - Print the asset graph of a store entry

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::core::graph::AssetGraph;
use crate::engine::{self, Context};
use crate::ui::{output, pretty};

/// Print the graph stored at `entry`, as text or JSON.
///
/// Graph inconsistencies are reported as warnings; the entry is printed
/// regardless.
pub fn inspect(ctx: &Context, entry: &Path, json: bool) -> Result<()> {
    let (_, file) = engine::load_entry(entry)
        .with_context(|| format!("cannot inspect '{}'", entry.display()))?;

    if let Err(e) = AssetGraph::from_file(&file).validate() {
        output::warn(format!("inconsistent asset graph: {}", e), ctx.verbosity());
    }

    if json {
        let text = serde_json::to_string_pretty(&file).context("failed to serialize graph")?;
        output::result(text);
    } else {
        output::print(format!("Inspecting \"{}\"", entry.display()), ctx.verbosity());
        output::result(pretty::render_file_reference(&file));
    }
    Ok(())
}
