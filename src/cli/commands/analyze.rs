//! analyze command - Analyze a file and store its asset graph

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::engine::{self, Context};
use crate::ui::output;

/// Analyze `file` and print the path of the stored entry.
pub fn analyze(ctx: &Context, file: &Path, store: Option<&Path>) -> Result<()> {
    let file = file
        .canonicalize()
        .with_context(|| format!("cannot find file '{}'", file.display()))?;

    let store_root = match store.or_else(|| ctx.config.store_path()) {
        Some(root) => root.to_path_buf(),
        None => file
            .parent()
            .map(Path::to_path_buf)
            .with_context(|| format!("'{}' has no parent directory", file.display()))?,
    };

    let (entry, graph) = engine::analyze_into_store(&ctx.registry(), &file, &store_root)
        .with_context(|| format!("failed to analyze '{}'", file.display()))?;

    output::debug(
        format!("{} asset(s) found in {}", graph.assets.len(), file.display()),
        ctx.verbosity(),
    );
    output::result(entry.display());
    Ok(())
}
