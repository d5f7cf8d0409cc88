//! mimetypes command - List the conversions offered by active transcoders

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Result};

use crate::engine::Context;
use crate::ui::{output, pretty};

/// Print the capability index, optionally restricted to one source.
pub fn mimetypes(ctx: &Context, source: Option<&str>) -> Result<()> {
    let dispatcher = ctx.dispatcher(Path::new("."));
    let index = dispatcher.get_target_mimetypes();

    let text = match source {
        Some(source) => match index.get_key_value(source) {
            Some((key, targets)) => {
                pretty::render_target_mimetypes(&BTreeMap::from([(key.clone(), targets.clone())]))
            }
            None => bail!(
                "no transcoder accepts '{}' (known sources: {})",
                source,
                dispatcher.source_mimetypes().collect::<Vec<_>>().join(", ")
            ),
        },
        None => pretty::render_target_mimetypes(index),
    };

    if text.is_empty() {
        output::warn("no active transcoders", ctx.verbosity());
    } else {
        output::result(text);
    }
    Ok(())
}
