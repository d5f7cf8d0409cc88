//! transcode command - Convert one asset of a store entry

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context as _, Result};

use crate::core::types::AssetSelector;
use crate::engine::{self, Context};
use crate::ui::output;

/// Turn `--name value` / `--name=value` tokens into a raw option map.
pub fn parse_raw_options(tokens: &[String]) -> Result<BTreeMap<String, String>> {
    let mut raw = BTreeMap::new();
    let mut tokens = tokens.iter();

    while let Some(token) = tokens.next() {
        let Some(flag) = token.strip_prefix("--").filter(|f| !f.is_empty()) else {
            bail!("expected an option like --name, got '{}'", token);
        };
        let (name, value) = match flag.split_once('=') {
            Some((name, value)) => (name.to_string(), value.to_string()),
            None => match tokens.next() {
                Some(value) => (flag.to_string(), value.clone()),
                None => bail!("option --{} is missing a value", flag),
            },
        };
        raw.insert(name, value);
    }
    Ok(raw)
}

/// Resolve the asset, convert it and print the written paths.
pub fn transcode(
    ctx: &Context,
    entry: &Path,
    asset: &str,
    target: &str,
    options: &[String],
) -> Result<()> {
    let selector = AssetSelector::parse(asset)?;
    let raw = parse_raw_options(options)?;

    let (store, file) = engine::load_entry(entry)
        .with_context(|| format!("cannot load '{}'", entry.display()))?;
    let dispatcher = ctx.dispatcher(store.root());

    let asset = dispatcher.resolve_selector(&file, &selector)?;
    output::debug(
        format!("transcoding {} to {} with {:?}", asset, target, raw),
        ctx.verbosity(),
    );

    let written = dispatcher.transcode_raw(&file, &asset, target, &raw)?;
    for path in written {
        output::result(path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn pairs_and_equals() {
        let raw = parse_raw_options(&tokens(&["--lines", "1,2", "--mode=fast"])).unwrap();
        assert_eq!(raw["lines"], "1,2");
        assert_eq!(raw["mode"], "fast");
    }

    #[test]
    fn negative_values_are_values() {
        let raw = parse_raw_options(&tokens(&["--angle", "-45"])).unwrap();
        assert_eq!(raw["angle"], "-45");
    }

    #[test]
    fn malformed_tokens() {
        assert!(parse_raw_options(&tokens(&["lines", "1"])).is_err());
        assert!(parse_raw_options(&tokens(&["--lines"])).is_err());
        assert!(parse_raw_options(&tokens(&["--", "x"])).is_err());
    }

    #[test]
    fn last_value_wins() {
        let raw = parse_raw_options(&tokens(&["--a", "1", "--a", "2"])).unwrap();
        assert_eq!(raw["a"], "2");
    }
}
