//! Tree printing.

use std::path::Path;

use anyhow::{Context, Result, bail};
use pivot_core::{FlattenOptions, SessionFile, TreeFilter, flatten_with};
use pivot_view::render::tree_lines;

pub struct TreeOptions<'a> {
    pub leaf: Option<&'a str>,
    pub filter: TreeFilter,
    pub show_labels: bool,
    pub preview_max_chars: usize,
    pub json: bool,
}

pub fn print(path: &Path, opts: &TreeOptions<'_>) -> Result<()> {
    let file = SessionFile::load(path)?;
    let leaf = file.resolve_leaf(opts.leaf)?;

    let view = flatten_with(
        &file.entries,
        leaf,
        &FlattenOptions {
            filter: opts.filter,
            preview_max_chars: opts.preview_max_chars,
        },
    );

    if opts.json {
        for row in &view.rows {
            println!("{}", serde_json::to_string(row).context("serialize row")?);
        }
        return Ok(());
    }

    if view.is_empty() {
        if file.entries.is_empty() {
            bail!("{} has no entries", path.display());
        }
        println!("No entries match filter '{}'.", opts.filter.as_str());
        return Ok(());
    }
    for line in tree_lines(&view, opts.show_labels, None) {
        println!("{line}");
    }
    Ok(())
}
