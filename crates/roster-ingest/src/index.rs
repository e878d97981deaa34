//! Source index loading
//!
//! The index is a newline-delimited list. Each entry is either an absolute
//! `http`/`https` URL, used as-is, or a file name resolved against the data root.
//! Blank lines and lines starting with `#` are ignored.

use roster_common::{Locator, Result, RosterError};
use std::path::Path;
use tracing::{debug, info};

/// Read the index at `index_path` into an ordered list of locators
pub async fn load_index(index_path: &Path, data_root: &Path) -> Result<Vec<Locator>> {
    let contents = tokio::fs::read_to_string(index_path)
        .await
        .map_err(|source| RosterError::Index {
            path: index_path.display().to_string(),
            source,
        })?;

    let locators = parse_index(&contents, data_root)?;
    info!(
        index = %index_path.display(),
        sources = locators.len(),
        "Loaded source index"
    );

    Ok(locators)
}

/// Turn index text into locators, resolving file entries against `data_root`
pub fn parse_index(contents: &str, data_root: &Path) -> Result<Vec<Locator>> {
    let root = std::path::absolute(data_root)?;

    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| -> Result<Locator> {
            let locator = match Locator::parse(line) {
                Ok(locator) if locator.is_remote() => locator,
                _ => Locator::from_file_path(root.join(line))?,
            };
            debug!(entry = line, source = %locator, "Resolved index entry");
            Ok(locator)
        })
        .collect()
}
