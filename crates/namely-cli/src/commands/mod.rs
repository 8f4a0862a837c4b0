pub mod extract;
pub mod recover;

use std::path::{Path, PathBuf};

use miette::Result;

/// Read a newline-separated list of input paths, skipping blank lines.
pub fn read_list(path: &Path) -> Result<Vec<PathBuf>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("Failed to read list file {}: {}", path.display(), e))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}
