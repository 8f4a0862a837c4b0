//! `namely recover` command implementation.
//!
//! Runs the full recovery pipeline against a running oracle. Single-file mode
//! writes to `--outfile` (or stdout); list mode derives each output path from
//! the input name via the extension override and processes files on the rayon
//! pool. Oracle or parse failure on one file is counted and logged, never
//! fatal to the batch.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use miette::Result;
use rayon::prelude::*;
use tracing::{info, warn};

use namely_core::pipeline::{recover_file, Recovered};
use namely_core::{OracleClient, RenameOptions};

/// Extension used in list mode when no override is given.
const DEFAULT_LIST_EXT: &str = "recovered.js";

pub struct RecoverAction {
    pub file: PathBuf,
    pub listmode: bool,
    pub width: usize,
    pub ip: String,
    pub port: u16,
    pub outfile: Option<PathBuf>,
    pub ext: Option<String>,
    pub stats: bool,
    pub strict_boundary: bool,
}

pub fn run(action: &RecoverAction) -> Result<()> {
    let client = OracleClient::new(&action.ip, action.port)
        .map_err(|e| miette::miette!("Failed to build oracle client: {e}"))?;
    let options = RenameOptions {
        strict_chain_boundary: action.strict_boundary,
    };

    if !action.listmode {
        let recovered = recover_file(&action.file, &client, action.width, &options)
            .map_err(|e| miette::miette!("{e}"))?;
        let target = action
            .outfile
            .clone()
            .or_else(|| action.ext.as_deref().map(|ext| derive_output(&action.file, ext)));
        match &target {
            Some(path) => write_output(path, &recovered, action.stats)
                .map_err(|e| miette::miette!("Failed to write {}: {}", path.display(), e))?,
            None => print!("{}", recovered.output),
        }
        return Ok(());
    }

    let paths = super::read_list(&action.file)?;
    let ext = action.ext.as_deref().unwrap_or(DEFAULT_LIST_EXT);
    let succeeded = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    paths.par_iter().for_each(|path| {
        let outcome = recover_file(path, &client, action.width, &options)
            .and_then(|recovered| {
                let target = derive_output(path, ext);
                write_output(&target, &recovered, action.stats)?;
                Ok(recovered)
            });
        match outcome {
            Ok(recovered) => {
                let done = succeeded.fetch_add(1, Ordering::Relaxed) + 1;
                info!(
                    file = %path.display(),
                    renamed = recovered.renamed,
                    succeeded = done,
                    failed = failed.load(Ordering::Relaxed),
                    "recovered"
                );
            }
            Err(e) => {
                let bad = failed.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    file = %path.display(),
                    error = %e,
                    succeeded = succeeded.load(Ordering::Relaxed),
                    failed = bad,
                    "recovery failed"
                );
            }
        }
    });

    info!(
        total = paths.len(),
        succeeded = succeeded.load(Ordering::Relaxed),
        failed = failed.load(Ordering::Relaxed),
        "recovery finished"
    );
    Ok(())
}

/// Derive an output path from the input name: `bundle.min.js` with extension
/// `c2n.js` becomes `bundle.c2n.js` next to the input.
fn derive_output(input: &Path, ext: &str) -> PathBuf {
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output");
    let stem = name
        .strip_suffix(".min.js")
        .or_else(|| name.strip_suffix(".js"))
        .unwrap_or(name);
    input.with_file_name(format!("{stem}.{}", ext.trim_start_matches('.')))
}

fn write_output(path: &Path, recovered: &Recovered, stats: bool) -> namely_core::Result<()> {
    std::fs::write(path, &recovered.output)?;
    if stats {
        let stats_path = path.with_extension("timing.stats");
        std::fs::write(
            &stats_path,
            format!("Time : {}\n", recovered.elapsed.as_millis()),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_output_strips_min_suffix() {
        assert_eq!(
            derive_output(Path::new("dist/bundle.min.js"), "c2n.js"),
            PathBuf::from("dist/bundle.c2n.js")
        );
    }

    #[test]
    fn test_derive_output_plain_js() {
        assert_eq!(
            derive_output(Path::new("app.js"), ".out.js"),
            PathBuf::from("app.out.js")
        );
    }

    #[test]
    fn test_derive_output_unknown_extension() {
        assert_eq!(
            derive_output(Path::new("weird.txt"), "js"),
            PathBuf::from("weird.txt.js")
        );
    }
}
