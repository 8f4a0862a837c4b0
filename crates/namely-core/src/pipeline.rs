//! Per-file pipelines: context extraction for training, and full name
//! recovery against a running oracle.
//!
//! Both pipelines share the same front half (parse, tokenize, resolve,
//! extract, aggregate); recovery adds the oracle round trip, the global
//! assignment pass, and regeneration. Failures are per-file: callers batch
//! over many files and tally errors without stopping.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use namely_parser::{parse, tokenize, Ast, Codegen};
use tracing::{debug, info};

use crate::aggregate::Aggregate;
use crate::error::{Error, Result};
use crate::extract::extract;
use crate::oracle::OracleClient;
use crate::rename::{assign_names, rewrite_plan, QueryVar};
use crate::resolve::{resolve, Resolution};
use crate::scope::RenameOptions;

/// Result of recovering one file.
#[derive(Debug)]
pub struct Recovered {
    /// Regenerated source with committed renames applied.
    pub output: String,
    /// Wall-clock time for the whole pipeline, oracle round trip included.
    pub elapsed: Duration,
    /// Number of identifier occurrences rewritten.
    pub renamed: usize,
}

/// Extract aggregated context records from a source string.
///
/// Returns training-log lines labeled with `label` (normally the file name).
pub fn extract_source(source: &str, label: &str, width: usize) -> Result<Vec<String>> {
    let (_ast, resolution) = front_half(source, label)?;
    let aggregate = aggregate_contexts(source, &resolution, width);
    debug!(label, records = aggregate.len(), "extracted context records");
    Ok(aggregate.persist_lines(label))
}

/// Extract aggregated context records from a file on disk.
pub fn extract_file(path: &Path, width: usize) -> Result<Vec<String>> {
    let source = read_source(path)?;
    extract_source(&source, &file_label(path), width)
}

/// Recover names in a source string using the oracle at `client`.
///
/// A file with no extractable variables is regenerated unchanged without
/// contacting the oracle. Oracle failure aborts the file: no partial output.
pub fn recover_source(
    source: &str,
    label: &str,
    client: &OracleClient,
    width: usize,
    options: &RenameOptions,
) -> Result<Recovered> {
    let started = Instant::now();
    let (ast, resolution) = front_half(source, label)?;
    let aggregate = aggregate_contexts(source, &resolution, width);

    let mut tree = resolution.scopes;
    let mut renamed = 0;
    let output = if aggregate.is_empty() {
        debug!(label, "no extractable variables");
        Codegen::new(&ast).generate()
    } else {
        let vars: Vec<QueryVar> = aggregate
            .records()
            .iter()
            .map(|r| QueryVar {
                name: r.name.clone(),
                scope_id: r.scope_id,
            })
            .collect();
        let response = client.predict(&aggregate.queries())?;
        assign_names(&mut tree, &vars, &response.predictions, options);
        let plan = rewrite_plan(&tree, &resolution.occurrences);
        renamed = plan.len();
        Codegen::with_renames(&ast, plan).generate()
    };

    let elapsed = started.elapsed();
    info!(label, renamed, elapsed_ms = elapsed.as_millis() as u64, "recovered");
    Ok(Recovered {
        output,
        elapsed,
        renamed,
    })
}

/// Recover names in a file on disk.
pub fn recover_file(
    path: &Path,
    client: &OracleClient,
    width: usize,
    options: &RenameOptions,
) -> Result<Recovered> {
    let source = read_source(path)?;
    recover_source(&source, &file_label(path), client, width, options)
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

fn file_label(path: &Path) -> String {
    path.display().to_string()
}

fn front_half(source: &str, label: &str) -> Result<(Ast, Resolution)> {
    let ast = parse(source).map_err(|e| Error::Parse {
        path: label.into(),
        message: e.to_string(),
    })?;
    let resolution = resolve(&ast);
    Ok((ast, resolution))
}

fn aggregate_contexts(source: &str, resolution: &Resolution, width: usize) -> Aggregate {
    let tokens = tokenize(source);
    let windows = extract(source, &tokens, &resolution.occurrences, width);
    Aggregate::from_windows(&windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::DEFAULT_WIDTH;

    #[test]
    fn test_extract_source_lines() {
        let lines =
            extract_source("function f(a) { return a; }", "lib.min.js", DEFAULT_WIDTH).unwrap();
        assert!(!lines.is_empty());
        for line in &lines {
            assert!(line.starts_with("lib.min.js ID:"), "{line}");
        }
    }

    #[test]
    fn test_extract_source_no_variables() {
        let lines = extract_source("var g = 1;", "g.js", DEFAULT_WIDTH).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_extract_source_parse_error() {
        let err = extract_source("function (", "broken.js", DEFAULT_WIDTH).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("broken.js"));
    }

    #[test]
    fn test_label_spaces_normalized() {
        let lines =
            extract_source("function f(a) { return a; }", "my bundle.js", DEFAULT_WIDTH).unwrap();
        assert!(lines[0].starts_with("my_bundle.js "));
    }
}
