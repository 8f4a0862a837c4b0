//! `namely extract` command implementation.
//!
//! Runs the context-extraction pipeline over one file or a list of files and
//! appends the aggregated records to a training log. In list mode files are
//! processed on the rayon pool; the log writer is shared behind a mutex so
//! records from one file are never interleaved with another's.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use miette::Result;
use rayon::prelude::*;
use tracing::{info, warn};

use namely_core::pipeline::extract_file;

pub struct ExtractAction {
    pub file: PathBuf,
    pub listmode: bool,
    pub width: usize,
    pub outfile: PathBuf,
    pub append: bool,
}

pub fn run(action: &ExtractAction) -> Result<()> {
    let log = open_log(&action.outfile, action.append)?;

    if !action.listmode {
        let lines = extract_file(&action.file, action.width)
            .map_err(|e| miette::miette!("{e}"))?;
        let mut writer = log;
        write_lines(&mut writer, &lines)
            .map_err(|e| miette::miette!("Failed to write {}: {}", action.outfile.display(), e))?;
        writer
            .flush()
            .map_err(|e| miette::miette!("Failed to flush {}: {}", action.outfile.display(), e))?;
        info!(file = %action.file.display(), records = lines.len(), "extracted");
        return Ok(());
    }

    let paths = super::read_list(&action.file)?;
    let writer = Mutex::new(log);
    let succeeded = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    paths.par_iter().for_each(|path| {
        match extract_file(path, action.width) {
            Ok(lines) => {
                let mut log = writer.lock().unwrap();
                if let Err(e) = write_lines(&mut *log, &lines) {
                    warn!(file = %path.display(), error = %e, "write failed");
                    failed.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                let done = succeeded.fetch_add(1, Ordering::Relaxed) + 1;
                info!(
                    file = %path.display(),
                    records = lines.len(),
                    succeeded = done,
                    failed = failed.load(Ordering::Relaxed),
                    "extracted"
                );
            }
            Err(e) => {
                let bad = failed.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    file = %path.display(),
                    error = %e,
                    succeeded = succeeded.load(Ordering::Relaxed),
                    failed = bad,
                    "extraction failed"
                );
            }
        }
    });

    writer
        .lock()
        .unwrap()
        .flush()
        .map_err(|e| miette::miette!("Failed to flush {}: {}", action.outfile.display(), e))?;
    info!(
        total = paths.len(),
        succeeded = succeeded.load(Ordering::Relaxed),
        failed = failed.load(Ordering::Relaxed),
        "extraction finished"
    );
    Ok(())
}

fn open_log(path: &Path, append: bool) -> Result<BufWriter<std::fs::File>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .map_err(|e| miette::miette!("Failed to open {}: {}", path.display(), e))?;
    Ok(BufWriter::new(file))
}

fn write_lines(writer: &mut impl Write, lines: &[String]) -> std::io::Result<()> {
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_list_mode_writes_every_file_through_shared_log() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.min.js");
        let second = dir.path().join("second.min.js");
        fs::write(&first, "function f(a){return a;}").unwrap();
        fs::write(&second, "function g(b){return b;}").unwrap();
        let list = dir.path().join("inputs.txt");
        fs::write(&list, format!("{}\n{}\n", first.display(), second.display())).unwrap();
        let outfile = dir.path().join("contexts.txt");

        run(&ExtractAction {
            file: list,
            listmode: true,
            width: 5,
            outfile: outfile.clone(),
            append: false,
        })
        .unwrap();

        let log = fs::read_to_string(&outfile).unwrap();
        assert!(log.lines().any(|l| l.contains(":a ")), "{log}");
        assert!(log.lines().any(|l| l.contains(":b ")), "{log}");
    }

    #[test]
    fn test_failed_file_does_not_abort_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.min.js");
        fs::write(&good, "function f(a){return a;}").unwrap();
        let list = dir.path().join("inputs.txt");
        fs::write(
            &list,
            format!("{}\n{}\n", dir.path().join("absent.js").display(), good.display()),
        )
        .unwrap();
        let outfile = dir.path().join("contexts.txt");

        run(&ExtractAction {
            file: list,
            listmode: true,
            width: 5,
            outfile: outfile.clone(),
            append: false,
        })
        .unwrap();

        let log = fs::read_to_string(&outfile).unwrap();
        assert!(log.lines().any(|l| l.contains(":a ")), "{log}");
    }
}
