//! End-to-end checks of the persisted training-record format, going through
//! the filesystem the way the CLI does.

use std::fs;

use namely_core::pipeline::extract_file;
use namely_core::{Error, DEFAULT_WIDTH};

#[test]
fn persisted_records_have_stable_shape() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("billing lib.min.js");
    fs::write(&input, "function f(a,b){return a+b;}").unwrap();

    let lines = extract_file(&input, DEFAULT_WIDTH).unwrap();
    assert!(!lines.is_empty());

    for line in &lines {
        let mut parts = line.split(' ');
        // File label first, whitespace-free even for paths with spaces.
        let label = parts.next().unwrap();
        assert!(label.ends_with("billing_lib.min.js"), "{line}");
        // Variable tag second.
        let tag = parts.next().unwrap();
        assert!(tag.starts_with("ID:"), "{line}");
        let mut fields = tag.splitn(3, ':');
        fields.next();
        let scope: usize = fields.next().unwrap().parse().unwrap();
        assert!(scope > 0, "{line}");
        assert!(!fields.next().unwrap().is_empty(), "{line}");
        // Context text follows.
        assert!(parts.next().is_some(), "{line}");
    }
}

#[test]
fn records_merge_per_variable() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("app.min.js");
    // `a` occurs three times but yields a single record.
    fs::write(&input, "function f(a){return a+a;}").unwrap();

    let lines = extract_file(&input, DEFAULT_WIDTH).unwrap();
    let a_lines: Vec<_> = lines.iter().filter(|l| l.contains(":a ")).collect();
    assert_eq!(a_lines.len(), 1);
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = extract_file(&dir.path().join("absent.js"), DEFAULT_WIDTH).unwrap_err();
    assert!(matches!(err, Error::FileRead { .. }));
}

#[test]
fn unparsable_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.js");
    fs::write(&input, "function (").unwrap();
    let err = extract_file(&input, DEFAULT_WIDTH).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}
