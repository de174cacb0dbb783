//! Loader Tests
//!
//! Tests verify:
//! - One record per JSON object line
//! - Blank lines are skipped
//! - Malformed and non-object lines are rejected

use std::io::{Cursor, Write};

use atlasdb::db::{load_json_lines, load_json_lines_file, FindOptions, RangeQuery};
use atlasdb::{AtlasError, Config, Database};
use tempfile::NamedTempFile;

fn open() -> Database {
    Database::open(Config::default()).unwrap()
}

#[test]
fn test_load_from_reader() {
    let db = open();
    let input = "{\"name\":\"John\",\"age\":15}\n\n{\"name\":\"Johnny\",\"age\":20}\n   \n{\"name\":\"David\",\"age\":22}\n";

    let count = load_json_lines(&db, Cursor::new(input)).unwrap();

    assert_eq!(count, 3);
    assert_eq!(db.len(), 3);
    assert_eq!(
        db.find_in_range(&RangeQuery::new("age", 15, 21)).unwrap().len(),
        2
    );
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    for i in 0..10 {
        writeln!(file, "{{\"n\": {}}}", i).unwrap();
    }
    file.flush().unwrap();

    let db = open();
    let count = load_json_lines_file(&db, file.path()).unwrap();

    assert_eq!(count, 10);
    assert_eq!(db.find_all(FindOptions::all()).unwrap().len(), 10);
}

#[test]
fn test_non_object_line_is_rejected() {
    let db = open();
    let err = load_json_lines(&db, Cursor::new("{\"a\":1}\n[1,2]\n")).unwrap_err();

    match err {
        AtlasError::InvalidArgument(msg) => assert!(msg.starts_with("line 2:"), "{msg}"),
        other => panic!("unexpected error {other:?}"),
    }
    // Lines before the bad one were kept
    assert_eq!(db.len(), 1);
}

#[test]
fn test_malformed_line_is_a_serialization_error() {
    let db = open();
    let err = load_json_lines(&db, Cursor::new("{not json}\n")).unwrap_err();
    assert!(matches!(err, AtlasError::Serialization(_)));
}

#[test]
fn test_missing_file() {
    let db = open();
    let dir = tempfile::tempdir().unwrap();
    let err = load_json_lines_file(&db, &dir.path().join("absent.jsonl")).unwrap_err();
    assert!(matches!(err, AtlasError::Io(_)));
}
