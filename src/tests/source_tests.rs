use std::io::{Read, Seek, SeekFrom};
use tempfile::TempDir;

use crate::error::UadbError;
use crate::storage::mmap::MappedSource;
use crate::storage::source::{FileSource, MemorySource, Source};

fn write_file(dir: &TempDir, name: &str, data: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, data).unwrap();
    path
}

fn read_all(source: &dyn Source) -> Vec<u8> {
    let mut cursor = source.create_cursor().unwrap();
    let mut buf = Vec::new();
    cursor.read_to_end(&mut buf).unwrap();
    buf
}

#[test]
fn test_memory_cursors_are_independent() {
    let source = MemorySource::new(b"abcdef".to_vec());
    assert_eq!(source.len(), 6);

    let mut first = source.create_cursor().unwrap();
    let mut second = source.create_cursor().unwrap();

    first.seek(SeekFrom::Start(3)).unwrap();
    let mut buf = [0u8; 2];
    first.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"de");

    second.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"ab");
}

#[test]
fn test_file_source_reads_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "data.dat", b"file contents");

    let source = FileSource::open(&path, false).unwrap();
    assert_eq!(source.len(), 13);
    assert_eq!(source.kind(), "file");
    assert!(!source.is_temporary());
    assert_eq!(read_all(&source), b"file contents");
}

#[test]
fn test_file_source_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.dat");

    let err = FileSource::open(&path, false).unwrap_err();
    match err {
        UadbError::Open { path: p, .. } => assert_eq!(p, path),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_file_source_tracks_open_cursors() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "data.dat", b"abc");
    let source = FileSource::open(&path, false).unwrap();

    let first = source.create_cursor().unwrap();
    let second = source.create_cursor().unwrap();
    assert_eq!(source.open_cursors(), 2);

    drop(first);
    assert_eq!(source.open_cursors(), 1);
    drop(second);
    assert_eq!(source.open_cursors(), 0);
}

#[test]
fn test_tmp_extension_deleted_on_dispose() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "data.tmp", b"abc");

    let source = FileSource::open(&path, false).unwrap();
    assert!(source.is_temporary());

    drop(source.create_cursor().unwrap());
    source.dispose();

    assert!(!path.exists());
}

#[test]
fn test_flagged_temporary_deleted_on_dispose() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "data.dat", b"abc");

    let source = FileSource::open(&path, true).unwrap();
    source.dispose();

    assert!(!path.exists());
}

#[test]
fn test_temporary_delete_skipped_with_open_cursor() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "data.tmp", b"abc");

    let source = FileSource::open(&path, false).unwrap();
    let cursor = source.create_cursor().unwrap();

    // Must not fail, only skip
    source.dispose();
    assert!(path.exists());

    drop(cursor);
    source.dispose();
    assert!(path.exists());
}

#[test]
fn test_temporary_already_removed() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "data.tmp", b"abc");

    let source = FileSource::open(&path, false).unwrap();
    std::fs::remove_file(&path).unwrap();

    source.dispose();
    assert!(!path.exists());
}

#[test]
fn test_regular_file_kept_on_dispose() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "data.dat", b"abc");

    let source = FileSource::open(&path, false).unwrap();
    source.dispose();

    assert!(path.exists());
    assert!(matches!(source.create_cursor(), Err(UadbError::Disposed)));
}

#[test]
fn test_mapped_source_reads_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "mapped.dat", b"mapped contents");

    let source = MappedSource::open(&path).unwrap();
    assert_eq!(source.len(), 15);
    assert_eq!(source.kind(), "mapped");
    assert_eq!(read_all(&source), b"mapped contents");

    let mut cursor = source.create_cursor().unwrap();
    cursor.seek(SeekFrom::Start(7)).unwrap();
    let mut buf = [0u8; 8];
    cursor.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"contents");
}

#[test]
fn test_mapped_source_reuses_mapping() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "shared.dat", b"shared mapping");
    let other_path = write_file(&dir, "other.dat", b"other mapping");

    let first = MappedSource::open(&path).unwrap();
    let second = MappedSource::open(&path).unwrap();
    let other = MappedSource::open(&other_path).unwrap();

    assert!(first.shares_mapping_with(&second));
    assert!(!first.shares_mapping_with(&other));
}

#[test]
fn test_mapped_source_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = MappedSource::open(dir.path().join("missing.dat"));
    assert!(matches!(result, Err(UadbError::Open { .. })));
}

#[test]
fn test_mapped_view_outlives_source() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "view.dat", b"still readable");

    let source = MappedSource::open(&path).unwrap();
    let mut cursor = source.create_cursor().unwrap();
    source.dispose();
    drop(source);

    let mut buf = Vec::new();
    cursor.read_to_end(&mut buf).unwrap();
    assert_eq!(buf, b"still readable");
}
