use std::io::Cursor;

use crate::constants::*;
use crate::error::UadbError;
use crate::storage::header::Header;
use crate::storage::metadata::Metadata;
use crate::storage::reader::Reader;

fn reader_over(data: Vec<u8>) -> Reader {
    Reader::new(0, Box::new(Cursor::new(data)))
}

#[test]
fn test_metadata_creation() {
    let metadata = Metadata::new(FORMAT_V32, 4);

    assert_eq!(&metadata.signature, UADB_SIGNATURE);
    assert_eq!(metadata.version, 32);
    assert_eq!(metadata.component_count, 4);
    assert_eq!(metadata.list_count, LIST_COUNT);
    assert!(metadata.validate().is_ok());
}

#[test]
fn test_metadata_serialization() {
    let metadata = Metadata::new(FORMAT_V31, 3);
    let bytes = metadata.to_bytes();

    assert_eq!(bytes.len(), METADATA_SIZE);
    assert_eq!(&bytes[..8], b"UADB_DAT");

    let restored = Metadata::read(&mut reader_over(bytes.to_vec())).unwrap();
    assert_eq!(restored, metadata);
}

#[test]
fn test_invalid_signature() {
    let mut bytes = Metadata::new(FORMAT_V32, 4).to_bytes();
    bytes[0] = b'X';

    let result = Metadata::read(&mut reader_over(bytes.to_vec()));
    assert!(matches!(result, Err(UadbError::InvalidSignature)));
}

#[test]
fn test_unsupported_version() {
    let bytes = Metadata::new(30, 4).to_bytes();

    let result = Metadata::read(&mut reader_over(bytes.to_vec()));
    assert!(matches!(result, Err(UadbError::UnsupportedVersion(30))));
}

#[test]
fn test_wrong_list_count() {
    let mut metadata = Metadata::new(FORMAT_V32, 4);
    metadata.list_count = 7;

    let result = Metadata::read(&mut reader_over(metadata.to_bytes().to_vec()));
    assert!(matches!(
        result,
        Err(UadbError::InvalidHeader {
            list: "metadata",
            ..
        })
    ));
}

#[test]
fn test_truncated_metadata() {
    let bytes = Metadata::new(FORMAT_V32, 4).to_bytes();

    let err = Metadata::read(&mut reader_over(bytes[..10].to_vec())).unwrap_err();
    assert!(err.is_truncated());
}

#[test]
fn test_header_serialization() {
    let header = Header::new(100, 64, 1600);
    let bytes = header.to_bytes();
    assert_eq!(bytes.len(), LIST_HEADER_SIZE);

    let restored = Header::read("blocks", &mut reader_over(bytes.to_vec())).unwrap();
    assert_eq!(restored, header);
    assert_eq!(restored.end_position(), 1664);
}

#[test]
fn test_header_rejects_negative_fields() {
    let mut data = Vec::new();
    data.extend_from_slice(&(-1i32).to_le_bytes());
    data.extend_from_slice(&64i64.to_le_bytes());
    data.extend_from_slice(&16i64.to_le_bytes());

    let result = Header::read("blocks", &mut reader_over(data));
    assert!(matches!(
        result,
        Err(UadbError::InvalidHeader { list: "blocks", .. })
    ));

    let mut data = Vec::new();
    data.extend_from_slice(&1i32.to_le_bytes());
    data.extend_from_slice(&(-64i64).to_le_bytes());
    data.extend_from_slice(&16i64.to_le_bytes());

    assert!(Header::read("blocks", &mut reader_over(data)).is_err());
}

#[test]
fn test_header_region_validation() {
    let header = Header::new(10, 100, 50);

    assert!(header.validate("blocks", 150).is_ok());
    assert!(header.validate("blocks", 149).is_err());

    let overflow = Header::new(1, u64::MAX, 1);
    assert!(overflow.validate("blocks", u64::MAX).is_err());
}

#[test]
fn test_header_fixed_validation() {
    let header = Header::new(10, 0, 160);

    assert!(header.validate_fixed("blocks", 16).is_ok());
    assert!(header.validate_fixed("blocks", 15).is_ok());
    assert!(header.validate_fixed("blocks", 17).is_err());
}
