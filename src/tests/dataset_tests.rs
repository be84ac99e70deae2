use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

use super::fixtures::*;
use crate::constants::*;
use crate::core::dataset::{CacheSizes, DataSet, DataSetBuilder, SourceConfig};
use crate::error::UadbError;

fn write_sample(dir: &TempDir, name: &str, version: u16) -> (Sample, std::path::PathBuf) {
    let sample = sample(version);
    let path = dir.path().join(name);
    std::fs::write(&path, &sample.data).unwrap();
    (sample, path)
}

fn check_contents(dataset: &DataSet, sample: &Sample) {
    assert_eq!(dataset.component_count(), SAMPLE_COMPONENTS);
    assert_eq!(dataset.strings().count(), 6);
    assert_eq!(dataset.values().count(), 3);
    assert_eq!(dataset.profiles().count(), 2);
    assert_eq!(dataset.signatures().count(), 2);
    assert_eq!(dataset.nodes().count(), 3);
    assert_eq!(dataset.signature_node_offsets().count(), 3);
    assert_eq!(dataset.ranked_signature_indexes().count(), 2);

    let value = dataset.values().get(0).unwrap();
    assert_eq!(value.name(&dataset).unwrap().as_str(), "Chrome");

    let root = dataset.nodes().get(sample.nodes[0] as u32).unwrap();
    assert_eq!(root.numeric_children().unwrap().len(), 2);
}

#[test]
fn test_open_file() {
    let dir = TempDir::new().unwrap();
    let (sample, path) = write_sample(&dir, "data.dat", FORMAT_V32);

    let dataset = DataSet::open(&path).unwrap();
    assert_eq!(dataset.source().kind(), "file");
    check_contents(&dataset, &sample);
}

#[test]
fn test_open_mapped() {
    let dir = TempDir::new().unwrap();
    let (sample, path) = write_sample(&dir, "data.dat", FORMAT_V31);

    let dataset = DataSet::open_mapped(&path).unwrap();
    assert_eq!(dataset.source().kind(), "mapped");
    check_contents(&dataset, &sample);
}

#[test]
fn test_open_memory() {
    let sample = sample(FORMAT_V32);

    let dataset = DataSet::from_bytes(sample.data.clone()).unwrap();
    assert_eq!(dataset.source().kind(), "memory");
    check_contents(&dataset, &sample);
}

#[test]
fn test_two_data_sets_side_by_side() {
    let dir = TempDir::new().unwrap();
    let (sample, path) = write_sample(&dir, "data.dat", FORMAT_V32);

    let first = DataSet::open_mapped(&path).unwrap();
    let second = DataSet::open_mapped(&path).unwrap();

    check_contents(&first, &sample);
    drop(first);
    check_contents(&second, &sample);
}

#[test]
fn test_open_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.dat");

    assert!(matches!(DataSet::open(&path), Err(UadbError::Open { .. })));
    assert!(matches!(
        DataSet::open_mapped(&path),
        Err(UadbError::Open { .. })
    ));
}

#[test]
fn test_open_invalid_data() {
    let mut data = sample(FORMAT_V32).data;
    data[0] = b'X';
    assert!(matches!(
        DataSet::from_bytes(data),
        Err(UadbError::InvalidSignature)
    ));

    let mut data = sample(FORMAT_V32).data;
    data[8..10].copy_from_slice(&33u16.to_le_bytes());
    assert!(matches!(
        DataSet::from_bytes(data),
        Err(UadbError::UnsupportedVersion(33))
    ));

    let err = DataSet::from_bytes(Vec::new()).unwrap_err();
    assert!(err.is_truncated());
}

#[test]
fn test_open_header_past_end() {
    let mut data = sample(FORMAT_V32).data;
    // Strings header length field
    let length_field = METADATA_SIZE + 12;
    data[length_field..length_field + 8].copy_from_slice(&(1i64 << 40).to_le_bytes());

    assert!(matches!(
        DataSet::from_bytes(data),
        Err(UadbError::InvalidHeader {
            list: "strings",
            ..
        })
    ));
}

#[test]
fn test_builder_configuration() {
    let sample = sample(FORMAT_V32);

    let dataset = DataSet::builder()
        .memory(sample.data.clone())
        .strings_cache(1)
        .nodes_cache(2)
        .values_cache(3)
        .profiles_cache(4)
        .signatures_cache(5)
        .build()
        .unwrap();

    assert_eq!(dataset.strings().cache().capacity(), 1);
    assert_eq!(dataset.nodes().cache().capacity(), 2);
    assert_eq!(dataset.values().cache().capacity(), 3);
    assert_eq!(dataset.profiles().cache().capacity(), 4);
    assert_eq!(dataset.signatures().cache().capacity(), 5);
}

#[test]
fn test_builder_defaults() {
    let config = DataSetBuilder::new().file("data.dat").into_config().unwrap();

    assert_eq!(config.cache_sizes, CacheSizes::default());
    assert_eq!(config.cache_sizes.nodes, DEFAULT_NODES_CACHE);
    assert!(matches!(
        config.source,
        SourceConfig::File {
            temporary: false,
            ..
        }
    ));
}

#[test]
fn test_builder_rejects_bad_configuration() {
    assert!(matches!(
        DataSetBuilder::new().build(),
        Err(UadbError::InvalidConfig(_))
    ));
    assert!(matches!(
        DataSetBuilder::new().memory(vec![0u8; 4]).nodes_cache(0).build(),
        Err(UadbError::InvalidConfig(_))
    ));
    assert!(matches!(
        DataSetBuilder::new().memory(vec![0u8; 4]).temporary(true).build(),
        Err(UadbError::InvalidConfig(_))
    ));
}

#[test]
fn test_stats_and_reset_cache() {
    let sample = sample(FORMAT_V32);
    let dataset = DataSet::from_bytes(sample.data.clone()).unwrap();

    dataset.values().get(0).unwrap();
    dataset.values().get(0).unwrap();
    dataset.nodes().get(sample.nodes[1] as u32).unwrap();

    let stats = dataset.stats();
    assert_eq!(stats.values.requests, 2);
    assert_eq!(stats.values.misses, 1);
    assert!((stats.values.percentage_misses - 0.5).abs() < f64::EPSILON);
    assert_eq!(stats.nodes.requests, 1);
    assert_eq!(stats.strings.requests, 0);
    assert!(stats.readers_created >= 1);
    assert_eq!(stats.readers_queued, stats.readers_created);
    assert!(stats.format().contains("Values: 2 requests, 1 misses"));

    dataset.reset_cache();

    let stats = dataset.stats();
    assert_eq!(stats.total_requests(), 0);
    assert_eq!(stats.values.entries, 0);

    dataset.values().get(0).unwrap();
    assert_eq!(dataset.stats().values.misses, 1);
}

#[test]
fn test_out_of_range_keys() {
    let dataset = DataSet::from_bytes(sample(FORMAT_V32).data).unwrap();

    assert!(matches!(
        dataset.values().get(3),
        Err(UadbError::IndexOutOfRange { list: "values", .. })
    ));
    assert!(matches!(
        dataset.nodes().get(10_000),
        Err(UadbError::OffsetOutOfRange { list: "nodes", .. })
    ));
    assert_eq!(dataset.stats().total_requests(), 0);
}

#[test]
fn test_dispose() {
    let sample = sample(FORMAT_V32);
    let dataset = DataSet::from_bytes(sample.data.clone()).unwrap();

    let profile = dataset.profiles().get(sample.profiles[0] as u32).unwrap();
    let cached = dataset.values().get(0).unwrap();

    dataset.dispose();
    dataset.dispose();
    assert!(dataset.is_disposed());

    // Already materialized data stays usable
    assert_eq!(cached.property_index(), 0);

    assert!(matches!(dataset.values().get(1), Err(UadbError::Disposed)));

    match profile.value_indexes() {
        Err(UadbError::Entity { context, source }) => {
            assert_eq!(context, "cannot obtain value indexes");
            assert!(matches!(*source, UadbError::Disposed));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_temporary_file_deleted_on_drop() {
    let dir = TempDir::new().unwrap();
    let (sample, path) = write_sample(&dir, "data.dat", FORMAT_V32);

    let dataset = DataSet::builder()
        .file(&path)
        .temporary(true)
        .build()
        .unwrap();
    check_contents(&dataset, &sample);
    assert!(path.exists());

    drop(dataset);
    assert!(!path.exists());
}

#[test]
fn test_tmp_extension_deleted_on_dispose() {
    let dir = TempDir::new().unwrap();
    let (_sample, path) = write_sample(&dir, "update.tmp", FORMAT_V31);

    let dataset = DataSet::open(&path).unwrap();
    dataset.values().get(0).unwrap();
    dataset.dispose();

    assert!(!path.exists());
}

#[test]
fn test_regular_file_kept() {
    let dir = TempDir::new().unwrap();
    let (_sample, path) = write_sample(&dir, "data.dat", FORMAT_V32);

    drop(DataSet::open(&path).unwrap());
    assert!(path.exists());
}

fn patch_i32(data: &mut [u8], at: usize, value: i32) {
    data[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn assert_record_past_end(err: &UadbError) {
    match err {
        UadbError::Entity { context, source } => {
            assert_eq!(*context, "record extends past the end of its list");
            assert!(matches!(
                **source,
                UadbError::ImpossibleCount {
                    what: "record length",
                    ..
                }
            ));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_corrupt_node_count_rejected() {
    let sample = sample(FORMAT_V32);
    let start = DataSet::from_bytes(sample.data.clone())
        .unwrap()
        .nodes()
        .header()
        .start_position as usize;

    // Claim far more numeric children than the list holds
    let mut data = sample.data.clone();
    let field = start + sample.nodes[0] as usize + 14;
    data[field..field + 2].copy_from_slice(&30_000i16.to_le_bytes());

    let dataset = DataSet::from_bytes(data).unwrap();
    let err = dataset.nodes().get(sample.nodes[0] as u32).unwrap_err();
    assert_record_past_end(&err);
    assert!(err
        .to_string()
        .starts_with("record extends past the end of its list"));

    // Failure is not cached and does not poison the rest of the data set
    assert!(dataset.nodes().get(sample.nodes[0] as u32).is_err());
    assert!(dataset.nodes().load(sample.nodes[0] as u32).is_err());
    assert_eq!(
        dataset.values().get(0).unwrap().name(&dataset).unwrap().as_str(),
        "Chrome"
    );
    let stats = dataset.stats();
    assert_eq!(stats.readers_queued, stats.readers_created);
}

#[test]
fn test_corrupt_profile_count_does_not_read_next_list() {
    let sample = sample(FORMAT_V31);
    let start = DataSet::from_bytes(sample.data.clone())
        .unwrap()
        .profiles()
        .header()
        .start_position as usize;

    // The last profile claims 5 signatures; the extra ones would come from the signatures list
    let mut data = sample.data.clone();
    patch_i32(&mut data, start + sample.profiles[1] as usize + 9, 5);

    let dataset = DataSet::from_bytes(data.clone()).unwrap();
    assert_record_past_end(&dataset.profiles().get(sample.profiles[1] as u32).unwrap_err());

    // Earlier records still parse; enumeration stops at the bad one
    assert!(dataset.profiles().get(sample.profiles[0] as u32).is_ok());
    let items: Vec<_> = dataset.profiles().iter().collect();
    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(items[1].is_err());

    // A count near i32::MAX fails before any index array is read
    patch_i32(&mut data, start + sample.profiles[1] as usize + 9, i32::MAX);
    let dataset = DataSet::from_bytes(data).unwrap();
    assert_record_past_end(&dataset.profiles().get(sample.profiles[1] as u32).unwrap_err());
}

#[test]
fn test_data_set_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DataSet>();
    assert_send_sync::<crate::Node>();
    assert_send_sync::<crate::Profile>();
}

#[test]
fn test_concurrent_reads() {
    let sample = sample(FORMAT_V32);
    let nodes = sample.nodes;
    let dataset = Arc::new(
        DataSet::builder()
            .memory(sample.data.clone())
            .nodes_cache(1)
            .values_cache(1)
            .build()
            .unwrap(),
    );
    let mut handles = vec![];

    for t in 0..8 {
        let dataset = Arc::clone(&dataset);
        handles.push(thread::spawn(move || {
            for i in 0..200 {
                let offset = nodes[(i + t) % nodes.len()];
                let node = dataset.nodes().get(offset as u32).unwrap();
                assert_eq!(node.offset(), offset as u32);
                node.ranked_signature_indexes().unwrap();

                let value = dataset.values().get(((i + t) % 3) as u32).unwrap();
                value.name(&dataset).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = dataset.stats();
    assert_eq!(stats.nodes.requests, 1600);
    assert!(stats.nodes.switches > 0);
    assert_eq!(stats.readers_queued, stats.readers_created);
}
