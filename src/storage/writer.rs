//! Writes data files in the layout read by [`DataSet`](crate::DataSet).
//!
//! Available to the crate's own tests and, with the `test-util` feature, to
//! benchmarks and downstream fixtures.

use std::path::Path;

use crate::constants::*;
use crate::error::{Result, UadbError};
use crate::storage::format::{
    get_format, serialize_string, NodeRecord, ProfileRecord, SignatureRecord, ValueRecord,
};
use crate::storage::header::Header;
use crate::storage::metadata::Metadata;

#[derive(Debug, Default)]
struct Region {
    count: u32,
    data: Vec<u8>,
}

impl Region {
    fn push(&mut self, record: &[u8]) -> u32 {
        let offset = self.data.len() as u32;
        self.data.extend_from_slice(record);
        self.count += 1;
        offset
    }

    fn push_integers(&mut self, values: &[i32]) -> u32 {
        let first = self.count;
        for value in values {
            self.push(&value.to_le_bytes());
        }
        first
    }
}

/// Assembles a data file list by list.
///
/// Offsets returned by the `add_*` methods of variable-length lists are byte
/// offsets within that list; fixed-length lists return record indexes.
#[derive(Debug)]
pub struct DataFileBuilder {
    metadata: Metadata,
    strings: Region,
    values: Region,
    profiles: Region,
    signatures: Region,
    signature_node_offsets: Region,
    node_ranked_signature_indexes: Region,
    ranked_signature_indexes: Region,
    nodes: Region,
}

impl DataFileBuilder {
    pub fn new(version: u16, component_count: u16) -> Self {
        Self {
            metadata: Metadata::new(version, component_count),
            strings: Region::default(),
            values: Region::default(),
            profiles: Region::default(),
            signatures: Region::default(),
            signature_node_offsets: Region::default(),
            node_ranked_signature_indexes: Region::default(),
            ranked_signature_indexes: Region::default(),
            nodes: Region::default(),
        }
    }

    pub fn version(&self) -> u16 {
        self.metadata.version
    }

    pub fn add_string(&mut self, value: &str) -> i32 {
        self.strings.push(&serialize_string(value)) as i32
    }

    pub fn add_value(&mut self, record: ValueRecord) -> u32 {
        self.values.push(&record.serialize());
        self.values.count - 1
    }

    pub fn add_profile(&mut self, record: &ProfileRecord) -> i32 {
        self.profiles.push(&record.serialize()) as i32
    }

    /// Append a signature. Its profile offsets must cover every component.
    pub fn add_signature(&mut self, record: &SignatureRecord) -> Result<u32> {
        if record.profile_offsets.len() != self.metadata.component_count as usize {
            return Err(UadbError::InvalidConfig(format!(
                "signature has {} profile offsets, file has {} components",
                record.profile_offsets.len(),
                self.metadata.component_count
            )));
        }
        self.signatures.push(&record.serialize());
        Ok(self.signatures.count - 1)
    }

    /// Append node offsets for one signature, returning the index of the first
    pub fn add_signature_node_offsets(&mut self, offsets: &[i32]) -> u32 {
        self.signature_node_offsets.push_integers(offsets)
    }

    pub fn add_ranked_signature_indexes(&mut self, indexes: &[i32]) -> u32 {
        self.ranked_signature_indexes.push_integers(indexes)
    }

    /// Append a node in this file's format.
    ///
    /// For 3.2 files, nodes with more than one ranked signature have their
    /// indexes moved into the node ranked signature index list and the block
    /// start filled in.
    pub fn add_node(&mut self, record: &NodeRecord) -> Result<i32> {
        let format = get_format(self.metadata.version)?;
        let mut record = record.clone();
        if self.metadata.version == FORMAT_V32 && record.ranked_signature_indexes.len() > 1 {
            record.ranked_signature_block = self
                .node_ranked_signature_indexes
                .push_integers(&record.ranked_signature_indexes)
                as i32;
        }
        Ok(self.nodes.push(&format.serialize_node(&record)) as i32)
    }

    /// Offset the next node will be written at
    pub fn next_node_offset(&self) -> i32 {
        self.nodes.data.len() as i32
    }

    /// Serialize the whole file
    pub fn finish(&self) -> Vec<u8> {
        let regions = [
            &self.strings,
            &self.values,
            &self.profiles,
            &self.signatures,
            &self.signature_node_offsets,
            &self.node_ranked_signature_indexes,
            &self.ranked_signature_indexes,
            &self.nodes,
        ];

        let mut out = Vec::new();
        out.extend_from_slice(&self.metadata.to_bytes());

        let mut position = (METADATA_SIZE + regions.len() * LIST_HEADER_SIZE) as u64;
        for region in regions {
            let length = region.data.len() as u64;
            Header::new(region.count, position, length).write(&mut out);
            position += length;
        }

        for region in regions {
            out.extend_from_slice(&region.data);
        }
        out
    }

    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.finish())?;
        Ok(())
    }
}
