use std::sync::Arc;

use crate::core::dataset::DataSet;
use crate::core::list::FixedEntityFactory;
use crate::error::Result;
use crate::storage::format::SignatureRecord;
use crate::storage::reader::Reader;

use super::{to_key, Node, Profile};

/// One signature: a profile per component plus the nodes that identify it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    index: u32,
    record: SignatureRecord,
}

impl Signature {
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Profile offsets, one per component; negative entries mean no profile
    pub fn profile_offsets(&self) -> &[i32] {
        &self.record.profile_offsets
    }

    pub fn node_count(&self) -> u32 {
        self.record.node_count as u32
    }

    pub fn first_node_offset_index(&self) -> i32 {
        self.record.first_node_offset_index
    }

    pub fn rank(&self) -> i32 {
        self.record.rank
    }

    pub fn flags(&self) -> u8 {
        self.record.flags
    }

    pub fn profiles(&self, dataset: &DataSet) -> Result<Vec<Arc<Profile>>> {
        self.record
            .profile_offsets
            .iter()
            .filter(|&&offset| offset >= 0)
            .map(|&offset| dataset.profiles().get(offset as u32))
            .collect()
    }

    /// Node offsets for this signature from the signature node offsets list
    pub fn node_offsets(&self, dataset: &DataSet) -> Result<Vec<i32>> {
        let first = to_key(self.record.first_node_offset_index, "first node offset index")?;
        dataset
            .signature_node_offsets()
            .get_range(first, self.node_count())
    }

    pub fn nodes(&self, dataset: &DataSet) -> Result<Vec<Arc<Node>>> {
        self.node_offsets(dataset)?
            .into_iter()
            .map(|offset| dataset.nodes().get(to_key(offset, "signature node offset")?))
            .collect()
    }

    pub fn to_record(&self) -> SignatureRecord {
        self.record.clone()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.record.serialize()
    }
}

/// Signature records hold one profile offset per component
#[derive(Debug, Clone, Copy)]
pub struct SignatureFactory {
    component_count: u16,
}

impl SignatureFactory {
    pub fn new(component_count: u16) -> Self {
        Self { component_count }
    }
}

impl FixedEntityFactory for SignatureFactory {
    type Entity = Signature;

    fn record_length(&self) -> u64 {
        SignatureRecord::record_length(self.component_count)
    }

    fn create(&self, index: u32, reader: &mut Reader) -> Result<Signature> {
        let profile_offsets = reader.read_i32_array(self.component_count as usize)?;
        let node_count = reader.read_count_i32("signature nodes")? as i32;
        let first_node_offset_index = reader.read_i32()?;
        let rank = reader.read_i32()?;
        let flags = reader.read_u8()?;

        Ok(Signature {
            index,
            record: SignatureRecord {
                profile_offsets,
                node_count,
                first_node_offset_index,
                rank,
                flags,
            },
        })
    }
}
