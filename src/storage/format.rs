use std::fmt;
use std::sync::Arc;

use crate::constants::*;
use crate::error::{Result, UadbError};
use crate::storage::reader::Reader;

/// Child of a node reached by matching characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeIndex {
    /// When set, `value` holds an offset into the strings list
    pub is_string: bool,
    pub value: [u8; 4],
    pub related_node_offset: i32,
}

impl NodeIndex {
    pub fn string_offset(&self) -> Option<i32> {
        self.is_string.then(|| i32::from_le_bytes(self.value))
    }
}

/// Child of a node reached by a numeric value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeNumericIndex {
    pub value: i16,
    pub related_node_offset: i32,
}

/// Fixed part of a node record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeader {
    pub position: i16,
    pub next_character_position: i16,
    pub parent_offset: i32,
    pub character_string_offset: i32,
    pub children_count: u32,
    pub numeric_children_count: u32,
    pub ranked_signature_count: u32,
}

/// How a node stores its ranked signature indexes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankedBlock {
    Empty,
    Inline(Vec<i32>),
    /// V32 single signature index stored in place
    Single(i32),
    /// V32 block of `count` entries in the node ranked signature index list
    Indirect { first: u32, count: u32 },
}

/// Everything stored for one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub position: i16,
    pub next_character_position: i16,
    pub parent_offset: i32,
    pub character_string_offset: i32,
    pub children: Vec<NodeIndex>,
    pub numeric_children: Vec<NodeNumericIndex>,
    pub ranked_signature_indexes: Vec<i32>,
    /// V32 only: first entry in the node ranked signature index list when
    /// there is more than one ranked signature
    pub ranked_signature_block: i32,
}

/// Trait for handling different node format versions
pub trait NodeFormat: Send + Sync + fmt::Debug {
    fn version(&self) -> u16;

    /// Size of the node header including the ranked signature count
    fn fixed_header_size(&self) -> u64;

    /// Size of one entry in the children block
    fn child_size(&self) -> u64;

    fn read_ranked_count(&self, reader: &mut Reader) -> Result<u32>;

    fn write_ranked_count(&self, count: u32, out: &mut Vec<u8>);

    fn read_child(&self, reader: &mut Reader) -> Result<NodeIndex>;

    fn write_child(&self, child: &NodeIndex, out: &mut Vec<u8>);

    /// Bytes taken by the ranked signature block
    fn ranked_block_size(&self, count: u32) -> u64;

    fn read_ranked_block(&self, reader: &mut Reader, count: u32) -> Result<RankedBlock>;

    fn write_ranked_block(&self, record: &NodeRecord, out: &mut Vec<u8>);

    fn read_header(&self, reader: &mut Reader) -> Result<NodeHeader> {
        let position = reader.read_i16()?;
        let next_character_position = reader.read_i16()?;
        let parent_offset = reader.read_i32()?;
        let character_string_offset = reader.read_i32()?;
        let children_count = reader.read_count_i16("node children")?;
        let numeric_children_count = reader.read_count_i16("node numeric children")?;
        let ranked_signature_count = self.read_ranked_count(reader)?;

        Ok(NodeHeader {
            position,
            next_character_position,
            parent_offset,
            character_string_offset,
            children_count,
            numeric_children_count,
            ranked_signature_count,
        })
    }

    fn children_size(&self, children_count: u32) -> u64 {
        children_count as u64 * self.child_size()
    }

    /// Offset of the ranked signature block from the end of the children block
    fn ranked_block_offset(&self, numeric_children_count: u32) -> u64 {
        numeric_children_count as u64 * NODE_NUMERIC_INDEX_SIZE
    }

    fn record_length(&self, header: &NodeHeader) -> u64 {
        self.fixed_header_size()
            + self.children_size(header.children_count)
            + self.ranked_block_offset(header.numeric_children_count)
            + self.ranked_block_size(header.ranked_signature_count)
    }

    fn serialize_node(&self, record: &NodeRecord) -> Vec<u8> {
        let header = NodeHeader {
            position: record.position,
            next_character_position: record.next_character_position,
            parent_offset: record.parent_offset,
            character_string_offset: record.character_string_offset,
            children_count: record.children.len() as u32,
            numeric_children_count: record.numeric_children.len() as u32,
            ranked_signature_count: record.ranked_signature_indexes.len() as u32,
        };
        let mut data = Vec::with_capacity(self.record_length(&header) as usize);

        data.extend_from_slice(&record.position.to_le_bytes());
        data.extend_from_slice(&record.next_character_position.to_le_bytes());
        data.extend_from_slice(&record.parent_offset.to_le_bytes());
        data.extend_from_slice(&record.character_string_offset.to_le_bytes());
        data.extend_from_slice(&(header.children_count as i16).to_le_bytes());
        data.extend_from_slice(&(header.numeric_children_count as i16).to_le_bytes());
        self.write_ranked_count(header.ranked_signature_count, &mut data);

        for child in &record.children {
            self.write_child(child, &mut data);
        }

        for numeric in &record.numeric_children {
            data.extend_from_slice(&numeric.value.to_le_bytes());
            data.extend_from_slice(&numeric.related_node_offset.to_le_bytes());
        }

        self.write_ranked_block(record, &mut data);
        data
    }
}

/// Version 3.1 nodes: 32-bit ranked signature count, inline ranked signatures
#[derive(Debug)]
pub struct FormatV31;

impl NodeFormat for FormatV31 {
    fn version(&self) -> u16 {
        FORMAT_V31
    }

    fn fixed_header_size(&self) -> u64 {
        NODE_COMMON_HEADER_SIZE + 4
    }

    fn child_size(&self) -> u64 {
        9 // is_string(1) + value(4) + related_node_offset(4)
    }

    fn read_ranked_count(&self, reader: &mut Reader) -> Result<u32> {
        reader.read_count_i32("ranked signature")
    }

    fn write_ranked_count(&self, count: u32, out: &mut Vec<u8>) {
        out.extend_from_slice(&(count as i32).to_le_bytes());
    }

    fn read_child(&self, reader: &mut Reader) -> Result<NodeIndex> {
        let is_string = reader.read_u8()? != 0;
        let mut value = [0u8; 4];
        reader.read_exact(&mut value)?;
        let related_node_offset = reader.read_i32()?;
        Ok(NodeIndex {
            is_string,
            value,
            related_node_offset,
        })
    }

    fn write_child(&self, child: &NodeIndex, out: &mut Vec<u8>) {
        out.push(child.is_string as u8);
        out.extend_from_slice(&child.value);
        out.extend_from_slice(&child.related_node_offset.to_le_bytes());
    }

    fn ranked_block_size(&self, count: u32) -> u64 {
        count as u64 * INTEGER_SIZE
    }

    fn read_ranked_block(&self, reader: &mut Reader, count: u32) -> Result<RankedBlock> {
        if count == 0 {
            return Ok(RankedBlock::Empty);
        }
        Ok(RankedBlock::Inline(reader.read_i32_array(count as usize)?))
    }

    fn write_ranked_block(&self, record: &NodeRecord, out: &mut Vec<u8>) {
        for index in &record.ranked_signature_indexes {
            out.extend_from_slice(&index.to_le_bytes());
        }
    }
}

/// Version 3.2 nodes: 16-bit ranked signature count, packed children and
/// ranked signatures held in a shared index list
#[derive(Debug)]
pub struct FormatV32;

const V32_STRING_FLAG: u32 = 1 << 31;

impl NodeFormat for FormatV32 {
    fn version(&self) -> u16 {
        FORMAT_V32
    }

    fn fixed_header_size(&self) -> u64 {
        NODE_COMMON_HEADER_SIZE + 2
    }

    fn child_size(&self) -> u64 {
        8 // value(4) + flagged related_node_offset(4)
    }

    fn read_ranked_count(&self, reader: &mut Reader) -> Result<u32> {
        Ok(reader.read_u16()? as u32)
    }

    fn write_ranked_count(&self, count: u32, out: &mut Vec<u8>) {
        out.extend_from_slice(&(count as u16).to_le_bytes());
    }

    fn read_child(&self, reader: &mut Reader) -> Result<NodeIndex> {
        let mut value = [0u8; 4];
        reader.read_exact(&mut value)?;
        let packed = reader.read_u32()?;
        Ok(NodeIndex {
            is_string: packed & V32_STRING_FLAG != 0,
            value,
            related_node_offset: (packed & !V32_STRING_FLAG) as i32,
        })
    }

    fn write_child(&self, child: &NodeIndex, out: &mut Vec<u8>) {
        let mut packed = child.related_node_offset as u32 & !V32_STRING_FLAG;
        if child.is_string {
            packed |= V32_STRING_FLAG;
        }
        out.extend_from_slice(&child.value);
        out.extend_from_slice(&packed.to_le_bytes());
    }

    fn ranked_block_size(&self, count: u32) -> u64 {
        if count == 0 {
            0
        } else {
            INTEGER_SIZE
        }
    }

    fn read_ranked_block(&self, reader: &mut Reader, count: u32) -> Result<RankedBlock> {
        match count {
            0 => Ok(RankedBlock::Empty),
            1 => Ok(RankedBlock::Single(reader.read_i32()?)),
            _ => {
                let first = reader.read_count_i32("ranked signature block start")?;
                Ok(RankedBlock::Indirect { first, count })
            }
        }
    }

    fn write_ranked_block(&self, record: &NodeRecord, out: &mut Vec<u8>) {
        match record.ranked_signature_indexes.as_slice() {
            [] => {}
            [single] => out.extend_from_slice(&single.to_le_bytes()),
            _ => out.extend_from_slice(&record.ranked_signature_block.to_le_bytes()),
        }
    }
}

/// Factory function to get the node format handler for a data file version
pub fn get_format(version: u16) -> Result<Arc<dyn NodeFormat>> {
    match version {
        FORMAT_V31 => Ok(Arc::new(FormatV31)),
        FORMAT_V32 => Ok(Arc::new(FormatV32)),
        _ => Err(UadbError::UnsupportedVersion(version)),
    }
}

/// Fixed part of a profile record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    pub component_id: u8,
    pub profile_id: i32,
    pub value_indexes: Vec<i32>,
    pub signature_indexes: Vec<i32>,
}

impl ProfileRecord {
    pub fn length(&self) -> u64 {
        PROFILE_HEADER_SIZE
            + (self.value_indexes.len() + self.signature_indexes.len()) as u64 * INTEGER_SIZE
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.length() as usize);
        data.push(self.component_id);
        data.extend_from_slice(&self.profile_id.to_le_bytes());
        data.extend_from_slice(&(self.value_indexes.len() as i32).to_le_bytes());
        data.extend_from_slice(&(self.signature_indexes.len() as i32).to_le_bytes());
        for index in self.value_indexes.iter().chain(&self.signature_indexes) {
            data.extend_from_slice(&index.to_le_bytes());
        }
        data
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRecord {
    pub profile_offsets: Vec<i32>,
    pub node_count: i32,
    pub first_node_offset_index: i32,
    pub rank: i32,
    pub flags: u8,
}

impl SignatureRecord {
    pub fn record_length(component_count: u16) -> u64 {
        component_count as u64 * INTEGER_SIZE + SIGNATURE_FIXED_SIZE
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(Self::record_length(self.profile_offsets.len() as u16) as usize);
        for offset in &self.profile_offsets {
            data.extend_from_slice(&offset.to_le_bytes());
        }
        data.extend_from_slice(&self.node_count.to_le_bytes());
        data.extend_from_slice(&self.first_node_offset_index.to_le_bytes());
        data.extend_from_slice(&self.rank.to_le_bytes());
        data.push(self.flags);
        data
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRecord {
    pub property_index: i16,
    pub name_offset: i32,
    pub description_offset: i32,
    pub url_offset: i32,
}

impl ValueRecord {
    pub fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(VALUE_RECORD_SIZE as usize);
        data.extend_from_slice(&self.property_index.to_le_bytes());
        data.extend_from_slice(&self.name_offset.to_le_bytes());
        data.extend_from_slice(&self.description_offset.to_le_bytes());
        data.extend_from_slice(&self.url_offset.to_le_bytes());
        data
    }
}

/// Serialize a string record: i16 byte length followed by the bytes
pub fn serialize_string(value: &str) -> Vec<u8> {
    let mut data = Vec::with_capacity(STRING_LENGTH_PREFIX as usize + value.len());
    data.extend_from_slice(&(value.len() as i16).to_le_bytes());
    data.extend_from_slice(value.as_bytes());
    data
}
