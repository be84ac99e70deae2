use crate::constants::*;
use crate::error::{Result, UadbError};
use crate::storage::reader::Reader;

/// Data file preamble preceding the list header table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub signature: [u8; UADB_SIGNATURE_SIZE],
    pub version: u16,
    pub component_count: u16,
    pub list_count: u32,
}

impl Metadata {
    pub fn new(version: u16, component_count: u16) -> Self {
        Self {
            signature: *UADB_SIGNATURE,
            version,
            component_count,
            list_count: LIST_COUNT,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.signature != *UADB_SIGNATURE {
            return Err(UadbError::InvalidSignature);
        }

        if self.version != FORMAT_V31 && self.version != FORMAT_V32 {
            return Err(UadbError::UnsupportedVersion(self.version));
        }

        if self.list_count != LIST_COUNT {
            return Err(UadbError::InvalidHeader {
                list: "metadata",
                reason: format!("expected {} lists, found {}", LIST_COUNT, self.list_count),
            });
        }

        Ok(())
    }

    pub fn read(reader: &mut Reader) -> Result<Self> {
        let mut signature = [0u8; UADB_SIGNATURE_SIZE];
        reader.read_exact(&mut signature)?;

        let metadata = Self {
            signature,
            version: reader.read_u16()?,
            component_count: reader.read_u16()?,
            list_count: reader.read_u32()?,
        };

        metadata.validate()?;
        Ok(metadata)
    }

    pub fn to_bytes(&self) -> [u8; METADATA_SIZE] {
        let mut bytes = [0u8; METADATA_SIZE];
        bytes[..8].copy_from_slice(&self.signature);
        bytes[8..10].copy_from_slice(&self.version.to_le_bytes());
        bytes[10..12].copy_from_slice(&self.component_count.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.list_count.to_le_bytes());
        bytes
    }
}
