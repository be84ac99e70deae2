use crate::constants::*;
use crate::error::{Result, UadbError};
use crate::storage::reader::Reader;

/// Location and size of one list within the data file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub count: u32,
    pub start_position: u64,
    pub length: u64,
}

impl Header {
    pub fn new(count: u32, start_position: u64, length: u64) -> Self {
        Self {
            count,
            start_position,
            length,
        }
    }

    /// Read a header from the reader's current position
    pub fn read(list: &'static str, reader: &mut Reader) -> Result<Self> {
        let count = reader.read_i32()?;
        let start_position = reader.read_i64()?;
        let length = reader.read_i64()?;

        let invalid = |reason: String| UadbError::InvalidHeader { list, reason };

        let count = u32::try_from(count).map_err(|_| invalid(format!("negative count {count}")))?;
        let start_position = u64::try_from(start_position)
            .map_err(|_| invalid(format!("negative start position {start_position}")))?;
        let length =
            u64::try_from(length).map_err(|_| invalid(format!("negative length {length}")))?;

        Ok(Self {
            count,
            start_position,
            length,
        })
    }

    /// Check the list region lies inside a medium of `source_len` bytes
    pub fn validate(&self, list: &'static str, source_len: u64) -> Result<()> {
        let end = self.start_position.checked_add(self.length);
        match end {
            Some(end) if end <= source_len => Ok(()),
            _ => Err(UadbError::InvalidHeader {
                list,
                reason: format!(
                    "region {}+{} exceeds data of {} bytes",
                    self.start_position, self.length, source_len
                ),
            }),
        }
    }

    /// Check a fixed-length list fits its declared length
    pub fn validate_fixed(&self, list: &'static str, record_length: u64) -> Result<()> {
        let needed = self.count as u64 * record_length;
        if needed > self.length {
            return Err(UadbError::InvalidHeader {
                list,
                reason: format!(
                    "{} records of {} bytes need {} bytes, header declares {}",
                    self.count, record_length, needed, self.length
                ),
            });
        }
        Ok(())
    }

    pub fn end_position(&self) -> u64 {
        self.start_position + self.length
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.count as i32).to_le_bytes());
        out.extend_from_slice(&(self.start_position as i64).to_le_bytes());
        out.extend_from_slice(&(self.length as i64).to_le_bytes());
    }

    pub fn to_bytes(&self) -> [u8; LIST_HEADER_SIZE] {
        let mut out = Vec::with_capacity(LIST_HEADER_SIZE);
        self.write(&mut out);
        let mut bytes = [0u8; LIST_HEADER_SIZE];
        bytes.copy_from_slice(&out);
        bytes
    }
}
