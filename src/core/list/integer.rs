use std::sync::Arc;

use crate::constants::INTEGER_SIZE;
use crate::error::{Result, UadbError};
use crate::storage::header::Header;
use crate::storage::pool::Pool;
use crate::storage::reader::Reader;

use super::ListCore;

/// Uncached list of little-endian i32 values, used for index tables
#[derive(Debug)]
pub struct IntegerList {
    core: ListCore,
}

impl IntegerList {
    pub fn new(
        name: &'static str,
        reader: &mut Reader,
        pool: Arc<Pool>,
        source_len: u64,
    ) -> Result<Self> {
        let core = ListCore::read(name, reader, pool, source_len)?;
        core.header().validate_fixed(name, INTEGER_SIZE)?;
        Ok(Self { core })
    }

    pub fn name(&self) -> &'static str {
        self.core.name()
    }

    pub fn header(&self) -> &Header {
        self.core.header()
    }

    pub fn count(&self) -> u32 {
        self.core.header().count
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn get(&self, index: u32) -> Result<i32> {
        if index >= self.count() {
            return Err(UadbError::IndexOutOfRange {
                list: self.name(),
                index,
                count: self.count(),
            });
        }
        self.core
            .read_at(index as u64 * INTEGER_SIZE, |reader| reader.read_i32())
    }

    /// Read `count` consecutive values starting at `index` in one pass
    pub fn get_range(&self, index: u32, count: u32) -> Result<Vec<i32>> {
        let end = index.checked_add(count).filter(|&end| end <= self.count());
        if end.is_none() {
            return Err(UadbError::IndexOutOfRange {
                list: self.name(),
                index: index.saturating_add(count),
                count: self.count(),
            });
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        self.core.read_at(index as u64 * INTEGER_SIZE, |reader| {
            reader.read_i32_array(count as usize)
        })
    }
}
