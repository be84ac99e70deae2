//! Typed read-only views over regions of the data file.
//!
//! Index-addressed lists ([`FixedList`], [`FixedCacheList`], [`IntegerList`]) hold
//! constant-size records; record `i` starts at `start_position + i * record_length`.
//! Offset-addressed lists ([`VariableList`]) hold self-describing records keyed by
//! their byte offset from `start_position`.

use std::sync::Arc;

use crate::error::Result;
use crate::storage::header::Header;
use crate::storage::pool::Pool;
use crate::storage::reader::Reader;

pub mod fixed;
pub mod integer;
pub mod variable;

pub use self::fixed::{FixedCacheList, FixedList, FixedRange};
pub use self::integer::IntegerList;
pub use self::variable::{VariableList, VariableRange};

/// Builds entities from fixed-length records
pub trait FixedEntityFactory: Send + Sync {
    type Entity: Send + Sync;

    /// Size of one record in bytes
    fn record_length(&self) -> u64;

    /// Parse the record at `index`; the reader is positioned at its first byte
    fn create(&self, index: u32, reader: &mut Reader) -> Result<Self::Entity>;
}

/// Builds entities from variable-length records
pub trait VariableEntityFactory: Send + Sync {
    type Entity: Send + Sync;

    /// Parse the record at `offset`; the reader is positioned at its first byte
    fn create(&self, offset: u32, reader: &mut Reader) -> Result<Self::Entity>;

    /// Bytes taken by the entity's record, used to find the next record
    fn length(&self, entity: &Self::Entity) -> u64;
}

/// Header and pool shared by every list kind
#[derive(Debug)]
pub struct ListCore {
    name: &'static str,
    header: Header,
    pool: Arc<Pool>,
}

impl ListCore {
    /// Read the list header from the reader's current position
    pub fn read(
        name: &'static str,
        reader: &mut Reader,
        pool: Arc<Pool>,
        source_len: u64,
    ) -> Result<Self> {
        let header = Header::read(name, reader)?;
        header.validate(name, source_len)?;
        Ok(Self { name, header, pool })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn pool(&self) -> &Arc<Pool> {
        &self.pool
    }

    /// Acquire a reader, seek to `start_position + relative`, run `parse`, release.
    pub fn read_at<T, F>(&self, relative: u64, parse: F) -> Result<T>
    where
        F: FnOnce(&mut Reader) -> Result<T>,
    {
        let mut reader = self.pool.acquire()?;
        reader.seek(self.header.start_position + relative)?;
        parse(&mut *reader)
    }
}
