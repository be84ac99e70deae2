use std::sync::Arc;

use crate::constants::{INTEGER_SIZE, PROFILE_HEADER_SIZE};
use crate::core::dataset::DataSet;
use crate::core::list::VariableEntityFactory;
use crate::error::{Result, ResultExt};
use crate::storage::format::ProfileRecord;
use crate::storage::pool::Pool;
use crate::storage::reader::Reader;

use super::{to_key, LazyField, Signature, Value};

/// A set of values for one component.
///
/// Only the 13-byte header is parsed when the profile is created. Value and
/// signature indexes are read from the pool on first access and kept.
#[derive(Debug)]
pub struct Profile {
    offset: u32,
    component_id: u8,
    profile_id: i32,
    value_count: u32,
    signature_count: u32,
    /// Stream position of the first value index
    indexes_position: u64,
    pool: Arc<Pool>,
    value_indexes: LazyField<Box<[i32]>>,
    signature_indexes: LazyField<Box<[i32]>>,
}

impl Profile {
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn component_id(&self) -> u8 {
        self.component_id
    }

    pub fn profile_id(&self) -> i32 {
        self.profile_id
    }

    pub fn value_count(&self) -> u32 {
        self.value_count
    }

    pub fn signature_count(&self) -> u32 {
        self.signature_count
    }

    /// Bytes taken by the whole record
    pub fn length(&self) -> u64 {
        PROFILE_HEADER_SIZE + (self.value_count as u64 + self.signature_count as u64) * INTEGER_SIZE
    }

    pub fn value_indexes(&self) -> Result<&[i32]> {
        self.value_indexes
            .get_or_try_init(|| self.read_indexes(self.indexes_position, self.value_count))
            .map(|indexes| &**indexes)
            .context("cannot obtain value indexes")
    }

    pub fn signature_indexes(&self) -> Result<&[i32]> {
        let position = self.indexes_position + self.value_count as u64 * INTEGER_SIZE;
        self.signature_indexes
            .get_or_try_init(|| self.read_indexes(position, self.signature_count))
            .map(|indexes| &**indexes)
            .context("cannot obtain signature indexes")
    }

    fn read_indexes(&self, position: u64, count: u32) -> Result<Box<[i32]>> {
        if count == 0 {
            return Ok(Box::default());
        }
        let mut reader = self.pool.acquire()?;
        reader.seek(position)?;
        Ok(reader.read_i32_array(count as usize)?.into_boxed_slice())
    }

    /// Values referenced by this profile, in stored order
    pub fn values(&self, dataset: &DataSet) -> Result<Vec<Arc<Value>>> {
        self.value_indexes()?
            .iter()
            .map(|&index| dataset.values().get(to_key(index, "profile value index")?))
            .collect()
    }

    pub fn signatures(&self, dataset: &DataSet) -> Result<Vec<Arc<Signature>>> {
        self.signature_indexes()?
            .iter()
            .map(|&index| {
                dataset
                    .signatures()
                    .get(to_key(index, "profile signature index")?)
            })
            .collect()
    }

    pub fn to_record(&self) -> Result<ProfileRecord> {
        Ok(ProfileRecord {
            component_id: self.component_id,
            profile_id: self.profile_id,
            value_indexes: self.value_indexes()?.to_vec(),
            signature_indexes: self.signature_indexes()?.to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.to_record()?.serialize())
    }

    #[cfg(test)]
    pub(crate) fn value_indexes_loaded(&self) -> bool {
        self.value_indexes.get().is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ProfileFactory {
    pool: Arc<Pool>,
}

impl ProfileFactory {
    pub fn new(pool: Arc<Pool>) -> Self {
        Self { pool }
    }
}

impl VariableEntityFactory for ProfileFactory {
    type Entity = Profile;

    fn create(&self, offset: u32, reader: &mut Reader) -> Result<Profile> {
        let component_id = reader.read_u8()?;
        let profile_id = reader.read_i32()?;
        let value_count = reader.read_count_i32("profile values")?;
        let signature_count = reader.read_count_i32("profile signatures")?;
        let indexes_position = reader.position()?;

        Ok(Profile {
            offset,
            component_id,
            profile_id,
            value_count,
            signature_count,
            indexes_position,
            pool: Arc::clone(&self.pool),
            value_indexes: LazyField::new(),
            signature_indexes: LazyField::new(),
        })
    }

    fn length(&self, entity: &Profile) -> u64 {
        entity.length()
    }
}
