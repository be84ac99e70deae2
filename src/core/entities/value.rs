use std::sync::Arc;

use crate::constants::VALUE_RECORD_SIZE;
use crate::core::dataset::DataSet;
use crate::core::list::FixedEntityFactory;
use crate::error::Result;
use crate::storage::format::ValueRecord;
use crate::storage::reader::Reader;

use super::{to_key, AsciiString};

/// A property value. Text is held in the strings list and resolved on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    index: u32,
    record: ValueRecord,
}

impl Value {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn property_index(&self) -> i16 {
        self.record.property_index
    }

    pub fn name_offset(&self) -> i32 {
        self.record.name_offset
    }

    pub fn name(&self, dataset: &DataSet) -> Result<Arc<AsciiString>> {
        dataset
            .strings()
            .get(to_key(self.record.name_offset, "value name offset")?)
    }

    pub fn description(&self, dataset: &DataSet) -> Result<Option<Arc<AsciiString>>> {
        optional_string(dataset, self.record.description_offset)
    }

    pub fn url(&self, dataset: &DataSet) -> Result<Option<Arc<AsciiString>>> {
        optional_string(dataset, self.record.url_offset)
    }

    pub fn to_record(&self) -> ValueRecord {
        self.record
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.record.serialize()
    }
}

fn optional_string(dataset: &DataSet, offset: i32) -> Result<Option<Arc<AsciiString>>> {
    if offset < 0 {
        return Ok(None);
    }
    dataset.strings().get(offset as u32).map(Some)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValueFactory;

impl FixedEntityFactory for ValueFactory {
    type Entity = Value;

    fn record_length(&self) -> u64 {
        VALUE_RECORD_SIZE
    }

    fn create(&self, index: u32, reader: &mut Reader) -> Result<Value> {
        let record = ValueRecord {
            property_index: reader.read_i16()?,
            name_offset: reader.read_i32()?,
            description_offset: reader.read_i32()?,
            url_offset: reader.read_i32()?,
        };
        Ok(Value { index, record })
    }
}
