use std::fmt;

use crate::constants::STRING_LENGTH_PREFIX;
use crate::core::list::VariableEntityFactory;
use crate::error::{Result, UadbError};
use crate::storage::format::serialize_string;
use crate::storage::reader::Reader;

/// ASCII string from the strings list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiString {
    offset: u32,
    value: String,
}

impl AsciiString {
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serialize_string(&self.value)
    }
}

impl fmt::Display for AsciiString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl AsRef<str> for AsciiString {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StringFactory;

impl VariableEntityFactory for StringFactory {
    type Entity = AsciiString;

    fn create(&self, offset: u32, reader: &mut Reader) -> Result<AsciiString> {
        let len = reader.read_count_i16("string length")?;
        let bytes = reader.read_bytes(len as usize)?;
        if !bytes.is_ascii() {
            return Err(UadbError::InvalidString(offset));
        }
        let value = String::from_utf8(bytes).map_err(|_| UadbError::InvalidString(offset))?;
        Ok(AsciiString { offset, value })
    }

    fn length(&self, entity: &AsciiString) -> u64 {
        STRING_LENGTH_PREFIX + entity.value.len() as u64
    }
}
