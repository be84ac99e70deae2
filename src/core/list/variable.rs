use std::fmt;
use std::sync::Arc;

use crate::core::cache::Cache;
use crate::error::{Result, ResultExt, UadbError};
use crate::stats::CacheSnapshot;
use crate::storage::header::Header;
use crate::storage::pool::{Pool, PooledReader};
use crate::storage::reader::Reader;

use super::{ListCore, VariableEntityFactory};

/// Cached list of variable-length records addressed by byte offset
pub struct VariableList<F: VariableEntityFactory> {
    core: ListCore,
    factory: F,
    cache: Cache<u32, F::Entity>,
}

impl<F: VariableEntityFactory> fmt::Debug for VariableList<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableList")
            .field("name", &self.core.name())
            .field("header", self.core.header())
            .field("cache", &self.cache)
            .finish()
    }
}

impl<F: VariableEntityFactory> VariableList<F> {
    /// Read the list header from the reader's current position
    pub fn new(
        name: &'static str,
        reader: &mut Reader,
        pool: Arc<Pool>,
        source_len: u64,
        factory: F,
        cache_size: usize,
    ) -> Result<Self> {
        Ok(Self {
            core: ListCore::read(name, reader, pool, source_len)?,
            factory,
            cache: Cache::new(cache_size),
        })
    }

    pub fn name(&self) -> &'static str {
        self.core.name()
    }

    pub fn header(&self) -> &Header {
        self.core.header()
    }

    /// Number of records declared by the header
    pub fn count(&self) -> u32 {
        self.core.header().count
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Total bytes taken by the list's records
    pub fn length(&self) -> u64 {
        self.core.header().length
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    fn check_offset(&self, offset: u32) -> Result<()> {
        if offset as u64 >= self.length() {
            return Err(UadbError::OffsetOutOfRange {
                list: self.name(),
                offset,
                length: self.length(),
            });
        }
        Ok(())
    }

    /// Parse one record and reject it when its counts run past the list region
    fn create(&self, offset: u32, reader: &mut Reader) -> Result<F::Entity> {
        let entity = self.factory.create(offset, reader)?;
        let length = self.factory.length(&entity);
        if offset as u64 + length > self.length() {
            return Err(UadbError::ImpossibleCount {
                what: "record length",
                count: length as i64,
            })
            .context("record extends past the end of its list");
        }
        Ok(entity)
    }

    /// Parse the record at `offset` without consulting the cache
    pub fn load(&self, offset: u32) -> Result<F::Entity> {
        self.check_offset(offset)?;
        self.core
            .read_at(offset as u64, |reader| self.create(offset, reader))
    }

    /// Entity at `offset`, served from the cache when possible
    pub fn get(&self, offset: u32) -> Result<Arc<F::Entity>> {
        self.check_offset(offset)?;
        self.cache.get_or_load(offset, |o| {
            self.core.read_at(o as u64, |reader| self.create(o, reader))
        })
    }

    /// Enumerate every record from offset 0 up to the declared length.
    /// Records are parsed fresh and not cached.
    pub fn iter(&self) -> VariableRange<'_, F> {
        VariableRange {
            list: self,
            offset: 0,
            reader: None,
            done: false,
        }
    }

    pub fn cache(&self) -> &Cache<u32, F::Entity> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheSnapshot {
        self.cache.stats()
    }

    pub fn reset_cache(&self) {
        self.cache.reset();
    }
}

/// Forward-only sequence of `(offset, entity)` pairs from a [`VariableList`]
pub struct VariableRange<'a, F: VariableEntityFactory> {
    list: &'a VariableList<F>,
    offset: u64,
    reader: Option<PooledReader<'a>>,
    done: bool,
}

impl<F: VariableEntityFactory> VariableRange<'_, F> {
    fn read_next(&mut self) -> Result<(u32, F::Entity)> {
        let reader = match self.reader.take() {
            Some(reader) => reader,
            None => self.list.core.pool().acquire()?,
        };
        let reader = self.reader.insert(reader);

        // Lazy entities leave the reader short of the record end, so seek every time
        let offset = u32::try_from(self.offset).map_err(|_| UadbError::OffsetOutOfRange {
            list: self.list.name(),
            offset: u32::MAX,
            length: self.list.length(),
        })?;
        reader.seek(self.list.core.header().start_position + self.offset)?;
        let entity = self.list.create(offset, &mut **reader)?;

        let length = self.list.factory.length(&entity);
        if length == 0 {
            return Err(UadbError::ImpossibleCount {
                what: "record length",
                count: 0,
            });
        }
        self.offset += length;
        Ok((offset, entity))
    }
}

impl<F: VariableEntityFactory> Iterator for VariableRange<'_, F> {
    type Item = Result<(u32, F::Entity)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.list.length() {
            self.reader = None;
            return None;
        }

        let item = self.read_next();
        if item.is_err() {
            self.done = true;
            self.reader = None;
        }
        Some(item)
    }
}
