use std::fmt;
use std::sync::Arc;

use crate::core::cache::Cache;
use crate::error::{Result, UadbError};
use crate::stats::CacheSnapshot;
use crate::storage::header::Header;
use crate::storage::pool::{Pool, PooledReader};
use crate::storage::reader::Reader;

use super::{FixedEntityFactory, ListCore};

/// Uncached list of constant-size records addressed by index.
///
/// Factories must consume exactly `record_length` bytes per record so that ranges can
/// be read sequentially after a single seek.
pub struct FixedList<F: FixedEntityFactory> {
    core: ListCore,
    factory: F,
}

impl<F: FixedEntityFactory> fmt::Debug for FixedList<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedList")
            .field("name", &self.core.name())
            .field("header", self.core.header())
            .field("record_length", &self.factory.record_length())
            .finish()
    }
}

impl<F: FixedEntityFactory> FixedList<F> {
    /// Read the list header from the reader's current position
    pub fn new(
        name: &'static str,
        reader: &mut Reader,
        pool: Arc<Pool>,
        source_len: u64,
        factory: F,
    ) -> Result<Self> {
        let core = ListCore::read(name, reader, pool, source_len)?;
        core.header().validate_fixed(name, factory.record_length())?;
        Ok(Self { core, factory })
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

    pub fn factory(&self) -> &F {
        &self.factory
    }

    fn check_index(&self, index: u32) -> Result<()> {
        if index >= self.count() {
            return Err(UadbError::IndexOutOfRange {
                list: self.name(),
                index,
                count: self.count(),
            });
        }
        Ok(())
    }

    fn relative_position(&self, index: u32) -> u64 {
        index as u64 * self.factory.record_length()
    }

    /// Parse the record at `index`. Every call reads the data source.
    pub fn load(&self, index: u32) -> Result<F::Entity> {
        self.check_index(index)?;
        self.core
            .read_at(self.relative_position(index), |reader| {
                self.factory.create(index, reader)
            })
    }

    /// Parse the record at `index` into a fresh shared entity
    pub fn get(&self, index: u32) -> Result<Arc<F::Entity>> {
        self.load(index).map(Arc::new)
    }

    /// Lazily parse `count` consecutive records starting at `index`.
    ///
    /// The range checks out one reader on its first item and holds it until the
    /// range is exhausted or dropped.
    pub fn get_range(&self, index: u32, count: u32) -> Result<FixedRange<'_, F>> {
        let end = index.checked_add(count).filter(|&end| end <= self.count());
        let Some(end) = end else {
            return Err(UadbError::IndexOutOfRange {
                list: self.name(),
                index: index.saturating_add(count),
                count: self.count(),
            });
        };

        Ok(FixedRange {
            list: self,
            next: index,
            end,
            reader: None,
        })
    }

    /// Iterate every record in the list
    pub fn iter(&self) -> FixedRange<'_, F> {
        FixedRange {
            list: self,
            next: 0,
            end: self.count(),
            reader: None,
        }
    }
}

/// Forward-only sequence of records from a [`FixedList`]
pub struct FixedRange<'a, F: FixedEntityFactory> {
    list: &'a FixedList<F>,
    next: u32,
    end: u32,
    reader: Option<PooledReader<'a>>,
}

impl<F: FixedEntityFactory> FixedRange<'_, F> {
    fn read_next(&mut self) -> Result<F::Entity> {
        let reader = match self.reader.take() {
            Some(reader) => reader,
            None => {
                let mut reader = self.list.core.pool().acquire()?;
                reader.seek(
                    self.list.core.header().start_position
                        + self.list.relative_position(self.next),
                )?;
                reader
            }
        };
        let reader = self.reader.insert(reader);
        self.list.factory.create(self.next, &mut **reader)
    }
}

impl<F: FixedEntityFactory> Iterator for FixedRange<'_, F> {
    type Item = Result<F::Entity>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            // Hand the reader back as soon as the range is done
            self.reader = None;
            return None;
        }

        let item = self.read_next();
        match item {
            Ok(_) => self.next += 1,
            Err(_) => {
                // The stream position is unknown after a failed parse
                self.next = self.end;
                self.reader = None;
            }
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end - self.next) as usize;
        (remaining, Some(remaining))
    }
}

/// Fixed list decorated with a generational cache
pub struct FixedCacheList<F: FixedEntityFactory> {
    list: FixedList<F>,
    cache: Cache<u32, F::Entity>,
}

impl<F: FixedEntityFactory> fmt::Debug for FixedCacheList<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedCacheList")
            .field("list", &self.list)
            .field("cache", &self.cache)
            .finish()
    }
}

impl<F: FixedEntityFactory> FixedCacheList<F> {
    pub fn new(
        name: &'static str,
        reader: &mut Reader,
        pool: Arc<Pool>,
        source_len: u64,
        factory: F,
        cache_size: usize,
    ) -> Result<Self> {
        Ok(Self {
            list: FixedList::new(name, reader, pool, source_len, factory)?,
            cache: Cache::new(cache_size),
        })
    }

    pub fn get(&self, index: u32) -> Result<Arc<F::Entity>> {
        // Out-of-range keys must not reach the miss counter
        self.list.check_index(index)?;
        self.cache.get_or_load(index, |i| self.list.load(i))
    }

    /// Uncached sequential scan; see [`FixedList::get_range`]
    pub fn get_range(&self, index: u32, count: u32) -> Result<FixedRange<'_, F>> {
        self.list.get_range(index, count)
    }

    pub fn iter(&self) -> FixedRange<'_, F> {
        self.list.iter()
    }

    pub fn count(&self) -> u32 {
        self.list.count()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn header(&self) -> &Header {
        self.list.header()
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
