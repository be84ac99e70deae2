use bytes::Bytes;
use std::path::PathBuf;

use crate::constants::*;
use crate::error::{Result, UadbError};

use super::DataSet;

/// Medium the data set is read from
#[derive(Debug, Clone)]
pub enum SourceConfig {
    /// Plain file read through one OS handle per reader. A temporary file is
    /// deleted when the data set is disposed.
    File { path: PathBuf, temporary: bool },
    /// Data already held in memory
    Memory(Bytes),
    /// Memory-mapped file, shared with other data sets opened on the same file
    Mapped { path: PathBuf },
}

/// Cache capacity for each cached list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSizes {
    pub strings: usize,
    pub nodes: usize,
    pub values: usize,
    pub profiles: usize,
    pub signatures: usize,
}

impl Default for CacheSizes {
    fn default() -> Self {
        Self {
            strings: DEFAULT_STRINGS_CACHE,
            nodes: DEFAULT_NODES_CACHE,
            values: DEFAULT_VALUES_CACHE,
            profiles: DEFAULT_PROFILES_CACHE,
            signatures: DEFAULT_SIGNATURES_CACHE,
        }
    }
}

impl CacheSizes {
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("strings", self.strings),
            ("nodes", self.nodes),
            ("values", self.values),
            ("profiles", self.profiles),
            ("signatures", self.signatures),
        ];
        for (list, size) in sizes {
            if size == 0 {
                return Err(UadbError::InvalidConfig(format!(
                    "{} cache size must be at least 1",
                    list
                )));
            }
        }
        Ok(())
    }
}

/// Configuration options for [`DataSet`].
///
/// Use `DataSetBuilder` for a more ergonomic way to configure the data set.
#[derive(Debug, Clone)]
pub struct DataSetConfig {
    pub source: SourceConfig,
    pub cache_sizes: CacheSizes,
}

impl DataSetConfig {
    pub fn new(source: SourceConfig) -> Self {
        Self {
            source,
            cache_sizes: CacheSizes::default(),
        }
    }
}

/// Builder for opening a [`DataSet`] with custom configuration.
///
/// # Example
///
/// ```rust,no_run
/// use uadb::DataSet;
///
/// # fn main() -> uadb::Result<()> {
/// let dataset = DataSet::builder()
///     .mapped("device-data.dat")
///     .nodes_cache(50_000)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct DataSetBuilder {
    source: Option<SourceConfig>,
    temporary: bool,
    cache_sizes: CacheSizes,
}

impl DataSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read from a plain file
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(SourceConfig::File {
            path: path.into(),
            temporary: false,
        });
        self
    }

    /// Read from a memory-mapped file
    pub fn mapped(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(SourceConfig::Mapped { path: path.into() });
        self
    }

    /// Read from bytes already in memory
    pub fn memory(mut self, data: impl Into<Bytes>) -> Self {
        self.source = Some(SourceConfig::Memory(data.into()));
        self
    }

    /// Delete the file when the data set is disposed.
    ///
    /// Only valid together with [`file`](Self::file). Files with a `.tmp`
    /// extension are treated as temporary regardless.
    pub fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    pub fn strings_cache(mut self, size: usize) -> Self {
        self.cache_sizes.strings = size;
        self
    }

    pub fn nodes_cache(mut self, size: usize) -> Self {
        self.cache_sizes.nodes = size;
        self
    }

    pub fn values_cache(mut self, size: usize) -> Self {
        self.cache_sizes.values = size;
        self
    }

    pub fn profiles_cache(mut self, size: usize) -> Self {
        self.cache_sizes.profiles = size;
        self
    }

    pub fn signatures_cache(mut self, size: usize) -> Self {
        self.cache_sizes.signatures = size;
        self
    }

    /// Replace every cache capacity at once
    pub fn cache_sizes(mut self, sizes: CacheSizes) -> Self {
        self.cache_sizes = sizes;
        self
    }

    /// Validate the configuration without opening anything
    pub fn into_config(self) -> Result<DataSetConfig> {
        let source = match self.source {
            Some(SourceConfig::File { path, .. }) => SourceConfig::File {
                path,
                temporary: self.temporary,
            },
            Some(_) if self.temporary => {
                return Err(UadbError::InvalidConfig(
                    "only file sources can be temporary".to_string(),
                ))
            }
            Some(source) => source,
            None => {
                return Err(UadbError::InvalidConfig(
                    "no data source configured".to_string(),
                ))
            }
        };
        self.cache_sizes.validate()?;

        Ok(DataSetConfig {
            source,
            cache_sizes: self.cache_sizes,
        })
    }

    /// Open the DataSet
    pub fn build(self) -> Result<DataSet> {
        DataSet::with_config(self.into_config()?)
    }
}
