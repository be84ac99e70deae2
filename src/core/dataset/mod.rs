use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::entities::{
    NodeFactory, ProfileFactory, SignatureFactory, StringFactory, ValueFactory,
};
use crate::core::list::{FixedCacheList, IntegerList, VariableList};
use crate::stats::DataSetStats;
use crate::storage::format::NodeFormat;
use crate::storage::metadata::Metadata;
use crate::storage::pool::Pool;
use crate::storage::source::Source;

// Re-export public types
pub use self::builder::{CacheSizes, DataSetBuilder, DataSetConfig, SourceConfig};

pub mod builder;
pub mod init;

/// Read-only device detection data set.
///
/// `DataSet` owns the storage medium, the reader pool and the eight lists stored in
/// the data file. Entities are read on demand and kept in per-list caches.
///
/// # Thread Safety
///
/// All methods take `&self` and may be called concurrently. Share the data set
/// between threads with `Arc`.
///
/// # Disposal
///
/// [`dispose`](Self::dispose) closes idle readers and releases the medium,
/// deleting temporary files. It runs automatically on drop. Entities obtained
/// before disposal keep their loaded fields but fail with
/// [`UadbError::Disposed`](crate::UadbError::Disposed) when asked to load more.
pub struct DataSet {
    metadata: Metadata,
    format: Arc<dyn NodeFormat>,
    source: Arc<dyn Source>,
    pool: Arc<Pool>,

    strings: VariableList<StringFactory>,
    values: FixedCacheList<ValueFactory>,
    profiles: VariableList<ProfileFactory>,
    signatures: FixedCacheList<SignatureFactory>,
    signature_node_offsets: IntegerList,
    node_ranked_signature_indexes: Arc<IntegerList>,
    ranked_signature_indexes: IntegerList,
    nodes: VariableList<NodeFactory>,

    disposed: AtomicBool,
}

impl fmt::Debug for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSet")
            .field("metadata", &self.metadata)
            .field("source", &self.source)
            .field("pool", &self.pool)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

impl DataSet {
    /// Create a builder for configuring a DataSet.
    pub fn builder() -> DataSetBuilder {
        DataSetBuilder::new()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Node format version of the data file
    pub fn version(&self) -> u16 {
        self.metadata.version
    }

    pub fn component_count(&self) -> u16 {
        self.metadata.component_count
    }

    pub fn format(&self) -> &dyn NodeFormat {
        self.format.as_ref()
    }

    pub fn source(&self) -> &dyn Source {
        self.source.as_ref()
    }

    pub fn pool(&self) -> &Arc<Pool> {
        &self.pool
    }

    pub fn strings(&self) -> &VariableList<StringFactory> {
        &self.strings
    }

    pub fn values(&self) -> &FixedCacheList<ValueFactory> {
        &self.values
    }

    pub fn profiles(&self) -> &VariableList<ProfileFactory> {
        &self.profiles
    }

    pub fn signatures(&self) -> &FixedCacheList<SignatureFactory> {
        &self.signatures
    }

    pub fn signature_node_offsets(&self) -> &IntegerList {
        &self.signature_node_offsets
    }

    pub fn node_ranked_signature_indexes(&self) -> &IntegerList {
        &self.node_ranked_signature_indexes
    }

    pub fn ranked_signature_indexes(&self) -> &IntegerList {
        &self.ranked_signature_indexes
    }

    pub fn nodes(&self) -> &VariableList<NodeFactory> {
        &self.nodes
    }

    /// Empty every cache and zero its counters
    pub fn reset_cache(&self) {
        self.strings.reset_cache();
        self.nodes.reset_cache();
        self.values.reset_cache();
        self.profiles.reset_cache();
        self.signatures.reset_cache();
    }

    /// Get current cache and reader pool statistics
    pub fn stats(&self) -> DataSetStats {
        DataSetStats {
            strings: self.strings.cache_stats(),
            nodes: self.nodes.cache_stats(),
            values: self.values.cache_stats(),
            profiles: self.profiles.cache_stats(),
            signatures: self.signatures.cache_stats(),
            readers_created: self.pool.readers_created(),
            readers_queued: self.pool.readers_queued(),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Release the medium. Calling this more than once has no further effect.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.pool.dispose();
        tracing::debug!(medium = self.source.kind(), "disposed data set");
    }
}

impl Drop for DataSet {
    fn drop(&mut self) {
        self.dispose();
    }
}
