use bytes::Bytes;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::core::entities::{
    NodeContext, NodeFactory, ProfileFactory, SignatureFactory, StringFactory, ValueFactory,
};
use crate::core::list::{FixedCacheList, IntegerList, VariableList};
use crate::error::Result;
use crate::storage::format::get_format;
use crate::storage::metadata::Metadata;
use crate::storage::mmap::MappedSource;
use crate::storage::pool::Pool;
use crate::storage::source::{FileSource, MemorySource, Source};

use super::{CacheSizes, DataSet, DataSetConfig, SourceConfig};

impl DataSet {
    /// Open a data file with default cache sizes
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(DataSetConfig::new(SourceConfig::File {
            path: path.as_ref().to_path_buf(),
            temporary: false,
        }))
    }

    /// Memory-map a data file with default cache sizes
    pub fn open_mapped(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(DataSetConfig::new(SourceConfig::Mapped {
            path: path.as_ref().to_path_buf(),
        }))
    }

    /// Read a data set held in memory with default cache sizes
    pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self> {
        Self::with_config(DataSetConfig::new(SourceConfig::Memory(data.into())))
    }

    /// Open a data set from an explicit configuration.
    ///
    /// The preamble and all eight list headers are read here; entity records are
    /// only read when first requested.
    pub fn with_config(config: DataSetConfig) -> Result<Self> {
        config.cache_sizes.validate()?;

        let source: Arc<dyn Source> = match config.source {
            SourceConfig::File { path, temporary } => Arc::new(FileSource::open(path, temporary)?),
            SourceConfig::Memory(data) => Arc::new(MemorySource::new(data)),
            SourceConfig::Mapped { path } => Arc::new(MappedSource::open(path)?),
        };
        Self::with_source(source, config.cache_sizes)
    }

    /// Open a data set over any [`Source`] implementation
    pub fn with_source(source: Arc<dyn Source>, sizes: CacheSizes) -> Result<Self> {
        sizes.validate()?;
        let source_len = source.len();
        let pool = Arc::new(Pool::new(Arc::clone(&source)));

        let mut reader = pool.acquire()?;
        let metadata = Metadata::read(&mut reader)?;
        let format = get_format(metadata.version)?;

        let strings = VariableList::new(
            "strings",
            &mut reader,
            Arc::clone(&pool),
            source_len,
            StringFactory,
            sizes.strings,
        )?;
        let values = FixedCacheList::new(
            "values",
            &mut reader,
            Arc::clone(&pool),
            source_len,
            ValueFactory,
            sizes.values,
        )?;
        let profiles = VariableList::new(
            "profiles",
            &mut reader,
            Arc::clone(&pool),
            source_len,
            ProfileFactory::new(Arc::clone(&pool)),
            sizes.profiles,
        )?;
        let signatures = FixedCacheList::new(
            "signatures",
            &mut reader,
            Arc::clone(&pool),
            source_len,
            SignatureFactory::new(metadata.component_count),
            sizes.signatures,
        )?;
        let signature_node_offsets = IntegerList::new(
            "signature_node_offsets",
            &mut reader,
            Arc::clone(&pool),
            source_len,
        )?;
        let node_ranked_signature_indexes = Arc::new(IntegerList::new(
            "node_ranked_signature_indexes",
            &mut reader,
            Arc::clone(&pool),
            source_len,
        )?);
        let ranked_signature_indexes = IntegerList::new(
            "ranked_signature_indexes",
            &mut reader,
            Arc::clone(&pool),
            source_len,
        )?;
        let node_context = NodeContext::new(
            Arc::clone(&pool),
            Arc::clone(&format),
            Arc::clone(&node_ranked_signature_indexes),
        );
        let nodes = VariableList::new(
            "nodes",
            &mut reader,
            Arc::clone(&pool),
            source_len,
            NodeFactory::new(Arc::new(node_context)),
            sizes.nodes,
        )?;
        drop(reader);

        tracing::info!(
            medium = source.kind(),
            version = metadata.version,
            components = metadata.component_count,
            strings = strings.count(),
            values = values.count(),
            profiles = profiles.count(),
            signatures = signatures.count(),
            nodes = nodes.count(),
            "opened data set"
        );

        Ok(Self {
            metadata,
            format,
            source,
            pool,
            strings,
            values,
            profiles,
            signatures,
            signature_node_offsets,
            node_ranked_signature_indexes,
            ranked_signature_indexes,
            nodes,
            disposed: AtomicBool::new(false),
        })
    }
}
