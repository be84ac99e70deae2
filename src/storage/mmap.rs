//! Memory-mapped data source.
//!
//! A file is mapped at most once per process: mappings are registered under a name
//! derived from the canonical path, length and modification time, and a later open
//! of the same file attaches to the live mapping instead of creating another one.

use memmap2::Mmap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Weak};
use std::time::SystemTime;

use crate::error::{Result, UadbError};
use crate::storage::source::{ReadSeek, Source};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MappingKey {
    path: PathBuf,
    len: u64,
    modified: Option<SystemTime>,
}

// Serializes the "look for an existing mapping, else create one" sequence
static MAPPINGS: LazyLock<Mutex<HashMap<MappingKey, Weak<Mmap>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Reads the data set through a shared read-only memory map.
pub struct MappedSource {
    path: PathBuf,
    map: Arc<Mmap>,
}

impl MappedSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mapping_error = |source| UadbError::Mapping {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(|source| UadbError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let canonical = path.canonicalize().map_err(mapping_error)?;
        let metadata = file.metadata().map_err(mapping_error)?;
        let key = MappingKey {
            path: canonical,
            len: metadata.len(),
            modified: metadata.modified().ok(),
        };

        let mut mappings = MAPPINGS.lock();
        mappings.retain(|_, map| map.strong_count() > 0);

        if let Some(map) = mappings.get(&key).and_then(Weak::upgrade) {
            tracing::debug!(path = %path.display(), "attached to existing mapping");
            return Ok(Self {
                path: path.to_path_buf(),
                map,
            });
        }

        // SAFETY: the map is read-only and data files are replaced, never modified
        // in place. A replaced file gets a new modification time and therefore a
        // new registry key.
        let map = unsafe { Mmap::map(&file) }.map_err(mapping_error)?;
        let map = Arc::new(map);
        mappings.insert(key, Arc::downgrade(&map));
        tracing::debug!(path = %path.display(), len = map.len(), "created mapping");

        Ok(Self {
            path: path.to_path_buf(),
            map,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when both sources read through the same OS mapping
    pub fn shares_mapping_with(&self, other: &MappedSource) -> bool {
        Arc::ptr_eq(&self.map, &other.map)
    }
}

impl fmt::Debug for MappedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedSource")
            .field("path", &self.path)
            .field("len", &self.map.len())
            .finish()
    }
}

impl Source for MappedSource {
    fn create_cursor(&self) -> Result<Box<dyn ReadSeek>> {
        Ok(Box::new(Cursor::new(MappedView(Arc::clone(&self.map)))))
    }

    fn len(&self) -> u64 {
        self.map.len() as u64
    }

    // The mapping is unmapped when the last view holding it is dropped
    fn dispose(&self) {}

    fn kind(&self) -> &'static str {
        "mapped"
    }
}

struct MappedView(Arc<Mmap>);

impl AsRef<[u8]> for MappedView {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
