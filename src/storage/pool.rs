use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Result, UadbError};
use crate::storage::reader::Reader;
use crate::storage::source::Source;

/// Recycling pool of readers over one source.
///
/// Readers are created on demand and never destroyed until the pool is disposed,
/// so `acquire` never waits for another caller to finish.
pub struct Pool {
    source: RwLock<Option<Arc<dyn Source>>>,
    queue: Mutex<VecDeque<Reader>>,
    readers_created: AtomicUsize,
    disposed: AtomicBool,
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("readers_created", &self.readers_created())
            .field("readers_queued", &self.readers_queued())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Pool {
    pub fn new(source: Arc<dyn Source>) -> Self {
        Self {
            source: RwLock::new(Some(source)),
            queue: Mutex::new(VecDeque::new()),
            readers_created: AtomicUsize::new(0),
            disposed: AtomicBool::new(false),
        }
    }

    /// Check out a reader. It is returned to the pool when the guard drops.
    pub fn acquire(&self) -> Result<PooledReader<'_>> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(UadbError::Disposed);
        }

        if let Some(reader) = self.queue.lock().pop_front() {
            return Ok(PooledReader {
                pool: self,
                reader: Some(reader),
            });
        }

        let source = self.source.read().clone().ok_or(UadbError::Disposed)?;
        let stream = source.create_cursor()?;
        let id = self.readers_created.fetch_add(1, Ordering::AcqRel);
        tracing::debug!(id, medium = source.kind(), "created reader");

        Ok(PooledReader {
            pool: self,
            reader: Some(Reader::new(id, stream)),
        })
    }

    /// Return a reader to the idle queue
    pub fn release(&self, reader: Reader) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        self.queue.lock().push_back(reader);
    }

    /// Total readers ever created by this pool
    pub fn readers_created(&self) -> usize {
        self.readers_created.load(Ordering::Acquire)
    }

    /// Readers currently idle in the queue
    pub fn readers_queued(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Close idle readers and dispose the source. Readers still checked out are
    /// dropped when their holders release them.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        let idle: Vec<Reader> = self.queue.lock().drain(..).collect();
        drop(idle);

        if let Some(source) = self.source.write().take() {
            source.dispose();
        }
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// A reader checked out of a [`Pool`]. Releases itself on drop.
#[derive(Debug)]
pub struct PooledReader<'a> {
    pool: &'a Pool,
    reader: Option<Reader>,
}

impl Deref for PooledReader<'_> {
    type Target = Reader;

    fn deref(&self) -> &Reader {
        // Only taken in drop
        self.reader.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl DerefMut for PooledReader<'_> {
    fn deref_mut(&mut self) -> &mut Reader {
        self.reader.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledReader<'_> {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            self.pool.release(reader);
        }
    }
}
