use bytes::Bytes;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::constants::*;
use crate::error::{Result, UadbError};

/// A seekable byte stream handed out by a [`Source`].
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// The storage medium a data set is read from.
///
/// Every call to `create_cursor` yields an independent stream positioned at byte 0.
pub trait Source: Send + Sync + fmt::Debug {
    fn create_cursor(&self) -> Result<Box<dyn ReadSeek>>;

    /// Total size of the medium in bytes
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release the medium. Must be idempotent.
    fn dispose(&self);

    /// Short name of the medium, used in logs
    fn kind(&self) -> &'static str;
}

/// Reads the data set from a file, opening one OS handle per cursor.
pub struct FileSource {
    path: PathBuf,
    len: u64,
    temporary: bool,
    // Cloned into every cursor; a strong count above one means a cursor is still open
    live: Arc<()>,
    disposed: AtomicBool,
}

impl FileSource {
    /// Open a data file. The file is deleted on dispose when `temporary` is set
    /// or when its extension marks it as a temporary artifact.
    pub fn open(path: impl AsRef<Path>, temporary: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = std::fs::metadata(&path).map_err(|source| UadbError::Open {
            path: path.clone(),
            source,
        })?;

        // Fail now rather than on the first read
        File::open(&path).map_err(|source| UadbError::Open {
            path: path.clone(),
            source,
        })?;

        let temporary = temporary || has_temp_extension(&path);

        Ok(Self {
            path,
            len: metadata.len(),
            temporary,
            live: Arc::new(()),
            disposed: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Number of cursors created by this source that are still open
    pub fn open_cursors(&self) -> usize {
        Arc::strong_count(&self.live) - 1
    }

    fn delete_temporary(&self) {
        if !self.path.exists() {
            return;
        }

        let open = self.open_cursors();
        if open > 0 {
            tracing::warn!(
                path = %self.path.display(),
                open,
                "temporary data file still in use, skipping delete"
            );
            return;
        }

        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "deleted temporary data file"),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to delete temporary data file"
            ),
        }
    }
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSource")
            .field("path", &self.path)
            .field("len", &self.len)
            .field("temporary", &self.temporary)
            .field("open_cursors", &self.open_cursors())
            .finish()
    }
}

impl Source for FileSource {
    fn create_cursor(&self) -> Result<Box<dyn ReadSeek>> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(UadbError::Disposed);
        }

        let file = File::open(&self.path).map_err(|source| UadbError::Open {
            path: self.path.clone(),
            source,
        })?;

        Ok(Box::new(FileCursor {
            inner: BufReader::with_capacity(FILE_READER_BUFFER_SIZE, file),
            _live: Arc::clone(&self.live),
        }))
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        if self.temporary {
            self.delete_temporary();
        }
    }

    fn kind(&self) -> &'static str {
        "file"
    }
}

fn has_temp_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TEMP_FILE_EXTENSION))
}

struct FileCursor {
    inner: BufReader<File>,
    _live: Arc<()>,
}

impl Read for FileCursor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for FileCursor {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Reads the data set from an in-process buffer.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Bytes,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

impl Source for MemorySource {
    fn create_cursor(&self) -> Result<Box<dyn ReadSeek>> {
        // Bytes clones share the buffer
        Ok(Box::new(Cursor::new(self.data.clone())))
    }

    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn dispose(&self) {}

    fn kind(&self) -> &'static str {
        "memory"
    }
}
