use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UadbError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot open data file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot map data file {path}: {source}")]
    Mapping {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid data file signature")]
    InvalidSignature,

    #[error("Unsupported data file version: {0}")]
    UnsupportedVersion(u16),

    #[error("Invalid header for list '{list}': {reason}")]
    InvalidHeader { list: &'static str, reason: String },

    #[error("Index {index} out of range for list '{list}' ({count} items)")]
    IndexOutOfRange {
        list: &'static str,
        index: u32,
        count: u32,
    },

    #[error("Offset {offset} out of range for list '{list}' ({length} bytes)")]
    OffsetOutOfRange {
        list: &'static str,
        offset: u32,
        length: u64,
    },

    #[error("Impossible {what} count: {count}")]
    ImpossibleCount { what: &'static str, count: i64 },

    #[error("String at offset {0} is not valid ASCII")]
    InvalidString(u32),

    #[error("{context}: {source}")]
    Entity {
        context: &'static str,
        #[source]
        source: Box<UadbError>,
    },

    #[error("Data set has been disposed")]
    Disposed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, UadbError>;

impl UadbError {
    /// True when the error was caused by the stream ending inside a record.
    pub fn is_truncated(&self) -> bool {
        match self {
            UadbError::Io(e) => e.kind() == io::ErrorKind::UnexpectedEof,
            UadbError::Entity { source, .. } => source.is_truncated(),
            _ => false,
        }
    }
}

/// Attaches the failing operation to an entity read error.
pub trait ResultExt<T> {
    fn context(self, context: &'static str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: &'static str) -> Result<T> {
        self.map_err(|e| UadbError::Entity {
            context,
            source: Box::new(e),
        })
    }
}
