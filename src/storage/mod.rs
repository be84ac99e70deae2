pub mod format;
pub mod header;
pub mod metadata;
pub mod mmap;
pub mod pool;
pub mod reader;
pub mod source;

#[cfg(any(test, feature = "test-util"))]
pub mod writer;
