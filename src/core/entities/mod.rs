//! Entities reconstructed from data file records.
//!
//! Plain entities (`AsciiString`, `Value`, `Signature`) are parsed in full. `Node` and
//! `Profile` read only their headers up front and fetch their index arrays from the
//! reader pool the first time they are asked for.

use parking_lot::Mutex;
use std::fmt;
use std::sync::OnceLock;

use crate::error::{Result, UadbError};

pub mod node;
pub mod profile;
pub mod signature;
pub mod string;
pub mod value;

pub use self::node::{Node, NodeContext, NodeFactory};
pub use self::profile::{Profile, ProfileFactory};
pub use self::signature::{Signature, SignatureFactory};
pub use self::string::{AsciiString, StringFactory};
pub use self::value::{Value, ValueFactory};

/// Write-once field loaded on first access.
///
/// The fast path is a single atomic load. The mutex is only taken until the value is
/// set, so concurrent first accesses run the loader exactly once; a failed load
/// leaves the field empty for the next caller to retry.
pub(crate) struct LazyField<T> {
    cell: OnceLock<T>,
    init: Mutex<()>,
}

impl<T> LazyField<T> {
    pub(crate) fn new() -> Self {
        Self {
            cell: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    pub(crate) fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub(crate) fn get_or_try_init<F>(&self, load: F) -> Result<&T>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }

        let _init = self.init.lock();
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }

        let value = load()?;
        Ok(self.cell.get_or_init(|| value))
    }
}

impl<T: fmt::Debug> fmt::Debug for LazyField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => value.fmt(f),
            None => f.write_str("<not loaded>"),
        }
    }
}

/// Convert a stored i32 reference into a list key
pub(crate) fn to_key(value: i32, what: &'static str) -> Result<u32> {
    u32::try_from(value).map_err(|_| UadbError::ImpossibleCount {
        what,
        count: value as i64,
    })
}
