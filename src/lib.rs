//! # uadb - Stream-Backed Entity Store for Device Detection Data
//!
// Copyright 2025 Mehran Toosi
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! uadb reads the precompiled binary data files used for User-Agent device
//! detection. It exposes the file as typed lists of immutable entities that are
//! parsed on demand, cached, and shared between threads.
//!
//! ## Features
//!
//! - **Three Storage Media**: plain file, in-memory buffer, or memory-mapped file
//!   behind one `Source` trait
//! - **Reader Pool**: concurrent readers are recycled and never waited on
//! - **Generational Cache**: lock-free reads, bounded memory, hit/miss/switch counters
//! - **Lazy Entities**: nodes and profiles load their index arrays on first access
//! - **Format Versions**: 3.1 and 3.2 node layouts
//! - **Statistics**: per-list cache metrics and reader pool figures
//!
//! ## Quick Start
//!
//! ### Opening a Data File
//! ```no_run
//! use uadb::DataSet;
//!
//! # fn main() -> uadb::Result<()> {
//! let dataset = DataSet::open("/path/to/device-data.dat")?;
//!
//! // Fetch a node and walk to its parent
//! let node = dataset.nodes().get(0)?;
//! if let Some(parent) = node.parent(&dataset)? {
//!     println!("parent at offset {}", parent.offset());
//! }
//!
//! // Values resolve their names through the strings list
//! let value = dataset.values().get(0)?;
//! println!("{}", value.name(&dataset)?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Using the Builder Pattern
//! ```no_run
//! use uadb::DataSet;
//!
//! # fn main() -> uadb::Result<()> {
//! let dataset = DataSet::builder()
//!     .mapped("/path/to/device-data.dat")
//!     .nodes_cache(50_000)
//!     .profiles_cache(2_000)
//!     .build()?;
//!
//! println!("{}", dataset.stats().format());
//! # Ok(())
//! # }
//! ```
//!
//! ### Range Reads
//! ```no_run
//! # use uadb::DataSet;
//! # fn main() -> uadb::Result<()> {
//! # let dataset = DataSet::open("/path/to/device-data.dat")?;
//! let signature = dataset.signatures().get(10)?;
//!
//! // One reader checkout, sequential reads
//! let offsets = dataset
//!     .signature_node_offsets()
//!     .get_range(signature.first_node_offset_index() as u32, signature.node_count())?;
//! assert_eq!(offsets.len(), signature.node_count() as usize);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture Overview
//!
//! ### Data Flow
//! A list probes its cache; on a miss it checks a reader out of the pool, seeks
//! to the record, lets its factory parse one entity, stores it in the cache and
//! returns the reader. Lazy entity fields repeat the checkout on their own using
//! the stream position recorded when the entity was built.
//!
//! ### Caching
//! Each cached list keeps two generations of entries. Reads only touch the
//! active generation. Recently used keys are copied into the background
//! generation, and when it fills up it becomes the active one. Keys not used
//! for a whole generation fall out.
//!
//! ## Thread Safety
//!
//! All operations are thread-safe and can be called concurrently:
//!
//! ```no_run
//! # use uadb::DataSet;
//! # use std::sync::Arc;
//! # use std::thread;
//! # fn main() -> uadb::Result<()> {
//! let dataset = Arc::new(DataSet::open("/path/to/device-data.dat")?);
//! let mut handles = vec![];
//!
//! for i in 0..10 {
//!     let dataset = Arc::clone(&dataset);
//!     handles.push(thread::spawn(move || {
//!         dataset.values().get(i).unwrap();
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod core;
pub mod error;
pub mod stats;
pub mod storage;

pub use crate::core::dataset::{CacheSizes, DataSet, DataSetBuilder, DataSetConfig, SourceConfig};
pub use crate::core::entities::{AsciiString, Node, Profile, Signature, Value};
pub use crate::error::{Result, ResultExt, UadbError};
pub use crate::stats::{CacheSnapshot, CacheStatistics, DataSetStats};
pub use crate::storage::format::{get_format, NodeFormat};
pub use crate::storage::source::Source;

#[cfg(any(test, feature = "test-util"))]
pub use crate::storage::writer::DataFileBuilder;

#[cfg(test)]
mod tests;
