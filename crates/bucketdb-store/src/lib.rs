//! BucketDB Store
//!
//! Typed records in named tables on top of the `sled` embedded engine:
//! - [`Database`] owns the engine handle and its lifecycle
//! - the table registry creates and lists tables
//! - the record store provides create-only, update-only, upsert and delete
//! - [`codec`] converts between caller types and stored JSON bytes
//! - [`global`] exposes the same surface through one process-wide handle

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod global;

mod handle;
mod registry;
mod store;

pub use bucketdb_common::config::StorageConfig;
pub use bucketdb_common::error::{Error, ErrorKind, Result};
pub use codec::Record;
pub use handle::Database;
