//! Process-wide store handle
//!
//! Free functions over a single shared [`Database`] for programs that want
//! one store per process without threading a handle through every call.
//! Everything except [`initialize`], [`close`] and [`tables`] fails with
//! [`Error::NoConnection`] until [`initialize`] succeeds.

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::Serialize;

use bucketdb_common::config::StorageConfig;
use bucketdb_common::error::{Error, Result};

use crate::codec::Record;
use crate::handle::Database;

/// The process-wide handle, `None` until initialised and after close
static HANDLE: Lazy<RwLock<Option<Arc<Database>>>> = Lazy::new(|| RwLock::new(None));

/// Open the process-wide store at `path` with `tables`.
///
/// A handle that is already open is closed first.
pub fn initialize<P, I, S>(path: P, tables: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    open(&StorageConfig::new(path, tables))
}

/// Open the process-wide store described by `config`
pub fn open(config: &StorageConfig) -> Result<()> {
    let mut slot = HANDLE.write();
    if let Some(previous) = slot.take() {
        previous.close()?;
    }
    *slot = Some(Arc::new(Database::open(config)?));
    Ok(())
}

/// Close the process-wide store; a no-op if it is not open
pub fn close() -> Result<()> {
    match HANDLE.write().take() {
        Some(db) => db.close(),
        None => Ok(()),
    }
}

/// Shared reference to the process-wide [`Database`]
pub fn handle() -> Result<Arc<Database>> {
    HANDLE.read().clone().ok_or(Error::NoConnection)
}

/// Run `f` against the raw engine of the process-wide store.
///
/// See [`Database::with_connection`].
pub fn with_connection<R, F>(f: F) -> Result<R>
where
    F: FnOnce(&sled::Db) -> R,
{
    handle()?.with_connection(f)
}

/// Tables in the process-wide store; empty when not open
pub fn tables() -> Vec<String> {
    handle().map(|db| db.tables()).unwrap_or_default()
}

pub fn save<V: Serialize + ?Sized>(value: &V, key: &str, table: &str) -> Result<()> {
    handle()?.save(value, key, table)
}

pub fn insert<V: Serialize + ?Sized>(value: &V, key: &str, table: &str) -> Result<()> {
    handle()?.insert(value, key, table)
}

pub fn update<V: Serialize + ?Sized>(value: &V, key: &str, table: &str) -> Result<()> {
    handle()?.update(value, key, table)
}

pub fn get<T: Record>(key: &str, table: &str) -> Result<T> {
    handle()?.get(key, table)
}

pub fn get_all<T: Record>(table: &str) -> Result<Vec<T>> {
    handle()?.get_all(table)
}

pub fn delete(key: &str, table: &str) -> Result<()> {
    handle()?.delete(key, table)
}
