//! Engine handle and its lifecycle

use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::RwLock;
use sled::{Db, Tree};
use tracing::{debug, info};

use bucketdb_common::config::StorageConfig;
use bucketdb_common::error::{Error, Result};

/// Pause between attempts to open a store locked by another handle
const OPEN_RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// An open BucketDB store.
///
/// Owns the `sled` engine and the registry of tables known to it. Every
/// table and record operation goes through a `Database`; once [`close`] has
/// been called those operations fail with [`Error::NoConnection`].
///
/// `Database` is `Send + Sync` and is meant to be shared by reference or
/// through an `Arc`.
///
/// [`close`]: Database::close
pub struct Database {
    /// Location of the store on disk
    path: PathBuf,
    /// Engine handle, `None` once closed
    engine: RwLock<Option<Db>>,
    /// Open tree per table name
    pub(crate) tables: DashMap<String, Tree>,
}

impl Database {
    /// Open the store at `path` and make sure `tables` exist in it.
    ///
    /// Uses default engine tuning; see [`Database::open`] for the
    /// configurable form.
    pub fn initialize<P, I, S>(path: P, tables: I) -> Result<Self>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::open(&StorageConfig::new(path, tables))
    }

    /// Open the store described by `config`, creating it if absent.
    ///
    /// Waits up to `config.open_timeout_ms` for another handle to release the
    /// store. Every configured table is created if missing; failures are
    /// collected into one [`Error::Multiple`] and the handle is released
    /// before returning it.
    pub fn open(config: &StorageConfig) -> Result<Self> {
        info!("Opening store at {}", config.path);

        let db = open_engine(config)?;
        let database = Self {
            path: PathBuf::from(&config.path),
            engine: RwLock::new(Some(db)),
            tables: DashMap::new(),
        };

        let ready = database
            .load_tables()
            .and_then(|()| database.create_tables_if_missing(&config.tables));
        if let Err(e) = ready {
            // The caller only sees the table errors.
            if let Err(close_err) = database.close() {
                debug!("Flush after failed table setup at {}: {}", config.path, close_err);
            }
            return Err(e);
        }

        info!(
            "Store at {} ready with {} tables",
            config.path,
            database.tables.len()
        );
        Ok(database)
    }

    /// Flush and release the engine.
    ///
    /// Closing an already-closed handle succeeds without doing anything.
    pub fn close(&self) -> Result<()> {
        let Some(db) = self.engine.write().take() else {
            return Ok(());
        };
        self.tables.clear();

        info!("Closing store at {}", self.path.display());
        db.flush()?;
        Ok(())
    }

    /// Run `f` against the raw engine, for work outside the table/record
    /// contract.
    ///
    /// The engine is only lent for the duration of `f`, so [`close`] still
    /// releases the store afterwards. A `Db` cloned inside `f` and kept
    /// keeps the store and its file lock alive past `close`.
    ///
    /// Fails with [`Error::NoConnection`] once the handle has been closed.
    ///
    /// [`close`]: Database::close
    pub fn with_connection<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Db) -> R,
    {
        let db = self.engine()?;
        Ok(f(&db))
    }

    pub fn is_open(&self) -> bool {
        self.engine.read().is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn engine(&self) -> Result<Db> {
        self.engine.read().clone().ok_or(Error::NoConnection)
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .field("tables", &self.tables.len())
            .finish()
    }
}

fn open_engine(config: &StorageConfig) -> Result<Db> {
    let engine = sled::Config::new()
        .path(&config.path)
        .cache_capacity(config.cache_capacity_bytes)
        .flush_every_ms(config.flush_every_ms)
        .temporary(config.temporary);

    let deadline = Instant::now() + config.open_timeout();
    loop {
        match engine.open() {
            Ok(db) => return Ok(db),
            Err(sled::Error::Io(e)) if is_lock_contention(&e) && Instant::now() < deadline => {
                debug!("Store at {} is locked, retrying: {}", config.path, e);
                thread::sleep(OPEN_RETRY_INTERVAL);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// sled reports a held file lock as an `Other` error naming the lock
fn is_lock_contention(e: &io::Error) -> bool {
    match e.kind() {
        io::ErrorKind::WouldBlock => true,
        io::ErrorKind::Other => e.to_string().contains("could not acquire lock"),
        _ => false,
    }
}
