//! SQLite-backed object store for session records.
//!
//! Each [`Collection`] is a table keyed by an integer id. [`Database`] is the
//! handle: it owns one connection, exposes the generic record operations in
//! [`records`], and groups writes with [`Database::transaction`].
//!
//! # Usage
//!
//! ```ignore
//! let db = Database::open(path, SCHEMA_VERSION)?;
//! db.transaction(|db| {
//!     db.delete_by_index(Collection::Trackers, Index::Game, GAME_KEY)?;
//!     db.add(&tracker)
//! })?;
//! db.close()?;
//! ```

mod games;
mod players;
mod records;
mod roll_tables;
mod scenes;
pub mod schema;
mod trackers;
mod traits;

use std::cell::Cell;
use std::path::Path;

use rusqlite::Connection;
use tracing::warn;

use crate::error::{StorageError, StorageResult};

pub use games::GAME_KEY;
pub use records::Record;
pub use schema::{Collection, Index, SCHEMA_VERSION};

/// An open handle on the session store.
pub struct Database {
    conn: Connection,
    /// Savepoint nesting depth of the running transaction.
    depth: Cell<u32>,
}

impl Database {
    /// Open or create a store at the given path, upgrading it to `version`.
    pub fn open(path: &Path, version: u32) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)?;
        schema::initialize(&conn, version)?;

        Ok(Self {
            conn,
            depth: Cell::new(0),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn, SCHEMA_VERSION)?;

        Ok(Self {
            conn,
            depth: Cell::new(0),
        })
    }

    /// Get a reference to the underlying connection (for metadata queries).
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Close the handle, reporting any error SQLite raises while doing so.
    pub fn close(self) -> StorageResult<()> {
        self.conn.close().map_err(|(_, e)| StorageError::Sqlite(e))
    }

    /// Run `f` atomically.
    ///
    /// Transactions nest: an inner call becomes a savepoint of the outer one,
    /// so several façade calls sharing a handle commit or roll back together
    /// when wrapped in an outer `transaction`.
    pub fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Database) -> Result<T, E>,
        E: From<rusqlite::Error>,
    {
        let depth = self.depth.get();
        let savepoint = format!("sp_{depth}");
        self.conn.execute_batch(&format!("SAVEPOINT {savepoint};"))?;
        self.depth.set(depth + 1);

        let result = f(self);
        self.depth.set(depth);

        match result {
            Ok(value) => {
                self.conn.execute_batch(&format!("RELEASE {savepoint};"))?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self
                    .conn
                    .execute_batch(&format!("ROLLBACK TO {savepoint}; RELEASE {savepoint};"))
                {
                    warn!("Failed to roll back {savepoint}: {rollback}");
                }
                Err(e)
            }
        }
    }
}

/// Delete a store file and its SQLite side files. Missing files are ignored.
pub fn destroy(path: &Path) -> StorageResult<()> {
    let base = path.as_os_str().to_owned();
    for suffix in ["", "-wal", "-shm"] {
        let mut file = base.clone();
        file.push(suffix);
        match std::fs::remove_file(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
