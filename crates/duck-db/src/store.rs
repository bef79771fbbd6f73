//! Raw byte store backing a session, implemented with redb

use crate::error::{StoreError, StoreResult, backend};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};

// Single table holding every record
const TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("records");

/// How a store file is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-write, creating the file if it is missing
    #[default]
    Create,
    /// Read-write, failing if the file is missing
    Existing,
    /// Read-write, discarding any existing file first
    Truncate,
}

/// Byte-keyed, byte-valued persistent map.
///
/// `get` returning `Ok(None)` is the store's "key not found". An empty value
/// is a real record and must be returned as `Some(vec![])`.
pub trait Store: Sized {
    /// Extension appended to the configured path to name the store file
    const EXTENSION: &'static str;

    fn open(path: &Path, mode: OpenMode) -> StoreResult<Self>;

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    fn set(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Remove a record, returning whether it existed
    fn remove(&mut self, key: &[u8]) -> StoreResult<bool>;

    fn keys(&self) -> StoreResult<Vec<Vec<u8>>>;

    /// Release the underlying file
    fn close(self) -> StoreResult<()>;
}

/// Store backed by a single redb file.
///
/// redb takes an exclusive lock on the file, so a second open of the same
/// path fails until this store is closed.
pub struct RedbStore {
    db: Database,
    path: PathBuf,
}

impl RedbStore {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Store for RedbStore {
    const EXTENSION: &'static str = "redb";

    fn open(path: &Path, mode: OpenMode) -> StoreResult<Self> {
        let db = match mode {
            OpenMode::Create => Database::create(path).map_err(backend)?,
            OpenMode::Existing => Database::open(path).map_err(backend)?,
            OpenMode::Truncate => {
                match std::fs::remove_file(path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(StoreError::Io(e)),
                }
                Database::create(path).map_err(backend)?
            }
        };

        // Initialize the table so readers never see a missing table
        let write_txn = db.begin_write().map_err(backend)?;
        {
            write_txn.open_table(TABLE).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;

        tracing::debug!(path = %path.display(), ?mode, "opened redb store");

        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read().map_err(backend)?;
        let table = read_txn.open_table(TABLE).map_err(backend)?;

        let value = table.get(key).map_err(backend)?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let write_txn = self.db.begin_write().map_err(backend)?;
        {
            let mut table = write_txn.open_table(TABLE).map_err(backend)?;
            table.insert(key, value).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;

        Ok(())
    }

    fn remove(&mut self, key: &[u8]) -> StoreResult<bool> {
        let write_txn = self.db.begin_write().map_err(backend)?;
        let existed = {
            let mut table = write_txn.open_table(TABLE).map_err(backend)?;
            table.remove(key).map_err(backend)?.is_some()
        };
        write_txn.commit().map_err(backend)?;

        Ok(existed)
    }

    fn keys(&self) -> StoreResult<Vec<Vec<u8>>> {
        let read_txn = self.db.begin_read().map_err(backend)?;
        let table = read_txn.open_table(TABLE).map_err(backend)?;

        let mut keys = Vec::new();
        for item in table.iter().map_err(backend)? {
            let (key, _) = item.map_err(backend)?;
            keys.push(key.value().to_vec());
        }

        Ok(keys)
    }

    fn close(self) -> StoreResult<()> {
        // Every write commits durably, so releasing the handle is all that is left
        drop(self.db);
        tracing::debug!(path = %self.path.display(), "closed redb store");
        Ok(())
    }
}
