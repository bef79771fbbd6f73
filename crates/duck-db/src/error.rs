//! Error types for duck-db

use std::path::PathBuf;
use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by a [`Store`](crate::Store) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Backend(#[from] redb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Normalize any redb error (database, transaction, table, storage, commit)
/// into a [`StoreError`].
pub(crate) fn backend<E: Into<redb::Error>>(err: E) -> StoreError {
    StoreError::Backend(err.into())
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("failed to open store at {}: {source}", .path.display())]
    StorageOpen {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("unknown text encoding: {0:?}")]
    UnknownEncoding(String),

    #[error("corrupt record for key {key:?}: {reason}")]
    CorruptRecord { key: String, reason: String },

    #[error("record for key {key:?} does not match the requested type: {source}")]
    TypeMismatch {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("value is not JSON-serializable: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("failed to write key {key:?}: {source}")]
    StorageWrite {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to read from store: {0}")]
    StorageRead(#[source] StoreError),

    #[error("failed to close store: {0}")]
    StorageClose(#[source] StoreError),

    // Closing consumes the session, so callers never observe this
    #[doc(hidden)]
    #[error("session is closed")]
    SessionClosed,

    #[error("stored key is not valid UTF-8: {0:?}")]
    InvalidKey(Vec<u8>),
}

impl DbError {
    pub(crate) fn corrupt(key: &[u8], reason: impl Into<String>) -> Self {
        DbError::CorruptRecord {
            key: display_key(key),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the stored bytes rather than by the store
    /// or the caller.
    pub fn is_corrupt_record(&self) -> bool {
        matches!(self, DbError::CorruptRecord { .. })
    }
}

/// Render a raw key for error messages.
pub(crate) fn display_key(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}
