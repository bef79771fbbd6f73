//! JSON sessions over an open store

use crate::encoding::TextEncoding;
use crate::error::{DbError, DbResult, display_key};
use crate::store::{RedbStore, Store};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Typed access to an open store.
///
/// Values are JSON documents encoded with the session's [`TextEncoding`].
/// The store is closed exactly once: by [`Session::close`], or when the
/// session is dropped.
pub struct Session<S: Store = RedbStore> {
    store: Option<S>,
    encoding: TextEncoding,
}

impl<S: Store> Session<S> {
    pub(crate) fn new(store: S, encoding: TextEncoding) -> Self {
        Self {
            store: Some(store),
            encoding,
        }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    fn store(&self) -> DbResult<&S> {
        self.store.as_ref().ok_or(DbError::SessionClosed)
    }

    fn store_mut(&mut self) -> DbResult<&mut S> {
        self.store.as_mut().ok_or(DbError::SessionClosed)
    }

    /// Get the value stored under `key`, or `None` if the key is absent.
    ///
    /// An empty raw record reads as `null`. Bytes that do not decode or do
    /// not parse as JSON fail with [`DbError::CorruptRecord`].
    pub fn get(&self, key: impl AsRef<[u8]>) -> DbResult<Option<Value>> {
        let key = key.as_ref();
        let raw = match self.store()?.get(key).map_err(DbError::StorageRead)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        tracing::trace!(key = %display_key(key), len = raw.len(), "read record");
        self.decode_record(key, &raw).map(Some)
    }

    /// Get the value stored under `key`, falling back to `default` only when
    /// the key is absent.
    pub fn get_or(&self, key: impl AsRef<[u8]>, default: Value) -> DbResult<Value> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Get the value stored under `key` as `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: impl AsRef<[u8]>) -> DbResult<Option<T>> {
        let key = key.as_ref();
        match self.get(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| DbError::TypeMismatch {
                    key: display_key(key),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Store `value` under `key`, replacing any previous record.
    pub fn set<T: Serialize + ?Sized>(
        &mut self,
        key: impl AsRef<[u8]>,
        value: &T,
    ) -> DbResult<()> {
        let key = key.as_ref();
        let json = crate::json::to_string(value).map_err(DbError::Serialization)?;
        let raw = self.encoding.encode_json(&json);

        self.store_mut()?
            .set(key, &raw)
            .map_err(|source| DbError::StorageWrite {
                key: display_key(key),
                source,
            })?;

        tracing::trace!(key = %display_key(key), len = raw.len(), "wrote record");
        Ok(())
    }

    /// Remove the record under `key`, returning whether it existed.
    pub fn remove(&mut self, key: impl AsRef<[u8]>) -> DbResult<bool> {
        let key = key.as_ref();
        self.store_mut()?
            .remove(key)
            .map_err(|source| DbError::StorageWrite {
                key: display_key(key),
                source,
            })
    }

    /// All keys currently stored, in store order.
    ///
    /// Fails with [`DbError::InvalidKey`] if a key is not UTF-8; use
    /// [`Session::raw_keys`] for byte keys.
    pub fn keys(&self) -> DbResult<Vec<String>> {
        self.raw_keys()?
            .into_iter()
            .map(|key| String::from_utf8(key).map_err(|e| DbError::InvalidKey(e.into_bytes())))
            .collect()
    }

    pub fn raw_keys(&self) -> DbResult<Vec<Vec<u8>>> {
        self.store()?.keys().map_err(DbError::StorageRead)
    }

    /// Close the store, reporting any failure to release it.
    pub fn close(mut self) -> DbResult<()> {
        match self.store.take() {
            Some(store) => store.close().map_err(DbError::StorageClose),
            None => Ok(()),
        }
    }

    fn decode_record(&self, key: &[u8], raw: &[u8]) -> DbResult<Value> {
        if raw.is_empty() {
            return Ok(Value::Null);
        }

        let text = self
            .encoding
            .decode(raw)
            .map_err(|e| DbError::corrupt(key, e.to_string()))?;
        serde_json::from_str(&text)
            .map_err(|e| DbError::corrupt(key, format!("invalid JSON: {e}")))
    }
}

impl<S: Store> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("encoding", &self.encoding)
            .field("open", &self.store.is_some())
            .finish()
    }
}

impl<S: Store> Drop for Session<S> {
    fn drop(&mut self) {
        if let Some(store) = self.store.take() {
            if let Err(e) = store.close() {
                tracing::warn!(error = %e, "failed to close store on drop");
            }
        }
    }
}
