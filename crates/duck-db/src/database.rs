//! Database handle: configuration plus scoped sessions

use crate::config::DbConfig;
use crate::encoding::TextEncoding;
use crate::error::{DbError, DbResult};
use crate::session::Session;
use crate::store::{OpenMode, RedbStore, Store};
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Handle to an on-disk database.
///
/// Holds only configuration; nothing touches the filesystem until
/// [`Database::open`] or [`Database::scope`] is called.
pub struct Database<S: Store = RedbStore> {
    path: PathBuf,
    encoding: String,
    _store: PhantomData<fn() -> S>,
}

impl Database<RedbStore> {
    /// Database at the default path with the default encoding
    pub fn new() -> Self {
        Self::from_config(&DbConfig::default())
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self::from_config(&DbConfig {
            path: path.into(),
            ..DbConfig::default()
        })
    }

    pub fn from_config(config: &DbConfig) -> Self {
        Self {
            path: config.path.clone(),
            encoding: config.encoding.clone(),
            _store: PhantomData,
        }
    }
}

impl Default for Database<RedbStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Store> Database<S> {
    /// Set the text encoding label used for stored values.
    ///
    /// The label is resolved when a session is opened.
    pub fn encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = label.into();
        self
    }

    /// Use a different store backend with the same configuration
    pub fn with_backend<T: Store>(self) -> Database<T> {
        Database {
            path: self.path,
            encoding: self.encoding,
            _store: PhantomData,
        }
    }

    /// Configured path, without the store extension
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn encoding_label(&self) -> &str {
        &self.encoding
    }

    /// Path of the store file: the configured path plus the store's extension
    pub fn file_path(&self) -> PathBuf {
        let mut file = self.path.clone().into_os_string();
        file.push(".");
        file.push(S::EXTENSION);
        PathBuf::from(file)
    }

    /// Open a session, creating the store file if it is missing.
    pub fn open(&self) -> DbResult<Session<S>> {
        self.open_with(OpenMode::Create)
    }

    pub fn open_with(&self, mode: OpenMode) -> DbResult<Session<S>> {
        let encoding: TextEncoding = self.encoding.parse()?;
        let path = self.file_path();

        let store = S::open(&path, mode).map_err(|source| DbError::StorageOpen {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(path = %path.display(), %encoding, "opened session");
        Ok(Session::new(store, encoding))
    }

    /// Run `f` with a fresh session and close the store afterwards.
    ///
    /// The store is closed whether `f` succeeds, fails or panics. An error
    /// from `f` is returned in preference to an error from closing.
    pub fn scope<R, F>(&self, f: F) -> DbResult<R>
    where
        F: FnOnce(&mut Session<S>) -> DbResult<R>,
    {
        let mut session = self.open()?;
        let result = f(&mut session);
        let closed = session.close();

        let value = result?;
        closed?;
        Ok(value)
    }
}

impl<S: Store> Clone for Database<S> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            encoding: self.encoding.clone(),
            _store: PhantomData,
        }
    }
}

impl<S: Store> fmt::Debug for Database<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("encoding", &self.encoding)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, StoreResult};
    use once_cell::sync::Lazy;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};

    /// Shared state of an in-memory store, keyed by file path
    #[derive(Default)]
    struct MemoryFile {
        records: BTreeMap<Vec<u8>, Vec<u8>>,
        opens: usize,
        closes: usize,
    }

    static FILES: Lazy<Mutex<HashMap<PathBuf, MemoryFile>>> =
        Lazy::new(|| Mutex::new(HashMap::new()));

    /// Store keeping records in memory and counting opens and closes
    struct MemoryStore {
        path: PathBuf,
    }

    impl MemoryStore {
        fn with_file<R>(&self, f: impl FnOnce(&mut MemoryFile) -> R) -> R {
            let mut files = FILES.lock();
            f(files.entry(self.path.clone()).or_default())
        }
    }

    impl Store for MemoryStore {
        const EXTENSION: &'static str = "mem";

        fn open(path: &Path, mode: OpenMode) -> StoreResult<Self> {
            let mut files = FILES.lock();
            if mode == OpenMode::Existing && !files.contains_key(path) {
                return Err(std::io::Error::from(std::io::ErrorKind::NotFound).into());
            }
            let file = files.entry(path.to_path_buf()).or_default();
            if mode == OpenMode::Truncate {
                file.records.clear();
            }
            file.opens += 1;
            Ok(Self {
                path: path.to_path_buf(),
            })
        }

        fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
            Ok(self.with_file(|file| file.records.get(key).cloned()))
        }

        fn set(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()> {
            self.with_file(|file| file.records.insert(key.to_vec(), value.to_vec()));
            Ok(())
        }

        fn remove(&mut self, key: &[u8]) -> StoreResult<bool> {
            Ok(self.with_file(|file| file.records.remove(key).is_some()))
        }

        fn keys(&self) -> StoreResult<Vec<Vec<u8>>> {
            Ok(self.with_file(|file| file.records.keys().cloned().collect()))
        }

        fn close(self) -> StoreResult<()> {
            self.with_file(|file| file.closes += 1);
            Ok(())
        }
    }

    /// Store whose every operation after open fails with an IO error
    struct FailingStore {
        path: PathBuf,
    }

    fn io_failure() -> StoreError {
        std::io::Error::other("disk on fire").into()
    }

    impl Store for FailingStore {
        const EXTENSION: &'static str = "fail";

        fn open(path: &Path, _mode: OpenMode) -> StoreResult<Self> {
            FILES.lock().entry(path.to_path_buf()).or_default().opens += 1;
            Ok(Self {
                path: path.to_path_buf(),
            })
        }

        fn get(&self, _key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
            Err(io_failure())
        }

        fn set(&mut self, _key: &[u8], _value: &[u8]) -> StoreResult<()> {
            Err(io_failure())
        }

        fn remove(&mut self, _key: &[u8]) -> StoreResult<bool> {
            Err(io_failure())
        }

        fn keys(&self) -> StoreResult<Vec<Vec<u8>>> {
            Err(io_failure())
        }

        fn close(self) -> StoreResult<()> {
            FILES.lock().entry(self.path.clone()).or_default().closes += 1;
            Err(io_failure())
        }
    }

    fn failing_db(name: &str) -> Database<FailingStore> {
        Database::with_path(format!("/failing/{name}")).with_backend::<FailingStore>()
    }

    fn memory_db(name: &str) -> Database<MemoryStore> {
        Database::with_path(format!("/memory/{name}")).with_backend::<MemoryStore>()
    }

    fn counts<S: Store>(db: &Database<S>) -> (usize, usize) {
        let files = FILES.lock();
        files
            .get(&db.file_path())
            .map(|file| (file.opens, file.closes))
            .unwrap_or_default()
    }

    #[test]
    fn test_construction_does_no_io() {
        let db = Database::with_path("/definitely/not/here").encoding("no-such-encoding");
        assert_eq!(db.path(), Path::new("/definitely/not/here"));
        assert_eq!(db.encoding_label(), "no-such-encoding");
        assert!(!db.file_path().exists());
    }

    #[test]
    fn test_defaults() {
        let db = Database::new();
        assert_eq!(db.path(), Path::new("/var/duck"));
        assert_eq!(db.encoding_label(), "utf-8");
        assert_eq!(db.file_path(), PathBuf::from("/var/duck.redb"));
    }

    #[test]
    fn test_file_path_appends_extension() {
        let db = Database::with_path("/tmp/test1");
        assert_eq!(db.file_path(), PathBuf::from("/tmp/test1.redb"));

        // An existing extension is kept, not replaced
        let db = Database::with_path("/tmp/state.v1");
        assert_eq!(db.file_path(), PathBuf::from("/tmp/state.v1.redb"));
        assert_eq!(
            db.with_backend::<MemoryStore>().file_path(),
            PathBuf::from("/tmp/state.v1.mem")
        );
    }

    #[test]
    fn test_unknown_encoding_fails_before_open() {
        let db = memory_db("bad-encoding").encoding("klingon");
        let err = db.open().unwrap_err();
        assert!(matches!(err, DbError::UnknownEncoding(ref label) if label == "klingon"));
        assert_eq!(counts(&db), (0, 0));
    }

    #[test]
    fn test_scope_closes_once_on_success() {
        let db = memory_db("scope-ok");
        let value = db
            .scope(|session| {
                session.set("x", &json!({ "a": [1, 2, 3], "b": null }))?;
                session.get("x")
            })
            .unwrap();

        assert_eq!(value, Some(json!({ "a": [1, 2, 3], "b": null })));
        assert_eq!(counts(&db), (1, 1));
    }

    #[test]
    fn test_scope_closes_once_on_error() {
        let db = memory_db("scope-err");
        let err = db
            .scope(|session| {
                session.set("ok", &1)?;
                Err::<(), _>(DbError::corrupt(b"ok", "forced"))
            })
            .unwrap_err();

        assert!(err.is_corrupt_record());
        assert_eq!(counts(&db), (1, 1));
    }

    #[test]
    fn test_scope_closes_once_on_panic() {
        let db = memory_db("scope-panic");
        let result = std::panic::catch_unwind(|| {
            let _ = db.scope(|_session| -> DbResult<()> { panic!("boom") });
        });

        assert!(result.is_err());
        assert_eq!(counts(&db), (1, 1));
    }

    #[test]
    fn test_drop_and_close_each_close_once() {
        let db = memory_db("drop");

        {
            let _session = db.open().unwrap();
        }
        assert_eq!(counts(&db), (1, 1));

        let session = db.open().unwrap();
        session.close().unwrap();
        assert_eq!(counts(&db), (2, 2));
    }

    #[test]
    fn test_open_modes() {
        let db = memory_db("modes");

        let err = db.open_with(OpenMode::Existing).unwrap_err();
        assert!(matches!(err, DbError::StorageOpen { ref path, .. } if path == &db.file_path()));

        db.scope(|session| session.set("k", &"v")).unwrap();
        db.scope(|session| {
            assert_eq!(session.get("k")?, Some(json!("v")));
            Ok(())
        })
        .unwrap();

        let session = db.open_with(OpenMode::Truncate).unwrap();
        assert!(session.keys().unwrap().is_empty());
    }

    #[test]
    fn test_store_failures_map_to_storage_errors() {
        let db = failing_db("mapping");
        let mut session = db.open().unwrap();

        let err = session.set("k", &1).unwrap_err();
        assert!(matches!(err, DbError::StorageWrite { ref key, .. } if key == "k"), "{err}");

        let err = session.remove("k").unwrap_err();
        assert!(matches!(err, DbError::StorageWrite { ref key, .. } if key == "k"), "{err}");

        assert!(matches!(session.get("k").unwrap_err(), DbError::StorageRead(_)));
        assert!(matches!(session.get_or("k", json!(0)).unwrap_err(), DbError::StorageRead(_)));
        assert!(matches!(session.keys().unwrap_err(), DbError::StorageRead(_)));
        assert!(matches!(session.raw_keys().unwrap_err(), DbError::StorageRead(_)));

        assert!(matches!(session.close().unwrap_err(), DbError::StorageClose(_)));
        assert_eq!(counts(&db), (1, 1));
    }

    #[test]
    fn test_scope_prefers_body_error_over_close_error() {
        let db = failing_db("scope-both");
        let err = db.scope(|session| session.set("k", &1)).unwrap_err();
        assert!(matches!(err, DbError::StorageWrite { .. }), "{err}");
        assert_eq!(counts(&db), (1, 1));
    }

    #[test]
    fn test_scope_reports_close_error_after_success() {
        let db = failing_db("scope-close");
        let err = db.scope(|_session| Ok(())).unwrap_err();
        assert!(matches!(err, DbError::StorageClose(_)), "{err}");
        assert_eq!(counts(&db), (1, 1));
    }

    #[test]
    fn test_drop_swallows_close_error() {
        let db = failing_db("drop");
        drop(db.open().unwrap());
        assert_eq!(counts(&db), (1, 1));
    }
}
