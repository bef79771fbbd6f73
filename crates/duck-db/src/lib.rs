//! duck-db - persistent JSON key-value sessions
//!
//! A [`Database`] holds a path and a text encoding. Opening it yields a
//! [`Session`] over a redb file at `{path}.redb`; values are stored as JSON
//! documents encoded with the configured encoding.
//!
//! # Usage
//!
//! ```no_run
//! use duck_db::Database;
//! use serde_json::json;
//!
//! # fn main() -> duck_db::DbResult<()> {
//! let db = Database::with_path("/tmp/ducks");
//!
//! db.scope(|session| {
//!     session.set("x", &json!({ "a": [1, 2, 3], "b": null }))?;
//!     session.get("x")                          // Some({"a":[1,2,3],"b":null})
//! })?;
//!
//! let session = db.open()?;
//! session.get_or("missing", json!("default"))?; // "default"
//! session.keys()?;                               // ["x"]
//! session.close()?;
//! # Ok(())
//! # }
//! ```

mod config;
mod database;
mod encoding;
mod error;
mod json;
mod session;
mod store;

pub use config::{DEFAULT_PATH, DbConfig};
pub use database::Database;
pub use encoding::{DEFAULT_ENCODING, DecodeError, TextEncoding};
pub use error::{DbError, DbResult, StoreError, StoreResult};
pub use session::Session;
pub use store::{OpenMode, RedbStore, Store};

pub use serde_json::Value;
