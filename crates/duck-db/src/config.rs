//! Database configuration.

use crate::encoding::DEFAULT_ENCODING;
use serde::Deserialize;
use std::path::PathBuf;

/// Base path of the store file when none is configured. The store file
/// itself lives at `/var/duck.redb`.
pub const DEFAULT_PATH: &str = "/var/duck";

/// Location and value encoding of a database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DbConfig {
    /// Store path without the file extension
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Text encoding label for stored values
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            encoding: default_encoding(),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from(DEFAULT_PATH)
}

fn default_encoding() -> String {
    DEFAULT_ENCODING.to_string()
}
