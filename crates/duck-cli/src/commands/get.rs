//! Get command - print the JSON value stored under a key.

use anyhow::{Context, Result};
use clap::Args;
use duck_db::{Database, Value};

#[derive(Args)]
pub struct GetCommand {
    /// Key to look up
    pub key: String,

    /// JSON value to print when the key is absent
    #[arg(long)]
    pub default: Option<String>,

    /// Print on a single line
    #[arg(long)]
    pub compact: bool,
}

impl GetCommand {
    pub fn run(&self, db: &Database) -> Result<()> {
        let value = self.lookup(db)?;
        let output = if self.compact {
            serde_json::to_string(&value)?
        } else {
            serde_json::to_string_pretty(&value)?
        };
        println!("{}", output);
        Ok(())
    }

    fn lookup(&self, db: &Database) -> Result<Value> {
        let default = self
            .default
            .as_deref()
            .map(serde_json::from_str::<Value>)
            .transpose()
            .context("--default is not valid JSON")?;

        let found = db.scope(|session| session.get(&self.key))?;

        match (found, default) {
            (Some(value), _) => Ok(value),
            (None, Some(default)) => Ok(default),
            (None, None) => anyhow::bail!("Key '{}' not found.", self.key),
        }
    }
}
