//! Set command - store a JSON value under a key.

use anyhow::{Context, Result};
use clap::Args;
use duck_db::{Database, Value};

#[derive(Args)]
pub struct SetCommand {
    /// Key to write
    pub key: String,

    /// JSON document to store
    pub value: String,

    /// Store VALUE as a JSON string instead of parsing it
    #[arg(long)]
    pub raw: bool,
}

impl SetCommand {
    pub fn run(&self, db: &Database) -> Result<()> {
        let value = self.parse_value()?;
        db.scope(|session| session.set(&self.key, &value))
            .with_context(|| format!("Failed to set '{}'", self.key))?;
        Ok(())
    }

    fn parse_value(&self) -> Result<Value> {
        if self.raw {
            return Ok(Value::String(self.value.clone()));
        }
        serde_json::from_str(&self.value).with_context(|| {
            format!(
                "'{}' is not valid JSON (use --raw to store it as a string)",
                self.value
            )
        })
    }
}
