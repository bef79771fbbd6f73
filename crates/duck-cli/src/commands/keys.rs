//! Keys command - list stored keys.

use anyhow::Result;
use clap::Args;
use duck_db::Database;

#[derive(Args)]
pub struct KeysCommand {
    /// Sort keys before printing
    #[arg(long)]
    pub sort: bool,
}

impl KeysCommand {
    pub fn run(&self, db: &Database) -> Result<()> {
        let mut keys = db.scope(|session| session.keys())?;
        if self.sort {
            keys.sort();
        }
        for key in keys {
            println!("{}", key);
        }
        Ok(())
    }
}
