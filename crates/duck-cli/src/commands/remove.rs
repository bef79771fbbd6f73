//! Remove command - delete records from the store.

use anyhow::Result;
use clap::Args;
use duck_db::Database;

#[derive(Args)]
pub struct RemoveCommand {
    /// Keys to remove
    #[arg(required = true)]
    pub keys: Vec<String>,
}

impl RemoveCommand {
    pub fn run(&self, db: &Database) -> Result<()> {
        let (removed, not_found) = self.remove_all(db)?;

        for key in &not_found {
            println!("Key '{}' not found.", key);
        }

        if removed.is_empty() {
            println!("No keys were removed.");
        } else {
            println!("Removed {} key(s).", removed.len());
        }

        Ok(())
    }

    fn remove_all(&self, db: &Database) -> Result<(Vec<&str>, Vec<&str>)> {
        let mut removed = Vec::new();
        let mut not_found = Vec::new();

        db.scope(|session| {
            for key in &self.keys {
                if session.remove(key)? {
                    removed.push(key.as_str());
                } else {
                    not_found.push(key.as_str());
                }
            }
            Ok(())
        })?;

        Ok((removed, not_found))
    }
}
