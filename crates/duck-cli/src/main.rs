mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{
    get::GetCommand, keys::KeysCommand, remove::RemoveCommand, set::SetCommand,
};
use duck_db::Database;
use std::path::PathBuf;
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser)]
#[command(name = "duck-db", version, about = "Inspect and edit duck key-value stores")]
struct Cli {
    /// Store path, without the .redb extension
    #[arg(long, global = true)]
    path: Option<PathBuf>,

    /// Text encoding of stored values
    #[arg(long, global = true)]
    encoding: Option<String>,

    /// Configuration file (defaults to the nearest duck.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value stored under a key
    Get(GetCommand),
    /// Store a JSON value under a key
    Set(SetCommand),
    /// List stored keys
    Keys(KeysCommand),
    /// Remove keys
    Rm(RemoveCommand),
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = config::load_config(cli.config.as_deref())?.with_overrides(cli.path, cli.encoding);
    let db = Database::from_config(&config.database);
    tracing::debug!(store = %db.file_path().display(), "using store");

    match cli.command {
        Commands::Get(cmd) => cmd.run(&db)?,
        Commands::Set(cmd) => cmd.run(&db)?,
        Commands::Keys(cmd) => cmd.run(&db)?,
        Commands::Rm(cmd) => cmd.run(&db)?,
    }

    Ok(())
}
