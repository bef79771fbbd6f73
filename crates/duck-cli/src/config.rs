//! Configuration file parsing for duck.toml.

use duck_db::DbConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// Config file names to search for
const CONFIG_NAMES: &[&str] = &["duck.toml", ".duckrc.toml"];

/// Main configuration structure.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Store location and value encoding
    #[serde(default)]
    pub database: DbConfig,
}

impl Config {
    /// Apply command-line overrides on top of the file settings.
    pub fn with_overrides(mut self, path: Option<PathBuf>, encoding: Option<String>) -> Self {
        if let Some(path) = path {
            self.database.path = path;
        }
        if let Some(encoding) = encoding {
            self.database.encoding = encoding;
        }
        self
    }
}

/// Load configuration from a file or search for default config files.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config_path = match path {
        Some(path) if !path.exists() => {
            anyhow::bail!("config file {} does not exist", path.display())
        }
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
            tracing::debug!("Loaded config from {:?}", path);
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

/// Search the current directory, its parents, then the user config directory.
fn find_config_file() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;

    let mut dir = Some(cwd.as_path());
    while let Some(current) = dir {
        if let Some(path) = find_in(current) {
            return Some(path);
        }
        dir = current.parent();
    }

    dirs::config_dir().and_then(|config| find_in(&config.join("duck")))
}

fn find_in(dir: &Path) -> Option<PathBuf> {
    CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.path, PathBuf::from(duck_db::DEFAULT_PATH));
        assert_eq!(config.database.encoding, duck_db::DEFAULT_ENCODING);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[database]
path = "/srv/duck/state"
encoding = "latin-1"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/srv/duck/state"));
        assert_eq!(config.database.encoding, "latin-1");
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str("[database]\nencoding = \"ascii\"\n").unwrap();
        assert_eq!(config.database.path, PathBuf::from(duck_db::DEFAULT_PATH));
        assert_eq!(config.database.encoding, "ascii");

        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.database, DbConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::default().with_overrides(Some(PathBuf::from("/tmp/x")), None);
        assert_eq!(config.database.path, PathBuf::from("/tmp/x"));
        assert_eq!(config.database.encoding, duck_db::DEFAULT_ENCODING);
    }

    #[test]
    fn test_load_explicit_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("duck.toml");
        std::fs::write(&path, "[database]\npath = \"/tmp/explicit\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/explicit"));

        assert!(load_config(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_find_in_prefers_first_name() {
        let dir = TempDir::new().unwrap();
        assert_eq!(find_in(dir.path()), None);

        std::fs::write(dir.path().join(".duckrc.toml"), "").unwrap();
        assert_eq!(find_in(dir.path()), Some(dir.path().join(".duckrc.toml")));

        std::fs::write(dir.path().join("duck.toml"), "").unwrap();
        assert_eq!(find_in(dir.path()), Some(dir.path().join("duck.toml")));
    }
}
