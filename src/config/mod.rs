use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::db::{Database, DEFAULT_BUSY_TIMEOUT_MS};
use crate::error::{Error, Result};

/// `[database]` block from config.toml.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
    pub busy_timeout_ms: Option<u64>,
}

/// Top-level config file structure.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load config from ~/.agent-discoveries/config.toml. Returns default if file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config {
            reason: format!("failed to parse config.toml: {e}"),
        })
    }

    /// Resolve the database path: explicit flag/env > config file > default.
    pub fn resolve_db_path(&self, cli_flag: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = cli_flag {
            return Ok(path);
        }
        if let Some(ref path) = self.database.path {
            return Ok(path.clone());
        }
        Database::default_db_path()
    }

    pub fn busy_timeout_ms(&self) -> u64 {
        self.database
            .busy_timeout_ms
            .unwrap_or(DEFAULT_BUSY_TIMEOUT_MS)
    }
}

/// Path to the config file: ~/.agent-discoveries/config.toml
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| Error::Config {
        reason: "could not determine home directory".to_string(),
    })?;
    Ok(home.join(".agent-discoveries").join("config.toml"))
}

/// Default config template content.
pub fn default_config_template() -> &'static str {
    r#"# ~/.agent-discoveries/config.toml
# Database path resolution order: --db flag > AGENT_DISCOVERIES_DB env var > database.path

[database]
# path = "/var/lib/agent-discoveries/agent-discoveries.db"
# busy_timeout_ms = 5000
"#
}

/// Create the default config file if it doesn't already exist.
pub fn init_config() -> Result<bool> {
    let path = config_path()?;
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, default_config_template())?;
    Ok(true)
}
