use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_mailbox() -> String {
    "INBOX".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite file for accounts and cached summaries.
    pub db_path: Option<String>,
    #[serde(default = "default_mailbox")]
    pub mailbox: String,
    /// Account the inbox opens on start.
    pub default_account: Option<String>,
    /// Keep everything in memory; nothing is written to disk or the keyring.
    #[serde(default)]
    pub volatile: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            mailbox: default_mailbox(),
            default_account: None,
            volatile: false,
        }
    }
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("inbox1"))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

pub fn default_db_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("inbox1.db");
    Ok(p)
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Reads `path`, writing a template with the defaults first if it does not exist.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let sample = Config::default();
        fs::write(path, toml::to_string_pretty(&sample)?)?;
        log::info!("created template config at {}", path.display());
        return Ok(sample);
    }
    let s = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&s)?;
    Ok(cfg)
}

pub fn resolve_db_path(cfg: &Config) -> Result<PathBuf> {
    if let Some(p) = &cfg.db_path {
        Ok(PathBuf::from(p))
    } else {
        default_db_path()
    }
}
