use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::{ensure_tasksphere_home, state_path};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub display: DisplaySection,
    pub store: StoreSection,
    pub identity: IdentitySection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySection {
    /// IANA timezone for printing due dates and parsing `--due` input.
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    /// Where the document snapshot lives between runs.
    pub state_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySection {
    /// Acting user when a command omits `--as`.
    pub default_user: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display: DisplaySection {
                timezone: "UTC".to_string(),
            },
            store: StoreSection {
                state_file: state_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "state.json".to_string()),
            },
            identity: IdentitySection { default_user: None },
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_tasksphere_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    Ok(toml::from_str(&s).context("parse config.toml")?)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let cfg = Config::default();
    save_config(&cfg)?;
    println!("Wrote {}", p.display());
    Ok(())
}
