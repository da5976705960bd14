use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use tasksphere_store::{MemoryStore, PendingAward};

pub fn tasksphere_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".tasksphere"))
}

pub fn ensure_tasksphere_home() -> Result<PathBuf> {
    let dir = tasksphere_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn state_path() -> Result<PathBuf> {
    Ok(ensure_tasksphere_home()?.join("state.json"))
}

/// Load the document snapshot into a fresh in-memory store. A missing state
/// file is an empty store, not an error.
pub async fn load_store(path: &Path) -> Result<MemoryStore> {
    let store = MemoryStore::new();
    if !path.exists() {
        return Ok(store);
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let snapshot = serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
    store
        .import(snapshot)
        .await
        .with_context(|| format!("load {}", path.display()))?;
    Ok(store)
}

pub async fn save_store(store: &MemoryStore, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let snapshot = store.export().await;
    let json = serde_json::to_string_pretty(&snapshot)?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn pending_path() -> Result<PathBuf> {
    Ok(ensure_tasksphere_home()?.join("pending.json"))
}

/// Awards a previous run could not apply; they survive here until reconcile.
pub fn load_pending(path: &Path) -> Result<Vec<PendingAward>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?)
}

pub fn save_pending(awards: &[PendingAward], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(awards)?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
