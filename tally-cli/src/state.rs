use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `~/.tally`, or `$TALLY_HOME` when set.
pub fn tally_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("TALLY_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".tally"))
}

pub fn ensure_tally_home() -> Result<PathBuf> {
    let dir = tally_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_cache_path() -> Result<PathBuf> {
    Ok(ensure_tally_home()?.join("classifications.json"))
}
