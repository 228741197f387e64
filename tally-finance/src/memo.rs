//! Durable classification cache and the memoizing wrapper around a backend call.
//!
//! The cache file is a flat JSON object. Every label is stored twice: under the
//! description itself and under a hash of `"<chain identity>|<description>"`,
//! so a description classified under one prompt/model is reused everywhere
//! while labels from a specific chain still win when present.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Description/label pairs persisted between runs. Entries are never evicted.
#[derive(Debug, Default)]
pub struct ClassificationCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl ClassificationCache {
    /// A cache that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the whole cache file. A missing or empty file is an empty cache.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let s = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
            if s.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), entries = entries.len(), "loaded classification cache");
        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns true when the stored value changed.
    pub fn insert(&mut self, key: impl Into<String>, label: impl Into<String>) -> bool {
        let label = label.into();
        match self.entries.insert(key.into(), label.clone()) {
            Some(previous) => previous != label,
            None => true,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrite the whole cache file.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let s = serde_json::to_string_pretty(&self.entries).context("serialize classification cache")?;
        fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}

/// Cache key scoping `description` to one chain (prompt + model).
pub fn composite_key(chain_identity: &str, description: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(chain_identity.as_bytes());
    hasher.update(b"|");
    hasher.update(description.as_bytes());
    hex::encode(hasher.finalize())
}

/// Classify `description`, calling `invoke` only when neither cache key is known.
///
/// A fresh label is trimmed, stored under both keys and written to disk before
/// it is returned.
pub fn classify_memoized(
    cache: &mut ClassificationCache,
    chain_identity: &str,
    description: &str,
    invoke: impl FnOnce(&str) -> Result<String>,
) -> Result<String> {
    let chain_key = composite_key(chain_identity, description);

    let cached = cache
        .get(&chain_key)
        .or_else(|| cache.get(description))
        .map(str::to_string);

    let label = match cached {
        Some(label) => {
            debug!(description, label = %label, "cached classification");
            label
        }
        None => {
            info!(description, "evaluating");
            let label = invoke(description)?.trim().to_string();
            info!(description, label = %label, "classified");
            label
        }
    };

    let mut changed = cache.insert(chain_key, label.clone());
    changed |= cache.insert(description, label.clone());
    if changed {
        cache.flush()?;
    }

    Ok(label)
}
