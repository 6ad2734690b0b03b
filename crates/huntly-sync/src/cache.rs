//! Seen-message cache persisted as a JSON file.
//!
//! A flat JSON array of message ids. Loading a missing file yields the
//! empty set so first runs need no setup; saving writes the whole set
//! back in one shot.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use huntly_core::{Result, SeenCache};

/// File-backed [`SeenCache`].
pub struct JsonFileCache {
    path: PathBuf,
}

impl JsonFileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SeenCache for JsonFileCache {
    fn load(&self) -> Result<HashSet<String>> {
        if !self.path.exists() {
            return Ok(HashSet::new());
        }
        let text = fs::read_to_string(&self.path)?;
        let ids: HashSet<String> = serde_json::from_str(&text)?;
        debug!(count = ids.len(), path = %self.path.display(), "Loaded seen cache");
        Ok(ids)
    }

    fn save(&self, seen: &HashSet<String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut ids: Vec<&String> = seen.iter().collect();
        ids.sort();
        fs::write(&self.path, serde_json::to_string_pretty(&ids)?)?;
        debug!(count = seen.len(), path = %self.path.display(), "Saved seen cache");
        Ok(())
    }
}

/// Discards everything. Forces full reprocessing on every run, which the
/// idempotent merge makes safe.
#[derive(Default)]
pub struct NoopCache;

impl SeenCache for NoopCache {
    fn load(&self) -> Result<HashSet<String>> {
        Ok(HashSet::new())
    }

    fn save(&self, _seen: &HashSet<String>) -> Result<()> {
        Ok(())
    }
}
