//! Directory-backed key/value store with JSON values.
//!
//! Each key lives in its own `<sha256(key)>.json` file holding the original
//! key next to the value, so arbitrary path-like keys never touch the
//! filesystem namespace directly.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::Result;
use crate::io::atomic_write;

#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    key: String,
    value: Value,
}

#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
    size_limit: Option<u64>,
}

impl FileCache {
    /// The directory is created on the first write, not here.
    pub fn new(dir: impl Into<PathBuf>, size_limit: Option<u64>) -> Result<Self> {
        Ok(Self {
            dir: dir.into(),
            size_limit,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{digest:x}.json"))
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let path = self.entry_path(key);
        let data = std::fs::read(&path).ok()?;
        match serde_json::from_slice::<Entry>(&data) {
            Ok(entry) if entry.key == key => Some(entry.value),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt cache entry");
                None
            }
        }
    }

    /// Typed read; a value of the wrong shape reads as missing.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let entry = Entry {
            key: key.to_string(),
            value: serde_json::to_value(value)?,
        };
        let data = serde_json::to_vec(&entry)?;
        let path = self.entry_path(key);
        atomic_write(&path, &data)?;
        if let Some(limit) = self.size_limit {
            self.evict_to(limit, &path)?;
        }
        Ok(())
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn clear(&self) -> Result<()> {
        for (path, _, _) in self.entries()? {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_size(&self) -> u64 {
        self.entries()
            .map(|e| e.iter().map(|(_, size, _)| size).sum())
            .unwrap_or(0)
    }

    fn entries(&self) -> Result<Vec<(PathBuf, u64, SystemTime)>> {
        let mut out = Vec::new();
        let dir = match std::fs::read_dir(&self.dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(e.into()),
        };
        for entry in dir {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let meta = entry.metadata()?;
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            out.push((path, meta.len(), modified));
        }
        Ok(out)
    }

    /// Drop least recently written entries until the cache fits `limit`.
    /// The entry just written is never evicted.
    fn evict_to(&self, limit: u64, keep: &Path) -> Result<()> {
        let mut entries = self.entries()?;
        let mut total: u64 = entries.iter().map(|(_, size, _)| size).sum();
        if total <= limit {
            return Ok(());
        }
        entries.sort_by_key(|(_, _, modified)| *modified);
        for (path, size, _) in entries {
            if total <= limit {
                break;
            }
            if path == keep {
                continue;
            }
            std::fs::remove_file(&path)?;
            total = total.saturating_sub(size);
            tracing::debug!(path = %path.display(), "evicted cache entry");
        }
        Ok(())
    }
}
