//! Undo history for edited files, persisted through [`FileCache`].
//!
//! Storage layout per file path `p`:
//! - `p:counter` : next sequence number
//! - `p:entries` : keys of stored contents, oldest first
//! - `p:<n>`     : one previous file content
//!
//! Several processes may share one history directory. Every change to a
//! file's history happens under an exclusive lock on `<dir>/.lock`.

use std::fs::{File, OpenOptions};
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;

use crate::cache::FileCache;
use crate::error::Result;
use crate::io::ensure_dir;

pub const DEFAULT_MAX_HISTORY_PER_FILE: usize = 10;

const LOCK_FILE: &str = ".lock";

#[derive(Debug)]
pub struct FileHistoryManager {
    max_history_per_file: usize,
    cache: FileCache,
    // Used instead of `cache` once the configured directory proved unwritable.
    fallback: OnceLock<(TempDir, FileCache)>,
    // Held only so the private directory is removed on drop.
    _temp_dir: Option<TempDir>,
}

fn private_history() -> Result<(TempDir, FileCache)> {
    let temp = tempfile::Builder::new()
        .prefix("oh_editor_history_")
        .tempdir()?;
    let cache = FileCache::new(temp.path(), None)?;
    Ok((temp, cache))
}

fn open_lock(dir: &Path) -> Result<File> {
    ensure_dir(dir)?;
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(dir.join(LOCK_FILE))?;
    Ok(file)
}

/// Lexically resolve `.` and `..` so equivalent spellings share one history.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

impl FileHistoryManager {
    /// Without `history_dir` the history lives in a private temporary
    /// directory that is deleted when the manager is dropped. A given
    /// `history_dir` is not touched until the first edit is recorded.
    pub fn new(max_history_per_file: usize, history_dir: Option<PathBuf>) -> Result<Self> {
        let (cache, temp) = match history_dir {
            Some(dir) => (FileCache::new(dir, None)?, None),
            None => {
                let (temp, cache) = private_history()?;
                (cache, Some(temp))
            }
        };
        Ok(Self {
            max_history_per_file,
            cache,
            fallback: OnceLock::new(),
            _temp_dir: temp,
        })
    }

    pub fn cache(&self) -> &FileCache {
        match self.fallback.get() {
            Some((_, cache)) => cache,
            None => &self.cache,
        }
    }

    pub fn max_history_per_file(&self) -> usize {
        self.max_history_per_file
    }

    fn counter_key(path: &Path) -> String {
        format!("{}:counter", normalize(path).display())
    }

    fn entries_key(path: &Path) -> String {
        format!("{}:entries", normalize(path).display())
    }

    fn entry_key(path: &Path, n: u64) -> String {
        format!("{}:{n}", normalize(path).display())
    }

    fn entries(&self, path: &Path) -> Vec<String> {
        self.cache()
            .get_as::<Vec<String>>(&Self::entries_key(path))
            .unwrap_or_default()
    }

    /// Run `f` against the store while holding the directory lock. When the
    /// configured directory cannot be created or locked, switch to a private
    /// temporary one for the rest of this manager's life.
    fn locked<T>(&self, f: impl FnOnce(&FileCache) -> Result<T>) -> Result<T> {
        let file = match open_lock(self.cache().dir()) {
            Ok(file) => file,
            Err(e) if self.fallback.get().is_none() => {
                tracing::warn!(
                    dir = %self.cache.dir().display(),
                    error = %e,
                    "history directory unavailable, undo history will not persist"
                );
                let _ = self.fallback.set(private_history()?);
                open_lock(self.cache().dir())?
            }
            Err(e) => return Err(e),
        };
        let mut lock = fd_lock::RwLock::new(file);
        let _guard = lock.write()?;
        f(self.cache())
    }

    /// Record `content` as the newest history entry for `path`.
    pub fn add_history(&self, path: &Path, content: &str) -> Result<()> {
        let max = self.max_history_per_file;
        let size = self.locked(|cache| {
            let counter_key = Self::counter_key(path);
            let entries_key = Self::entries_key(path);

            let counter: u64 = cache.get_as(&counter_key).unwrap_or(0);
            let mut entries: Vec<String> = cache.get_as(&entries_key).unwrap_or_default();

            let entry_key = Self::entry_key(path, counter);
            cache.set(&entry_key, &content)?;
            entries.push(entry_key);

            while entries.len() > max {
                let oldest = entries.remove(0);
                cache.delete(&oldest)?;
            }

            cache.set(&entries_key, &entries)?;
            cache.set(&counter_key, &(counter + 1))?;
            Ok(entries.len())
        })?;

        tracing::debug!(path = %path.display(), size, "history saved");
        Ok(())
    }

    /// Pop the most recent entry for `path`.
    pub fn get_last_history(&self, path: &Path) -> Result<Option<String>> {
        if self.entries(path).is_empty() {
            return Ok(None);
        }
        self.locked(|cache| {
            let entries_key = Self::entries_key(path);
            let mut entries: Vec<String> = cache.get_as(&entries_key).unwrap_or_default();
            let Some(last_key) = entries.pop() else {
                return Ok(None);
            };
            let content = cache.get_as::<String>(&last_key);
            cache.delete(&last_key)?;
            cache.set(&entries_key, &entries)?;
            Ok(content)
        })
    }

    /// All stored contents for `path`, oldest first.
    pub fn get_all_history(&self, path: &Path) -> Vec<String> {
        self.entries(path)
            .iter()
            .filter_map(|key| self.cache().get_as::<String>(key))
            .collect()
    }

    pub fn clear_history(&self, path: &Path) -> Result<()> {
        self.locked(|cache| {
            let entries_key = Self::entries_key(path);
            for key in cache.get_as::<Vec<String>>(&entries_key).unwrap_or_default() {
                cache.delete(&key)?;
            }
            cache.delete(&entries_key)?;
            cache.delete(&Self::counter_key(path))?;
            Ok(())
        })
    }
}
