use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Durable string blobs addressed by a fixed key.
///
/// `load` never fails: a missing or unreadable entry is simply absent.
pub trait KeyValueStore {
  fn load(&self, key: &str) -> Option<String>;
  fn save(&mut self, key: &str, value: &str) -> Result<()>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
  dir: PathBuf,
}

impl FileStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  /// Store rooted at the platform data directory (e.g. `~/.local/share/flick`).
  pub fn in_data_dir() -> Result<Self> {
    let proj_dirs = ProjectDirs::from("", "", "flick").context("Could not determine a home directory")?;
    Ok(Self::new(proj_dirs.data_dir()))
  }

  fn path_for(&self, key: &str) -> PathBuf {
    self.dir.join(format!("{}.json", key))
  }
}

impl KeyValueStore for FileStore {
  fn load(&self, key: &str) -> Option<String> {
    std::fs::read_to_string(self.path_for(key)).ok()
  }

  fn save(&mut self, key: &str, value: &str) -> Result<()> {
    std::fs::create_dir_all(&self.dir).with_context(|| format!("Failed to create {}", self.dir.display()))?;
    let path = self.path_for(key);
    std::fs::write(&path, value).with_context(|| format!("Failed to write {}", path.display()))
  }
}

/// In-process store. Clones share the same map, so a test can keep a handle
/// and inspect what a store wrote through.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  entries: Arc<Mutex<HashMap<String, String>>>,
}

#[cfg(test)]
impl MemoryStore {
  pub fn with_entry(key: &str, value: &str) -> Self {
    let store = Self::default();
    if let Ok(mut entries) = store.entries.lock() {
      entries.insert(key.to_string(), value.to_string());
    }
    store
  }
}

impl KeyValueStore for MemoryStore {
  fn load(&self, key: &str) -> Option<String> {
    self.entries.lock().ok()?.get(key).cloned()
  }

  fn save(&mut self, key: &str, value: &str) -> Result<()> {
    let mut entries = self.entries.lock().map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
    entries.insert(key.to_string(), value.to_string());
    Ok(())
  }
}
