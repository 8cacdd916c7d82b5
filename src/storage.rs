//! Object storage and upload-log collaborators.
//!
//! The pipeline only needs "get/put bytes by key" and a small keyed metadata
//! log, so both are traits with interchangeable backends: in-memory ones for
//! tests and embedding, filesystem ones for the CLI.

use crate::error::{BillingError, Result};
use crate::types::{UploadLogEntry, UploadLogPatch};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Raw export storage keyed by file name.
pub trait ObjectStore {
    /// Fails with [`BillingError::NotFound`] when nothing is stored at `key`.
    fn fetch_object(&self, key: &str) -> Result<Vec<u8>>;

    /// Store `bytes` at `key`, replacing any existing object.
    fn put_object(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// Metadata about uploads, keyed by file name.
pub trait UploadLog {
    fn get_entry(&self, key: &str) -> Result<Option<UploadLogEntry>>;

    /// Merge `patch` into the entry at `key`, creating it if needed.
    fn upsert_entry(&self, key: &str, patch: UploadLogPatch) -> Result<UploadLogEntry>;

    /// Every entry, in no particular order.
    fn list_entries(&self) -> Result<Vec<UploadLogEntry>>;
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding the lock cannot leave a map half-written.
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn fetch_object(&self, key: &str) -> Result<Vec<u8>> {
        lock(&self.objects)
            .get(key)
            .cloned()
            .ok_or_else(|| BillingError::NotFound(key.to_string()))
    }

    fn put_object(&self, key: &str, bytes: &[u8]) -> Result<()> {
        lock(&self.objects).insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Use `root` as the object directory, creating it if missing.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(&['/', '\\', '\0'][..]);
        if !valid {
            return Err(BillingError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

impl ObjectStore for FsObjectStore {
    fn fetch_object(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BillingError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn put_object(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "stored object");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryUploadLog {
    entries: Mutex<BTreeMap<String, UploadLogEntry>>,
}

impl MemoryUploadLog {
    pub fn new() -> Self {
        Self::default()
    }
}

fn merge_into(
    entries: &mut BTreeMap<String, UploadLogEntry>,
    key: &str,
    patch: UploadLogPatch,
) -> UploadLogEntry {
    let entry = entries.entry(key.to_string()).or_insert_with(|| UploadLogEntry {
        key: key.to_string(),
        ..Default::default()
    });
    entry.merge(patch);
    entry.clone()
}

impl UploadLog for MemoryUploadLog {
    fn get_entry(&self, key: &str) -> Result<Option<UploadLogEntry>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn upsert_entry(&self, key: &str, patch: UploadLogPatch) -> Result<UploadLogEntry> {
        Ok(merge_into(&mut lock(&self.entries), key, patch))
    }

    fn list_entries(&self) -> Result<Vec<UploadLogEntry>> {
        Ok(lock(&self.entries).values().cloned().collect())
    }
}

/// Upload log persisted as a single pretty-printed JSON object keyed by
/// file name. The whole file is rewritten on every upsert.
#[derive(Debug)]
pub struct JsonFileUploadLog {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileUploadLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, UploadLogEntry>> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl UploadLog for JsonFileUploadLog {
    fn get_entry(&self, key: &str) -> Result<Option<UploadLogEntry>> {
        Ok(self.read_all()?.remove(key))
    }

    fn upsert_entry(&self, key: &str, patch: UploadLogPatch) -> Result<UploadLogEntry> {
        let _guard = lock(&self.write_lock);
        let mut entries = self.read_all()?;
        let entry = merge_into(&mut entries, key, patch);
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        debug!(key, path = %self.path.display(), "upserted upload log entry");
        Ok(entry)
    }

    fn list_entries(&self) -> Result<Vec<UploadLogEntry>> {
        Ok(self.read_all()?.into_values().collect())
    }
}
