use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StorageError;
use crate::store::KeyValueStore;

type Entries = BTreeMap<String, String>;

/// Store backed by a single JSON object on disk, one string value per key.
///
/// Every operation re-reads the file, so edits made by another process
/// between calls are picked up. A missing file is an empty store. Writes go
/// through a temp file and a rename, so a crash never leaves a torn file.
///
/// The internal lock only serializes callers inside this process.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Entries, StorageError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };
        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn flush(&self, entries: &Entries) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let json = serde_json::to_vec_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json).map_err(|e| StorageError::io(&tmp_path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| StorageError::io(&tmp_path, e))?;
        }

        std::fs::rename(&tmp_path, &self.path).map_err(|e| StorageError::io(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), keys = entries.len(), "store flushed");
        Ok(())
    }

    fn with_lock<T>(&self, f: impl FnOnce() -> Result<T, StorageError>) -> Result<T, StorageError> {
        let _guard = self.guard.lock().map_err(|_| StorageError::Poisoned)?;
        f()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_lock(|| Ok(self.load()?.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_lock(|| {
            let mut entries = self.load()?;
            entries.insert(key.to_string(), value.to_string());
            self.flush(&entries)
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.with_lock(|| {
            let mut entries = self.load()?;
            if entries.remove(key).is_some() {
                self.flush(&entries)?;
            }
            Ok(())
        })
    }

    fn list_keys(&self) -> Result<Vec<String>, StorageError> {
        self.with_lock(|| Ok(self.load()?.into_keys().collect()))
    }

    fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<(), StorageError> {
        self.with_lock(|| {
            let mut entries = self.load()?;
            if entries.get(key).map(String::as_str) != expected {
                return Err(StorageError::PreconditionFailed {
                    key: key.to_string(),
                });
            }
            entries.insert(key.to_string(), value.to_string());
            self.flush(&entries)
        })
    }
}
