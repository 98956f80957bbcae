//! Key-value blob persistence.
//!
//! Everything daybook persists goes through the [`BlobStore`] trait: a flat map of
//! string keys to string values. Entries, settings and analysis counters are each
//! stored under their own key (see the `KEY_*` constants).
//!
//! Two implementations are provided:
//!
//! - [`FileBlobStore`]: one file per key inside the data directory. Writes go to a
//!   temporary file that is atomically renamed into place, guarded by an advisory
//!   lock so two daybook processes never interleave writes.
//! - [`MemoryBlobStore`]: an in-memory map, used by tests and dry runs.

use crate::errors::{AppError, AppResult, StorageError};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// File extension used for blobs on disk.
const BLOB_EXTENSION: &str = "blob";
/// Name of the advisory lock file inside the data directory.
const LOCK_FILE_NAME: &str = ".lock";

/// A named string blob store.
pub trait BlobStore: Send + Sync {
    /// Returns the blob stored under `key`, or `None` if it was never written.
    fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Deletes the blob stored under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// Reads and decodes a JSON blob.
///
/// Returns `Ok(None)` when the key is missing.
///
/// # Errors
///
/// Returns `AppError::Json` if the blob exists but is not valid JSON for `T`.
pub fn read_json<T: DeserializeOwned>(store: &dyn BlobStore, key: &str) -> AppResult<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encodes `value` as JSON and stores it under `key`.
pub fn write_json<T: Serialize>(store: &dyn BlobStore, key: &str, value: &T) -> AppResult<()> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}

/// In-memory blob store.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn blobs(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map.
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.blobs().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.blobs().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.blobs().remove(key);
        Ok(())
    }
}

/// Directory-backed blob store.
///
/// # Examples
///
/// ```no_run
/// use daybook::storage::{BlobStore, FileBlobStore};
/// use std::path::Path;
///
/// let store = FileBlobStore::open(Path::new("/home/me/.daybook"))?;
/// store.set("test_mode", "true")?;
/// assert_eq!(store.get("test_mode")?.as_deref(), Some("true"));
/// # Ok::<(), daybook::AppError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Opens the store rooted at `dir`, creating the directory with owner-only
    /// permissions if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `AppError::Config` if `dir` is not absolute
    /// - `AppError::Io` if the directory cannot be created
    pub fn open(dir: &Path) -> AppResult<Self> {
        if !dir.is_absolute() {
            return Err(AppError::Config(format!(
                "Data directory path must be absolute: {}",
                dir.display()
            )));
        }

        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                AppError::Io(io::Error::new(
                    e.kind(),
                    format!("Failed to create data directory: {}", e),
                ))
            })?;

            #[cfg(unix)]
            {
                fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
                debug!("Set 0o700 permissions on data directory");
            }
        }

        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Directory holding the blobs.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()).into());
        }
        Ok(self.dir.join(format!("{}.{}", key, BLOB_EXTENSION)))
    }

    fn acquire_lock(&self) -> AppResult<fs::File> {
        let lock_path = self.dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|source| StorageError::Access {
                key: LOCK_FILE_NAME.to_string(),
                source,
            })?;

        file.try_lock_exclusive().map_err(|e| {
            if e.kind() == fs2::lock_contended_error().kind() {
                StorageError::Busy { path: lock_path }
            } else {
                StorageError::Access {
                    key: LOCK_FILE_NAME.to_string(),
                    source: e,
                }
            }
        })?;

        Ok(file)
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Access {
                key: key.to_string(),
                source,
            }
            .into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        let _lock = self.acquire_lock()?;

        let access = |source: io::Error| StorageError::Access {
            key: key.to_string(),
            source,
        };

        let mut temp = tempfile::NamedTempFile::new_in(&self.dir).map_err(access)?;
        temp.write_all(value.as_bytes()).map_err(access)?;
        temp.as_file().sync_all().map_err(access)?;

        #[cfg(unix)]
        temp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(access)?;

        temp.persist(&path).map_err(|e| access(e.error))?;
        debug!("Wrote blob '{}' ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        let _lock = self.acquire_lock()?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Tried to remove missing blob '{}'", key);
                Ok(())
            }
            Err(source) => Err(StorageError::Access {
                key: key.to_string(),
                source,
            }
            .into()),
        }
    }
}
