//! Filesystem storage for session tokens.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use agon_core::Result;
use agon_core::error::{Error, StorageError};
use agon_core::traits::{StorageKey, TokenStore};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

/// On-disk layout of the token file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(default)]
    values: BTreeMap<String, String>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// A [`TokenStore`] persisted as a small JSON file.
///
/// Writers take an exclusive `fs2` lock on a sibling `.lock` file and replace
/// the data file atomically (temp file + rename), so concurrent CLI
/// invocations never observe a half-written file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store backed by `path`. The file is created on first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The data file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the store was last written, if it exists.
    pub fn updated_at(&self) -> Result<Option<DateTime<Utc>>> {
        let _lock = self.lock(false)?;
        Ok(self.read()?.updated_at)
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn lock(&self, exclusive: bool) -> Result<StoreLock> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io(e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| self.io(e))?;

        if exclusive {
            FileExt::lock_exclusive(&file).map_err(|e| self.io(e))?;
        } else {
            FileExt::lock_shared(&file).map_err(|e| self.io(e))?;
        }

        Ok(StoreLock { file })
    }

    fn read(&self) -> Result<StoredTokens> {
        if !self.path.exists() {
            return Ok(StoredTokens::default());
        }

        let json = fs::read_to_string(&self.path).map_err(|e| self.io(e))?;
        if json.trim().is_empty() {
            return Ok(StoredTokens::default());
        }

        serde_json::from_str(&json).map_err(|e| {
            Error::Storage(StorageError::Corrupt {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })
        })
    }

    fn write(&self, mut stored: StoredTokens) -> Result<()> {
        stored.updated_at = Some(Utc::now());

        let json = serde_json::to_string_pretty(&stored).map_err(|e| {
            Error::Storage(StorageError::Corrupt {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })
        })?;

        let temp_path = self.path.with_extension("tmp");
        self.write_private(&temp_path, json.as_bytes())?;

        fs::rename(&temp_path, &self.path).map_err(|e| self.io(e))?;
        Ok(())
    }

    /// Write `bytes` to a fresh file that is owner-only from creation.
    fn write_private(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        // A leftover from an interrupted write may carry wider permissions
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(self.io(e)),
        }

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(path).map_err(|e| self.io(e))?;
        file.write_all(bytes).map_err(|e| self.io(e))?;
        file.sync_all().map_err(|e| self.io(e))
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _lock = self.lock(true)?;
        let mut stored = self.read()?;
        f(&mut stored.values);
        self.write(stored)
    }

    fn io(&self, err: std::io::Error) -> Error {
        Error::Storage(StorageError::Io {
            path: self.path.display().to_string(),
            message: err.to_string(),
        })
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: StorageKey) -> Result<Option<String>> {
        let _lock = self.lock(false)?;
        Ok(self.read()?.values.remove(key.as_str()))
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.as_str().to_string(), value.to_string());
        })?;
        debug!(%key, "Stored value");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn remove(&self, key: StorageKey) -> Result<()> {
        self.update(|values| {
            values.remove(key.as_str());
        })?;
        debug!(%key, "Removed value");
        Ok(())
    }

    fn remove_all(&self, keys: &[StorageKey]) -> Result<()> {
        self.update(|values| {
            for key in keys {
                values.remove(key.as_str());
            }
        })
    }
}

/// Releases the advisory lock when dropped.
struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(error = %e, "Failed to release token store lock");
        }
    }
}
