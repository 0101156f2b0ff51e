//! File-backed storage backend.
//!
//! Each key is written to its own JSON file, named by the SHA-256 of the key.
//! The entry records its full key, so hash collisions read as absent.
//! Writes go to a unique temporary file in the same directory and are
//! renamed into place, so concurrent writers to one key never share a file.

use std::fs;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dc_core::{DataResponse, SourceParams, StorageError};
use dc_source::SourceStorage;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::entry::StoredEntry;
use crate::TRACING_TARGET;

const ENTRY_EXTENSION: &str = "json";
const TEMP_PREFIX: &str = ".entry-";
const TEMP_SUFFIX: &str = ".tmp";

/// Storage writing one JSON file per key under a directory.
pub struct FileStorage<T> {
    dir: PathBuf,
    ttl: Option<Duration>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for FileStorage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStorage")
            .field("dir", &self.dir)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl<T> FileStorage<T> {
    /// Open a storage under `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            ttl: None,
            _marker: PhantomData,
        })
    }

    /// Set the time-to-live for stored entries.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Get the storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the configured TTL.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Path of the file holding `key`.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir
            .join(format!("{}.{}", hex::encode(digest), ENTRY_EXTENSION))
    }

    fn remove_entry(&self, path: &Path) -> Result<(), StorageError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn clear_all(&self) -> Result<(), StorageError> {
        let mut removed = 0usize;
        for dirent in fs::read_dir(&self.dir)? {
            let path = dirent?.path();
            if path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) {
                self.remove_entry(&path)?;
                removed += 1;
            }
        }
        tracing::debug!(target: TRACING_TARGET, dir = %self.dir.display(), removed, "cleared file storage");
        Ok(())
    }
}

impl<T: DeserializeOwned> FileStorage<T> {
    /// Read the live entry for `key`, removing it if expired.
    fn read_entry(&self, key: &str) -> Result<Option<StoredEntry<T>>, StorageError> {
        let path = self.entry_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let entry: StoredEntry<T> = serde_json::from_slice(&bytes)?;
        if entry.key != key {
            tracing::warn!(
                target: TRACING_TARGET,
                path = %path.display(),
                stored_key = %entry.key,
                key,
                "entry file holds a different key"
            );
            return Ok(None);
        }

        if entry.is_expired(self.ttl) {
            self.remove_entry(&path)?;
            tracing::debug!(target: TRACING_TARGET, key, "dropped expired file entry");
            return Ok(None);
        }

        Ok(Some(entry))
    }
}

impl<T> SourceStorage<T> for FileStorage<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn store(&self, response: &DataResponse<T>) -> Result<(), StorageError> {
        let key = response.params.cache_key();
        let entry = StoredEntry {
            key: key.clone(),
            origin: response.source_type,
            stored_at: chrono::Utc::now(),
            data: &response.data,
        };
        let bytes = serde_json::to_vec(&entry)?;

        // Dropping the temp file on any failure removes it
        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(self.entry_path(&key))
            .map_err(|err| StorageError::Io(err.error))?;
        Ok(())
    }

    fn stored_data(&self, params: &SourceParams) -> Result<Option<T>, StorageError> {
        Ok(self.read_entry(&params.cache_key())?.map(|entry| entry.data))
    }

    fn clear_stored_data(&self, params: &SourceParams) -> Result<(), StorageError> {
        if params.is_default() {
            return self.clear_all();
        }
        self.remove_entry(&self.entry_path(&params.cache_key()))
    }

    fn has_stored_data(&self, params: &SourceParams) -> Result<bool, StorageError> {
        Ok(self.read_entry(&params.cache_key())?.is_some())
    }
}
