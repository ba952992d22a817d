//! JSON-backed storage for named collections.
//!
//! Every collection lives in its own file under a single data directory. Loading
//! is permissive: a missing, empty or unparseable file reads as the empty
//! collection so a damaged file never blocks startup. Only genuine I/O failures
//! surface as errors.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{Result, TolkError};

#[derive(Debug, Clone)]
pub struct JsonStore {
    data_dir: PathBuf,
}

impl JsonStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the named resource
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Load a named collection, falling back to the empty collection
    pub async fn load<T>(&self, name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path_of(name);

        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No stored data at {}, starting empty", path.display());
                return Ok(T::default());
            }
            Err(e) => {
                return Err(TolkError::Persistence(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }

        // Invalid UTF-8 is rejected by the parser like any other corrupt content
        match serde_json::from_slice::<T>(&content) {
            Ok(collection) => Ok(collection),
            Err(e) => {
                warn!("Ignoring malformed data in {}: {}", path.display(), e);
                Ok(T::default())
            }
        }
    }

    /// Replace a named collection with `collection`
    pub async fn save<T>(&self, name: &str, collection: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let path = self.path_of(name);
        let content = serde_json::to_string_pretty(collection)?;

        fs::create_dir_all(&self.data_dir).await.map_err(|e| {
            TolkError::Persistence(format!(
                "Failed to create {}: {}",
                self.data_dir.display(),
                e
            ))
        })?;

        // Readers see either the old file or the new one, never a partial write
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await.map_err(|e| {
            TolkError::Persistence(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        fs::rename(&tmp_path, &path).await.map_err(|e| {
            TolkError::Persistence(format!("Failed to replace {}: {}", path.display(), e))
        })?;

        debug!("Saved {}", path.display());
        Ok(())
    }
}
