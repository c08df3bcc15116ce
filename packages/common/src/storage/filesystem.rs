use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;

use super::error::StorageError;
use super::key::validate_key;
use super::traits::{ObjectStore, ObjectSummary};

pub const LOCAL_BACKEND_ID: &str = "local";

const TMP_DIR: &str = ".tmp";

/// Filesystem-backed object store.
///
/// Objects live at `{base_path}/{key}`; writes go through `{base_path}/.tmp`
/// and are renamed into place.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    base_path: PathBuf,
    base_url: String,
}

impl LocalObjectStore {
    /// Create the store, creating its directories if needed.
    pub async fn new(base_path: PathBuf, base_url: &str) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(TMP_DIR)).await?;
        Ok(Self::open(base_path, base_url))
    }

    /// Handle on an existing directory without touching the filesystem.
    pub fn open(base_path: PathBuf, base_url: &str) -> Self {
        Self {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let key = validate_key(key)?;
        if key == TMP_DIR || key.starts_with(".tmp/") {
            return Err(StorageError::InvalidKey(format!("key '{key}' is reserved")));
        }
        Ok(self.base_path.join(key))
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(TMP_DIR)
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Open an object for streaming, returning the file and its size.
    pub async fn open_read(&self, key: &str) -> Result<(fs::File, u64), StorageError> {
        let path = self.object_path(key)?;
        match fs::File::open(&path).await {
            Ok(file) => {
                let size = file.metadata().await?.len();
                Ok((file, size))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn modified_at(meta: &std::fs::Metadata) -> Option<DateTime<Utc>> {
    meta.modified().ok().map(DateTime::<Utc>::from)
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn backend_id(&self) -> &str {
        LOCAL_BACKEND_ID
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    async fn put(&self, key: &str, data: &[u8], _content_type: &str) -> Result<(), StorageError> {
        let object_path = self.object_path(key)?;

        fs::create_dir_all(self.base_path.join(TMP_DIR)).await?;
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &object_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let object_path = self.object_path(key)?;
        match fs::remove_file(&object_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn url(&self, key: &str, _ttl: Duration) -> Result<String, StorageError> {
        validate_key(key)?;
        Ok(self.public_url(key))
    }

    async fn list(&self, prefix: &str, max: usize) -> Result<Vec<ObjectSummary>, StorageError> {
        let mut found = Vec::new();
        let mut pending = vec![(self.base_path.clone(), String::new())];

        while let Some((dir, rel)) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                if rel.is_empty() && name == TMP_DIR {
                    continue;
                }
                let key = if rel.is_empty() {
                    name
                } else {
                    format!("{rel}/{name}")
                };

                let meta = entry.metadata().await?;
                if meta.is_dir() {
                    pending.push((entry.path(), key));
                } else if key.starts_with(prefix) {
                    found.push(ObjectSummary {
                        url: self.public_url(&key),
                        size: meta.len(),
                        last_modified: modified_at(&meta),
                        key,
                    });
                }
            }
        }

        found.sort_by(|a, b| a.key.cmp(&b.key));
        found.truncate(max);
        Ok(found)
    }

    async fn probe(&self) -> Result<(), StorageError> {
        let meta = fs::metadata(&self.base_path).await?;
        if !meta.is_dir() {
            return Err(StorageError::BackendUnavailable(format!(
                "{} is not a directory",
                self.base_path.display()
            )));
        }
        Ok(())
    }
}
