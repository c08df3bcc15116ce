use std::future::Future;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::fs::File;

use super::error::StorageError;
use super::filesystem::{LOCAL_BACKEND_ID, LocalObjectStore};
use super::key::generate_object_name;
use super::remote::S3ObjectStore;
use super::traits::{ObjectStore, ObjectSummary};
use crate::config::StorageConfig;

/// The backend chosen at startup. Never changes for the process lifetime.
pub enum Backend {
    Remote(S3ObjectStore),
    Local(LocalObjectStore),
}

/// Metadata of a freshly written object, ready to be persisted.
#[derive(Debug, Clone)]
pub struct UploadedObject {
    pub key: String,
    pub filename: String,
    pub public_url: String,
    pub size_bytes: u64,
    /// Hex SHA-256 of the stored bytes.
    pub content_hash: String,
    /// Bucket name for the remote backend, `local` for disk.
    pub backend: String,
}

/// Facade over the active [`Backend`] that enforces size limits and timeouts.
pub struct StorageAdapter {
    backend: Backend,
    /// Disk store for objects written before the remote backend was configured.
    local: LocalObjectStore,
    timeout: Duration,
    max_upload_size: u64,
}

impl StorageAdapter {
    /// Select a backend from configuration.
    ///
    /// The remote store is preferred; any reason it cannot be used (forced
    /// local mode, missing settings, failed probe) falls back to local disk.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let timeout = Duration::from_secs(config.request_timeout_secs.max(1));

        let remote = if config.use_local {
            tracing::info!("Local storage forced by configuration");
            None
        } else {
            match S3ObjectStore::from_config(&config.s3) {
                Ok(store) => match tokio::time::timeout(timeout, store.probe()).await {
                    Ok(Ok(())) => Some(store),
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "S3 probe failed, falling back to local storage");
                        None
                    }
                    Err(_) => {
                        tracing::warn!(
                            timeout_secs = timeout.as_secs(),
                            "S3 probe timed out, falling back to local storage"
                        );
                        None
                    }
                },
                Err(e) => {
                    tracing::warn!(error = %e, "S3 unavailable, falling back to local storage");
                    None
                }
            }
        };

        let backend = match remote {
            Some(store) => {
                tracing::info!(bucket = store.backend_id(), "Using S3 storage");
                Backend::Remote(store)
            }
            None => {
                if config.local_path.as_os_str().is_empty() {
                    return Err(StorageError::BackendUnavailable(
                        "no remote backend and no local storage path configured".into(),
                    ));
                }
                let store = LocalObjectStore::new(config.local_path.clone(), &config.local_base_url)
                    .await
                    .map_err(|e| {
                        StorageError::BackendUnavailable(format!(
                            "cannot prepare local storage at {}: {e}",
                            config.local_path.display()
                        ))
                    })?;
                tracing::info!(path = %config.local_path.display(), "Using local storage");
                Backend::Local(store)
            }
        };

        Ok(Self::with_backend(backend, config))
    }

    /// Wrap an already constructed backend.
    pub fn with_backend(backend: Backend, config: &StorageConfig) -> Self {
        let local = match &backend {
            Backend::Local(store) => store.clone(),
            Backend::Remote(_) => {
                LocalObjectStore::open(config.local_path.clone(), &config.local_base_url)
            }
        };
        Self {
            backend,
            local,
            timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
            max_upload_size: config.max_upload_size,
        }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.backend, Backend::Remote(_))
    }

    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    fn active(&self) -> &dyn ObjectStore {
        match &self.backend {
            Backend::Remote(store) => store,
            Backend::Local(store) => store,
        }
    }

    /// Identifier of the active backend.
    pub fn backend_id(&self) -> &str {
        self.active().backend_id()
    }

    /// Resolve the store that owns objects tagged with `hint`.
    fn owner(&self, hint: &str) -> Result<&dyn ObjectStore, StorageError> {
        if hint == LOCAL_BACKEND_ID {
            return Ok(&self.local);
        }
        match &self.backend {
            Backend::Remote(store) if store.backend_id() == hint => Ok(store),
            _ => Err(StorageError::BackendUnavailable(format!(
                "no configured backend owns '{hint}'"
            ))),
        }
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| StorageError::Timeout(self.timeout))?
    }

    /// Store `content` under a generated name in `folder`.
    pub async fn upload(
        &self,
        content: &[u8],
        declared_name: &str,
        folder: &str,
        content_type: &str,
    ) -> Result<UploadedObject, StorageError> {
        if content.is_empty() {
            return Err(StorageError::EmptyPayload);
        }
        let size = content.len() as u64;
        if size > self.max_upload_size {
            return Err(StorageError::PayloadTooLarge {
                actual: size,
                limit: self.max_upload_size,
            });
        }

        let (filename, key) = generate_object_name(folder, declared_name)?;
        let store = self.active();
        self.with_timeout(store.put(&key, content, content_type))
            .await?;

        tracing::info!(key = %key, size, backend = store.backend_id(), "Object stored");

        Ok(UploadedObject {
            public_url: store.public_url(&key),
            content_hash: hex::encode(Sha256::digest(content)),
            backend: store.backend_id().to_string(),
            filename,
            key,
            size_bytes: size,
        })
    }

    /// Delete an object from the backend named by `backend_hint`.
    ///
    /// Returns `false` when the object was already gone.
    pub async fn delete(&self, key: &str, backend_hint: &str) -> Result<bool, StorageError> {
        let store = self.owner(backend_hint)?;
        self.with_timeout(store.delete(key)).await
    }

    /// Read URL for an object on the backend that owns it.
    pub async fn url_for(
        &self,
        key: &str,
        backend_hint: &str,
        ttl_seconds: u64,
    ) -> Result<String, StorageError> {
        let store = self.owner(backend_hint)?;
        self.with_timeout(store.url(key, Duration::from_secs(ttl_seconds)))
            .await
    }

    pub async fn list(&self, prefix: &str, max: usize) -> Result<Vec<ObjectSummary>, StorageError> {
        self.with_timeout(self.active().list(prefix, max)).await
    }

    /// Open an object kept on local disk.
    pub async fn open_local(&self, key: &str) -> Result<(File, u64), StorageError> {
        self.with_timeout(self.local.open_read(key)).await
    }
}
