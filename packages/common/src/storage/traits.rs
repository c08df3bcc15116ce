use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::StorageError;

/// One entry of a backend listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub url: String,
}

/// Key-addressed object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Identifier persisted with each stored file: the bucket name, or `local`.
    fn backend_id(&self) -> &str;

    /// Stable public URL of an object. Does not check existence.
    fn public_url(&self, key: &str) -> String;

    /// Write an object, replacing any existing one at `key`.
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError>;

    /// Delete an object.
    ///
    /// Returns `true` if the object was deleted, `false` if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    /// A URL granting read access for roughly `ttl`.
    async fn url(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;

    /// List up to `max` objects whose key starts with `prefix`.
    async fn list(&self, prefix: &str, max: usize) -> Result<Vec<ObjectSummary>, StorageError>;

    /// Cheap reachability check used when the backend is selected.
    async fn probe(&self) -> Result<(), StorageError>;
}
