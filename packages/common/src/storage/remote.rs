use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};

use super::error::StorageError;
use super::key::validate_key;
use super::traits::{ObjectStore, ObjectSummary};
use crate::config::S3Config;

/// S3-compatible object store.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    bucket_name: String,
    public_base: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn check_status(status: u16, op: &str, key: &str) -> Result<(), StorageError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(StorageError::BackendUnavailable(format!(
            "{op} '{key}' returned HTTP {status}"
        )))
    }
}

impl S3ObjectStore {
    /// Build a client from configuration. Does not contact the service.
    pub fn from_config(config: &S3Config) -> Result<Self, StorageError> {
        let (Some(access_key), Some(secret_key), Some(bucket_name)) = (
            non_empty(&config.access_key),
            non_empty(&config.secret_key),
            non_empty(&config.bucket),
        ) else {
            return Err(StorageError::BackendUnavailable(
                "S3 credentials or bucket are not configured".into(),
            ));
        };

        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            .map_err(|e| StorageError::BackendUnavailable(format!("invalid S3 credentials: {e}")))?;

        let endpoint = non_empty(&config.endpoint).map(|e| e.trim_end_matches('/').to_string());
        let region = match &endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config.region.parse::<Region>().map_err(|e| {
                StorageError::BackendUnavailable(format!("invalid region '{}': {e}", config.region))
            })?,
        };

        let bucket = Bucket::new(bucket_name, region, credentials)?;
        let (bucket, public_base) = match endpoint {
            Some(endpoint) => (bucket.with_path_style(), format!("{endpoint}/{bucket_name}")),
            None => (
                bucket,
                format!("https://{bucket_name}.s3.{}.amazonaws.com", config.region),
            ),
        };

        Ok(Self {
            bucket,
            bucket_name: bucket_name.to_string(),
            public_base,
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn backend_id(&self) -> &str {
        &self.bucket_name
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }

    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await?;
        check_status(response.status_code(), "PUT", key)
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        match self.bucket.delete_object(key).await {
            Ok(response) if response.status_code() == 404 => Ok(false),
            Ok(response) => check_status(response.status_code(), "DELETE", key).map(|_| true),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn url(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        validate_key(key)?;
        let expiry = u32::try_from(ttl.as_secs()).unwrap_or(u32::MAX);
        Ok(self.bucket.presign_get(key, expiry, None).await?)
    }

    async fn list(&self, prefix: &str, max: usize) -> Result<Vec<ObjectSummary>, StorageError> {
        let (page, status) = self
            .bucket
            .list_page(prefix.to_string(), None, None, None, Some(max))
            .await?;
        check_status(status, "LIST", prefix)?;

        Ok(page
            .contents
            .into_iter()
            .take(max)
            .map(|object| ObjectSummary {
                url: self.public_url(&object.key),
                size: object.size,
                last_modified: DateTime::parse_from_rfc3339(&object.last_modified)
                    .ok()
                    .map(|t| t.with_timezone(&Utc)),
                key: object.key,
            })
            .collect())
    }

    async fn probe(&self) -> Result<(), StorageError> {
        let (_, status) = self
            .bucket
            .list_page(String::new(), None, None, None, Some(1))
            .await?;
        check_status(status, "probe of bucket", &self.bucket_name)
    }
}
