use chrono::{DateTime, Utc};
use common::FileType;
use common::storage::ObjectSummary;
use serde::{Deserialize, Serialize};

use crate::entity::stored_file;

/// Default lifetime of a presigned URL, in seconds.
pub const DEFAULT_URL_TTL: u64 = 3600;
/// Longest lifetime S3 accepts for a presigned URL (7 days).
pub const MAX_URL_TTL: u64 = 7 * 24 * 3600;

/// Multipart form accepted by the upload endpoint (documentation only).
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Defaults to `other`. Also the storage folder.
    pub file_type: Option<FileType>,
    pub related_entity_id: Option<i32>,
    /// Overrides the server's default image compression setting.
    pub compress: Option<bool>,
}

#[derive(Serialize, Clone, utoipa::ToSchema)]
pub struct StoredFileResponse {
    pub id: i32,
    #[schema(example = "0b6f1c2a9d8e4f3a8c7b6a5d4e3f2a1b.jpg")]
    pub filename: String,
    #[schema(example = "team-photo.jpg")]
    pub original_filename: String,
    /// Storage key.
    #[schema(example = "blog_image/0b6f1c2a9d8e4f3a8c7b6a5d4e3f2a1b.jpg")]
    pub file_path: String,
    pub file_type: FileType,
    #[schema(example = "image/jpeg")]
    pub content_type: String,
    pub size_bytes: i64,
    pub original_size_bytes: i64,
    pub content_hash: String,
    /// Bucket name, or `local`.
    pub bucket_name: String,
    pub public_url: Option<String>,
    pub related_entity_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<stored_file::Model> for StoredFileResponse {
    fn from(m: stored_file::Model) -> Self {
        Self {
            id: m.id,
            filename: m.filename,
            original_filename: m.original_filename,
            file_path: m.file_path,
            file_type: m.file_type,
            content_type: m.content_type,
            size_bytes: m.size_bytes,
            original_size_bytes: m.original_size_bytes,
            content_hash: m.content_hash,
            bucket_name: m.bucket_name,
            public_url: m.public_url,
            related_entity_id: m.related_entity_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FileListQuery {
    pub file_type: Option<FileType>,
    pub related_entity_id: Option<i32>,
    pub skip: Option<u64>,
    /// 1-100, default 20.
    pub limit: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FileListResponse {
    pub files: Vec<StoredFileResponse>,
    /// Total matching files, ignoring `skip`/`limit`.
    pub count: u64,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FileUrlQuery {
    /// Lifetime in seconds (1-604800, default 3600). Ignored by local storage.
    pub expires_in: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FileUrlResponse {
    pub url: String,
    pub expires_in: u64,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ObjectListQuery {
    #[serde(default)]
    pub prefix: String,
    /// 1-1000, default 100.
    pub max: Option<usize>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ObjectSummaryResponse {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub url: String,
}

impl From<ObjectSummary> for ObjectSummaryResponse {
    fn from(o: ObjectSummary) -> Self {
        Self {
            key: o.key,
            size: o.size,
            last_modified: o.last_modified,
            url: o.url,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ObjectListResponse {
    /// Active backend identifier.
    pub backend: String,
    pub objects: Vec<ObjectSummaryResponse>,
    pub count: usize,
}
