use common::FileType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An object written through the storage adapter.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stored_file")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Generated unique name (UUID hex + extension).
    pub filename: String,
    pub original_filename: String,
    /// Storage key: `{file_type}/{filename}`.
    #[sea_orm(unique)]
    pub file_path: String,
    #[sea_orm(indexed)]
    pub file_type: FileType,
    pub content_type: String,
    pub size_bytes: i64,
    /// Size before image normalization.
    pub original_size_bytes: i64,
    /// SHA-256 of the stored bytes, hex encoded.
    pub content_hash: String,
    /// Backend identifier: bucket name, or `local`.
    pub bucket_name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub public_url: Option<String>,
    /// Untyped pointer to whatever the upload belongs to.
    #[sea_orm(indexed)]
    pub related_entity_id: Option<i32>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
