use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of content a comment is attached to.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    #[sea_orm(string_value = "blog")]
    Blog,
    #[sea_orm(string_value = "news")]
    News,
    #[sea_orm(string_value = "event")]
    Event,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub author_name: String,
    pub author_email: Option<String>,

    pub user_id: Option<i32>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    /// Owner discriminator; together with `content_id` forms the owner reference.
    #[sea_orm(indexed)]
    pub content_type: ContentKind,
    #[sea_orm(indexed)]
    pub content_id: i32,

    /// Comment this one replies to. Always has the same owner.
    #[sea_orm(indexed)]
    pub parent_id: Option<i32>,

    #[sea_orm(default_value = false, indexed)]
    pub is_approved: bool,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
