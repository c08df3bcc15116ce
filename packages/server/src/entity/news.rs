use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "news")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub author: Option<String>,
    pub source: Option<String>,
    pub contact_info: Option<String>,

    pub category_id: Option<i32>,
    #[sea_orm(belongs_to, from = "category_id", to = "id")]
    pub category: HasOne<super::category::Entity>,

    pub featured_image_id: Option<i32>,
    #[sea_orm(belongs_to, from = "featured_image_id", to = "id")]
    pub featured_image: HasOne<super::stored_file::Entity>,

    #[sea_orm(indexed)]
    pub publish_date: DateTimeUtc,
    #[sea_orm(default_value = true, indexed)]
    pub is_published: bool,
    #[sea_orm(default_value = 0)]
    pub view_count: i32,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
