use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blog")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub introduction: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub content: String, // HTML
    pub author_name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub author_bio: Option<String>,

    pub author_id: Option<i32>,
    #[sea_orm(belongs_to, from = "author_id", to = "id")]
    pub author: HasOne<super::user::Entity>,

    pub category_id: Option<i32>,
    #[sea_orm(belongs_to, from = "category_id", to = "id")]
    pub category: HasOne<super::blog_category::Entity>,

    pub featured_image_id: Option<i32>,
    #[sea_orm(belongs_to, from = "featured_image_id", to = "id")]
    pub featured_image: HasOne<super::stored_file::Entity>,

    /// Open Graph image; checked against `stored_file` on write.
    #[sea_orm(indexed)]
    pub og_image_id: Option<i32>,

    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
    pub seo_title: Option<String>,
    pub meta_description: Option<String>,

    #[sea_orm(indexed)]
    pub publish_date: DateTimeUtc,
    #[sea_orm(default_value = true, indexed)]
    pub is_published: bool,
    #[sea_orm(default_value = 0)]
    pub view_count: i32,
    #[sea_orm(default_value = 1)]
    pub reading_time_minutes: i32,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
