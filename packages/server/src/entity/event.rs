use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub organizer: Option<String>,
    pub venue: Option<String>,
    pub location_address: Option<String>,
    /// Free-form "lat,lng".
    pub location_coordinates: Option<String>,
    pub registration_link: Option<String>,
    #[sea_orm(default_value = false)]
    pub has_registration_form: bool,
    pub ticket_price: Option<f64>,
    #[sea_orm(default_value = true)]
    pub is_free: bool,
    pub contact_info: Option<String>,

    #[sea_orm(indexed)]
    pub start_date: DateTimeUtc,
    pub end_date: Option<DateTimeUtc>,

    pub category_id: Option<i32>,
    #[sea_orm(belongs_to, from = "category_id", to = "id")]
    pub category: HasOne<super::category::Entity>,

    pub featured_image_id: Option<i32>,
    #[sea_orm(belongs_to, from = "featured_image_id", to = "id")]
    pub featured_image: HasOne<super::stored_file::Entity>,

    #[sea_orm(default_value = true, indexed)]
    pub is_published: bool,
    #[sea_orm(default_value = 0)]
    pub view_count: i32,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
