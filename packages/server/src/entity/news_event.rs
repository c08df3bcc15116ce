use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cross-reference between a news item and an event.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "news_event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub news_id: i32,
    #[sea_orm(primary_key)]
    pub event_id: i32,

    #[sea_orm(belongs_to, from = "news_id", to = "id")]
    pub news: HasOne<super::news::Entity>,
    #[sea_orm(belongs_to, from = "event_id", to = "id")]
    pub event: HasOne<super::event::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
