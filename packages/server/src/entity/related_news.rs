use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "related_news")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub news_id: i32,
    #[sea_orm(primary_key)]
    pub related_news_id: i32,

    #[sea_orm(belongs_to, from = "news_id", to = "id")]
    pub news: HasOne<super::news::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
