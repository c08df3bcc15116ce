use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Directed "see also" link between two blog posts.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "related_blog")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub blog_id: i32,
    #[sea_orm(primary_key)]
    pub related_blog_id: i32,

    #[sea_orm(belongs_to, from = "blog_id", to = "id")]
    pub blog: HasOne<super::blog::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
