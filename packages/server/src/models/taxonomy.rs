use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{blog_category, category, tag};
use crate::error::AppError;

use super::shared::{double_option, validate_len, validate_max_len};

pub fn validate_name(name: &str) -> Result<(), AppError> {
    validate_len(name, "Name", 1, 100)
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTagRequest {
    #[schema(example = "community")]
    pub name: String,
}

#[derive(Serialize, Clone, utoipa::ToSchema)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<tag::Model> for TagResponse {
    fn from(m: tag::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            created_at: m.created_at,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCategoryRequest {
    #[schema(example = "Announcements")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

#[derive(Serialize, Clone, utoipa::ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<category::Model> for CategoryResponse {
    fn from(m: category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateBlogCategoryRequest {
    #[schema(example = "Engineering")]
    pub name: String,
    /// Derived from the name when absent.
    pub slug: Option<String>,
    pub description: Option<String>,
}

#[derive(Serialize, Clone, utoipa::ToSchema)]
pub struct BlogCategoryResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<blog_category::Model> for BlogCategoryResponse {
    fn from(m: blog_category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
            description: m.description,
            created_at: m.created_at,
        }
    }
}

pub fn validate_category(name: &str, description: Option<&str>) -> Result<(), AppError> {
    validate_name(name)?;
    validate_max_len(description, "Description", 1000)
}
