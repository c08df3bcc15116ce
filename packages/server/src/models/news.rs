use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::news;
use crate::error::AppError;

use super::comment::CommentResponse;
use super::shared::{ContentSummary, double_option, validate_max_len, validate_title};
use super::storage::StoredFileResponse;
use super::taxonomy::{CategoryResponse, TagResponse};

fn default_true() -> bool {
    true
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateNewsRequest {
    #[schema(example = "Community centre reopens")]
    pub title: String,
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub content: String,
    pub author: Option<String>,
    pub source: Option<String>,
    pub contact_info: Option<String>,
    pub category_id: Option<i32>,
    pub featured_image_id: Option<i32>,
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_published: bool,
    #[serde(default)]
    pub tag_ids: Vec<i32>,
    #[serde(default)]
    pub related_news_ids: Vec<i32>,
    #[serde(default)]
    pub related_event_ids: Vec<i32>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateNewsRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub summary: Option<Option<String>>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub author: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub source: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub contact_info: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub category_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub featured_image_id: Option<Option<i32>>,
    pub publish_date: Option<DateTime<Utc>>,
    pub is_published: Option<bool>,
    pub tag_ids: Option<Vec<i32>>,
    pub related_news_ids: Option<Vec<i32>>,
    pub related_event_ids: Option<Vec<i32>>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NewsListQuery {
    pub page: Option<u64>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    /// Case-insensitive match on title, content and summary.
    pub search: Option<String>,
    pub category_id: Option<i32>,
    /// Comma separated tag ids; any match.
    pub tag_ids: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Default `true`.
    pub is_published: Option<bool>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NewsListItem {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub source: Option<String>,
    pub publish_date: DateTime<Utc>,
    pub is_published: bool,
    pub view_count: i32,
    pub category: Option<CategoryResponse>,
    pub tags: Vec<TagResponse>,
    pub featured_image: Option<StoredFileResponse>,
    pub created_at: DateTime<Utc>,
}

impl NewsListItem {
    pub fn new(
        m: news::Model,
        category: Option<CategoryResponse>,
        tags: Vec<TagResponse>,
        featured_image: Option<StoredFileResponse>,
    ) -> Self {
        Self {
            id: m.id,
            title: m.title,
            slug: m.slug,
            summary: m.summary,
            author: m.author,
            source: m.source,
            publish_date: m.publish_date,
            is_published: m.is_published,
            view_count: m.view_count,
            category,
            tags,
            featured_image,
            created_at: m.created_at,
        }
    }
}

#[derive(Default)]
pub struct NewsRelations {
    pub category: Option<CategoryResponse>,
    pub tags: Vec<TagResponse>,
    pub featured_image: Option<StoredFileResponse>,
    pub related_news: Vec<ContentSummary>,
    pub related_events: Vec<ContentSummary>,
    pub comments: Vec<CommentResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NewsResponse {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content: String,
    pub author: Option<String>,
    pub source: Option<String>,
    pub contact_info: Option<String>,
    pub category_id: Option<i32>,
    pub featured_image_id: Option<i32>,
    pub publish_date: DateTime<Utc>,
    pub is_published: bool,
    pub view_count: i32,
    pub category: Option<CategoryResponse>,
    pub tags: Vec<TagResponse>,
    pub featured_image: Option<StoredFileResponse>,
    pub related_news: Vec<ContentSummary>,
    pub related_events: Vec<ContentSummary>,
    /// Approved comments, newest first.
    pub comments: Vec<CommentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewsResponse {
    pub fn new(m: news::Model, rel: NewsRelations) -> Self {
        Self {
            id: m.id,
            title: m.title,
            slug: m.slug,
            summary: m.summary,
            content: m.content,
            author: m.author,
            source: m.source,
            contact_info: m.contact_info,
            category_id: m.category_id,
            featured_image_id: m.featured_image_id,
            publish_date: m.publish_date,
            is_published: m.is_published,
            view_count: m.view_count,
            category: rel.category,
            tags: rel.tags,
            featured_image: rel.featured_image,
            related_news: rel.related_news,
            related_events: rel.related_events,
            comments: rel.comments,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<&news::Model> for ContentSummary {
    fn from(m: &news::Model) -> Self {
        Self {
            id: m.id,
            title: m.title.clone(),
            slug: m.slug.clone(),
        }
    }
}

pub fn validate_create_news(req: &CreateNewsRequest) -> Result<(), AppError> {
    validate_title(&req.title)?;
    if req.content.trim().is_empty() {
        return Err(AppError::Validation("Content must not be empty".into()));
    }
    validate_max_len(req.summary.as_deref(), "Summary", 500)?;
    validate_max_len(req.author.as_deref(), "Author", 100)
}

pub fn validate_update_news(req: &UpdateNewsRequest) -> Result<(), AppError> {
    if let Some(title) = &req.title {
        validate_title(title)?;
    }
    if let Some(content) = &req.content
        && content.trim().is_empty()
    {
        return Err(AppError::Validation("Content must not be empty".into()));
    }
    validate_max_len(req.summary.clone().flatten().as_deref(), "Summary", 500)?;
    validate_max_len(req.author.clone().flatten().as_deref(), "Author", 100)
}
