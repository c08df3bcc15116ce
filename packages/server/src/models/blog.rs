use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::blog;
use crate::error::AppError;

use super::comment::CommentResponse;
use super::shared::{ContentSummary, double_option, validate_max_len, validate_title};
use super::storage::StoredFileResponse;
use super::taxonomy::{BlogCategoryResponse, TagResponse};

const WORDS_PER_MINUTE: f64 = 225.0;

fn default_true() -> bool {
    true
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateBlogRequest {
    #[schema(example = "Shipping our first release")]
    pub title: String,
    /// Derived from the title when absent. Must not be in use.
    pub slug: Option<String>,
    pub introduction: Option<String>,
    /// HTML body.
    pub content: String,
    pub author_name: Option<String>,
    pub author_bio: Option<String>,
    pub author_id: Option<i32>,
    pub category_id: Option<i32>,
    pub featured_image_id: Option<i32>,
    pub og_image_id: Option<i32>,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
    pub seo_title: Option<String>,
    pub meta_description: Option<String>,
    /// Defaults to now.
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_published: bool,
    #[serde(default)]
    pub tag_ids: Vec<i32>,
    #[serde(default)]
    pub related_blog_ids: Vec<i32>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateBlogRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub introduction: Option<Option<String>>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub author_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub author_bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub author_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub category_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub featured_image_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub og_image_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub cta_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub cta_link: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub seo_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub meta_description: Option<Option<String>>,
    pub publish_date: Option<DateTime<Utc>>,
    pub is_published: Option<bool>,
    /// Replaces the tag set when present.
    pub tag_ids: Option<Vec<i32>>,
    /// Replaces the related set when present.
    pub related_blog_ids: Option<Vec<i32>>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BlogListQuery {
    pub page: Option<u64>,
    pub skip: Option<u64>,
    /// 1-100, default 20.
    pub limit: Option<u64>,
    /// Case-insensitive match on title, content, introduction and author name.
    pub search: Option<String>,
    pub category_id: Option<i32>,
    /// Comma separated tag ids; any match.
    pub tag_ids: Option<String>,
    pub author_id: Option<i32>,
    /// Inclusive, on publish date.
    pub start_date: Option<NaiveDate>,
    /// Inclusive, on publish date.
    pub end_date: Option<NaiveDate>,
    /// Default `true`.
    pub is_published: Option<bool>,
}

/// Blog post in list results (no body, no comments).
#[derive(Serialize, utoipa::ToSchema)]
pub struct BlogListItem {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub introduction: Option<String>,
    pub author_name: Option<String>,
    pub author_id: Option<i32>,
    pub publish_date: DateTime<Utc>,
    pub is_published: bool,
    pub view_count: i32,
    pub reading_time_minutes: i32,
    pub category: Option<BlogCategoryResponse>,
    pub tags: Vec<TagResponse>,
    pub featured_image: Option<StoredFileResponse>,
    pub created_at: DateTime<Utc>,
}

impl BlogListItem {
    pub fn new(
        m: blog::Model,
        category: Option<BlogCategoryResponse>,
        tags: Vec<TagResponse>,
        featured_image: Option<StoredFileResponse>,
    ) -> Self {
        Self {
            id: m.id,
            title: m.title,
            slug: m.slug,
            introduction: m.introduction,
            author_name: m.author_name,
            author_id: m.author_id,
            publish_date: m.publish_date,
            is_published: m.is_published,
            view_count: m.view_count,
            reading_time_minutes: m.reading_time_minutes,
            category,
            tags,
            featured_image,
            created_at: m.created_at,
        }
    }
}

/// Everything loaded alongside a blog row for the detail view.
#[derive(Default)]
pub struct BlogRelations {
    pub category: Option<BlogCategoryResponse>,
    pub tags: Vec<TagResponse>,
    pub featured_image: Option<StoredFileResponse>,
    pub og_image: Option<StoredFileResponse>,
    pub related_blogs: Vec<ContentSummary>,
    pub comments: Vec<CommentResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BlogResponse {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub introduction: Option<String>,
    pub content: String,
    pub author_name: Option<String>,
    pub author_bio: Option<String>,
    pub author_id: Option<i32>,
    pub category_id: Option<i32>,
    pub featured_image_id: Option<i32>,
    pub og_image_id: Option<i32>,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
    pub seo_title: Option<String>,
    pub meta_description: Option<String>,
    pub publish_date: DateTime<Utc>,
    pub is_published: bool,
    pub view_count: i32,
    pub reading_time_minutes: i32,
    pub category: Option<BlogCategoryResponse>,
    pub tags: Vec<TagResponse>,
    pub featured_image: Option<StoredFileResponse>,
    pub og_image: Option<StoredFileResponse>,
    pub related_blogs: Vec<ContentSummary>,
    /// Approved comments, newest first.
    pub comments: Vec<CommentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogResponse {
    pub fn new(m: blog::Model, rel: BlogRelations) -> Self {
        Self {
            id: m.id,
            title: m.title,
            slug: m.slug,
            introduction: m.introduction,
            content: m.content,
            author_name: m.author_name,
            author_bio: m.author_bio,
            author_id: m.author_id,
            category_id: m.category_id,
            featured_image_id: m.featured_image_id,
            og_image_id: m.og_image_id,
            cta_text: m.cta_text,
            cta_link: m.cta_link,
            seo_title: m.seo_title,
            meta_description: m.meta_description,
            publish_date: m.publish_date,
            is_published: m.is_published,
            view_count: m.view_count,
            reading_time_minutes: m.reading_time_minutes,
            category: rel.category,
            tags: rel.tags,
            featured_image: rel.featured_image,
            og_image: rel.og_image,
            related_blogs: rel.related_blogs,
            comments: rel.comments,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<&blog::Model> for ContentSummary {
    fn from(m: &blog::Model) -> Self {
        Self {
            id: m.id,
            title: m.title.clone(),
            slug: m.slug.clone(),
        }
    }
}

/// Estimated reading time in whole minutes (at least 1).
///
/// HTML tags are ignored when counting words.
pub fn reading_time_minutes(html: &str) -> i32 {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    let words = text.split_whitespace().count() as f64;
    ((words / WORDS_PER_MINUTE).round() as i32).max(1)
}

fn validate_optional_fields(
    seo_title: Option<&str>,
    meta_description: Option<&str>,
    author_name: Option<&str>,
    cta_link: Option<&str>,
) -> Result<(), AppError> {
    validate_max_len(seo_title, "SEO title", 100)?;
    validate_max_len(meta_description, "Meta description", 255)?;
    validate_max_len(author_name, "Author name", 100)?;
    validate_max_len(cta_link, "CTA link", 500)
}

pub fn validate_create_blog(req: &CreateBlogRequest) -> Result<(), AppError> {
    validate_title(&req.title)?;
    if req.content.trim().is_empty() {
        return Err(AppError::Validation("Content must not be empty".into()));
    }
    validate_optional_fields(
        req.seo_title.as_deref(),
        req.meta_description.as_deref(),
        req.author_name.as_deref(),
        req.cta_link.as_deref(),
    )
}

pub fn validate_update_blog(req: &UpdateBlogRequest) -> Result<(), AppError> {
    if let Some(title) = &req.title {
        validate_title(title)?;
    }
    if let Some(content) = &req.content
        && content.trim().is_empty()
    {
        return Err(AppError::Validation("Content must not be empty".into()));
    }
    validate_optional_fields(
        req.seo_title.clone().flatten().as_deref(),
        req.meta_description.clone().flatten().as_deref(),
        req.author_name.clone().flatten().as_deref(),
        req.cta_link.clone().flatten().as_deref(),
    )
}
