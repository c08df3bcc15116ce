use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::event;
use crate::error::AppError;

use super::comment::CommentResponse;
use super::shared::{ContentSummary, double_option, validate_max_len, validate_title};
use super::storage::StoredFileResponse;
use super::taxonomy::{CategoryResponse, TagResponse};

fn default_true() -> bool {
    true
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateEventRequest {
    #[schema(example = "Spring open day")]
    pub title: String,
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub description: String,
    pub organizer: Option<String>,
    pub venue: Option<String>,
    pub location_address: Option<String>,
    /// Free-form "lat,lng".
    pub location_coordinates: Option<String>,
    pub registration_link: Option<String>,
    #[serde(default)]
    pub has_registration_form: bool,
    pub ticket_price: Option<f64>,
    #[serde(default = "default_true")]
    pub is_free: bool,
    pub contact_info: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub category_id: Option<i32>,
    pub featured_image_id: Option<i32>,
    #[serde(default = "default_true")]
    pub is_published: bool,
    #[serde(default)]
    pub tag_ids: Vec<i32>,
    #[serde(default)]
    pub related_event_ids: Vec<i32>,
    #[serde(default)]
    pub related_news_ids: Vec<i32>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub summary: Option<Option<String>>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub organizer: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub venue: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub location_address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub location_coordinates: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub registration_link: Option<Option<String>>,
    pub has_registration_form: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub ticket_price: Option<Option<f64>>,
    pub is_free: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub contact_info: Option<Option<String>>,
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub end_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub category_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub featured_image_id: Option<Option<i32>>,
    pub is_published: Option<bool>,
    pub tag_ids: Option<Vec<i32>>,
    pub related_event_ids: Option<Vec<i32>>,
    pub related_news_ids: Option<Vec<i32>>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventListQuery {
    pub page: Option<u64>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    /// Case-insensitive match on title, description, summary, venue and address.
    pub search: Option<String>,
    pub category_id: Option<i32>,
    /// Comma separated tag ids; any match.
    pub tag_ids: Option<String>,
    /// Inclusive, on start date.
    pub start_date: Option<NaiveDate>,
    /// Inclusive, on start date.
    pub end_date: Option<NaiveDate>,
    /// Default `true`.
    pub is_published: Option<bool>,
    /// Include events that have already started. Default `false`.
    pub include_past: Option<bool>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventListItem {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub organizer: Option<String>,
    pub venue: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_free: bool,
    pub ticket_price: Option<f64>,
    pub is_published: bool,
    pub view_count: i32,
    pub category: Option<CategoryResponse>,
    pub tags: Vec<TagResponse>,
    pub featured_image: Option<StoredFileResponse>,
    pub created_at: DateTime<Utc>,
}

impl EventListItem {
    pub fn new(
        m: event::Model,
        category: Option<CategoryResponse>,
        tags: Vec<TagResponse>,
        featured_image: Option<StoredFileResponse>,
    ) -> Self {
        Self {
            id: m.id,
            title: m.title,
            slug: m.slug,
            summary: m.summary,
            organizer: m.organizer,
            venue: m.venue,
            start_date: m.start_date,
            end_date: m.end_date,
            is_free: m.is_free,
            ticket_price: m.ticket_price,
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
pub struct EventRelations {
    pub category: Option<CategoryResponse>,
    pub tags: Vec<TagResponse>,
    pub featured_image: Option<StoredFileResponse>,
    pub related_events: Vec<ContentSummary>,
    pub related_news: Vec<ContentSummary>,
    pub comments: Vec<CommentResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventResponse {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub description: String,
    pub organizer: Option<String>,
    pub venue: Option<String>,
    pub location_address: Option<String>,
    pub location_coordinates: Option<String>,
    pub registration_link: Option<String>,
    pub has_registration_form: bool,
    pub ticket_price: Option<f64>,
    pub is_free: bool,
    pub contact_info: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub category_id: Option<i32>,
    pub featured_image_id: Option<i32>,
    pub is_published: bool,
    pub view_count: i32,
    pub category: Option<CategoryResponse>,
    pub tags: Vec<TagResponse>,
    pub featured_image: Option<StoredFileResponse>,
    pub related_events: Vec<ContentSummary>,
    pub related_news: Vec<ContentSummary>,
    /// Approved comments, newest first.
    pub comments: Vec<CommentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventResponse {
    pub fn new(m: event::Model, rel: EventRelations) -> Self {
        Self {
            id: m.id,
            title: m.title,
            slug: m.slug,
            summary: m.summary,
            description: m.description,
            organizer: m.organizer,
            venue: m.venue,
            location_address: m.location_address,
            location_coordinates: m.location_coordinates,
            registration_link: m.registration_link,
            has_registration_form: m.has_registration_form,
            ticket_price: m.ticket_price,
            is_free: m.is_free,
            contact_info: m.contact_info,
            start_date: m.start_date,
            end_date: m.end_date,
            category_id: m.category_id,
            featured_image_id: m.featured_image_id,
            is_published: m.is_published,
            view_count: m.view_count,
            category: rel.category,
            tags: rel.tags,
            featured_image: rel.featured_image,
            related_events: rel.related_events,
            related_news: rel.related_news,
            comments: rel.comments,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<&event::Model> for ContentSummary {
    fn from(m: &event::Model) -> Self {
        Self {
            id: m.id,
            title: m.title.clone(),
            slug: m.slug.clone(),
        }
    }
}

fn validate_schedule(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    ticket_price: Option<f64>,
) -> Result<(), AppError> {
    if let Some(end) = end
        && end < start
    {
        return Err(AppError::Validation(
            "end_date must not be before start_date".into(),
        ));
    }
    if let Some(price) = ticket_price
        && (!price.is_finite() || price < 0.0)
    {
        return Err(AppError::Validation(
            "ticket_price must be a non-negative number".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_event(req: &CreateEventRequest) -> Result<(), AppError> {
    validate_title(&req.title)?;
    if req.description.trim().is_empty() {
        return Err(AppError::Validation("Description must not be empty".into()));
    }
    validate_max_len(req.summary.as_deref(), "Summary", 500)?;
    validate_max_len(req.registration_link.as_deref(), "Registration link", 500)?;
    validate_schedule(req.start_date, req.end_date, req.ticket_price)
}

/// Field checks plus the schedule as it will be after the update.
pub fn validate_update_event(
    req: &UpdateEventRequest,
    current: &event::Model,
) -> Result<(), AppError> {
    if let Some(title) = &req.title {
        validate_title(title)?;
    }
    if let Some(description) = &req.description
        && description.trim().is_empty()
    {
        return Err(AppError::Validation("Description must not be empty".into()));
    }
    validate_max_len(req.summary.clone().flatten().as_deref(), "Summary", 500)?;
    validate_max_len(
        req.registration_link.clone().flatten().as_deref(),
        "Registration link",
        500,
    )?;
    let start = req.start_date.unwrap_or(current.start_date);
    let end = req.end_date.unwrap_or(current.end_date);
    let price = req.ticket_price.unwrap_or(current.ticket_price);
    validate_schedule(start, end, price)
}
