use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::comment::{self, ContentKind};
use crate::error::AppError;

use super::shared::{validate_email, validate_len, validate_max_len};

/// The content item a comment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentOwner {
    Blog(i32),
    News(i32),
    Event(i32),
}

impl CommentOwner {
    pub fn new(kind: ContentKind, id: i32) -> Self {
        match kind {
            ContentKind::Blog => CommentOwner::Blog(id),
            ContentKind::News => CommentOwner::News(id),
            ContentKind::Event => CommentOwner::Event(id),
        }
    }

    pub fn kind(self) -> ContentKind {
        match self {
            CommentOwner::Blog(_) => ContentKind::Blog,
            CommentOwner::News(_) => ContentKind::News,
            CommentOwner::Event(_) => ContentKind::Event,
        }
    }

    pub fn id(self) -> i32 {
        match self {
            CommentOwner::Blog(id) | CommentOwner::News(id) | CommentOwner::Event(id) => id,
        }
    }

    pub fn of(m: &comment::Model) -> Self {
        Self::new(m.content_type, m.content_id)
    }
}

/// Comment fields shared by the generic and the per-content create endpoints.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CommentBody {
    /// 1-1000 characters.
    #[schema(example = "Great write-up, thanks!")]
    pub content: String,
    #[schema(example = "Jane")]
    pub author_name: String,
    pub author_email: Option<String>,
    /// Dropped when it does not match a user.
    pub user_id: Option<i32>,
    /// Dropped when it does not match a comment on the same content.
    pub parent_id: Option<i32>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCommentRequest {
    pub content_type: ContentKind,
    pub content_id: i32,
    #[serde(flatten)]
    pub body: CommentBody,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommentListQuery {
    /// Must be given together with `content_id`.
    pub content_type: Option<ContentKind>,
    pub content_id: Option<i32>,
    /// Default `true`. Pass `false` to include comments awaiting moderation.
    pub approved_only: Option<bool>,
    pub page: Option<u64>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl CommentListQuery {
    pub fn owner(&self) -> Result<Option<CommentOwner>, AppError> {
        match (self.content_type, self.content_id) {
            (Some(kind), Some(id)) => Ok(Some(CommentOwner::new(kind, id))),
            (None, None) => Ok(None),
            _ => Err(AppError::Validation(
                "content_type and content_id must be given together".into(),
            )),
        }
    }
}

#[derive(Serialize, Clone, utoipa::ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub content: String,
    pub author_name: String,
    pub author_email: Option<String>,
    pub user_id: Option<i32>,
    pub content_type: ContentKind,
    pub content_id: i32,
    pub parent_id: Option<i32>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl From<comment::Model> for CommentResponse {
    fn from(m: comment::Model) -> Self {
        Self {
            id: m.id,
            content: m.content,
            author_name: m.author_name,
            author_email: m.author_email,
            user_id: m.user_id,
            content_type: m.content_type,
            content_id: m.content_id,
            parent_id: m.parent_id,
            is_approved: m.is_approved,
            created_at: m.created_at,
        }
    }
}

pub fn validate_comment(body: &CommentBody) -> Result<(), AppError> {
    validate_len(&body.content, "Comment", 1, 1000)?;
    validate_len(&body.author_name, "Author name", 1, 100)?;
    validate_max_len(body.author_email.as_deref(), "Author email", 254)?;
    if let Some(email) = body.author_email.as_deref()
        && !email.trim().is_empty()
    {
        validate_email(email)?;
    }
    Ok(())
}
