use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::*;
use serde::Deserialize;
use tracing::instrument;

use crate::entity::{blog, comment, event, news, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::handlers::content::resolve_reference;
use crate::models::comment::*;
use crate::models::policy::{COMMENT, ReferencePolicy};
use crate::models::shared::{PageWindow, Paginated, non_blank};
use crate::state::AppState;

/// Paging for the per-content comment listings (approved comments only).
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OwnerCommentsQuery {
    pub page: Option<u64>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Comments",
    operation_id = "createComment",
    summary = "Post a comment",
    description = "Adds a comment to a blog post, news item or event. The comment is hidden until approved. A `parent_id` that is not a comment on the same content, or a `user_id` that does not exist, is stored as null.",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created (awaiting approval)", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Content not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(content_type = ?payload.content_type, content_id = payload.content_id))]
pub async fn create_comment(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let owner = CommentOwner::new(payload.content_type, payload.content_id);
    let model = insert_comment(&state.db, owner, payload.body).await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Comments",
    operation_id = "listComments",
    summary = "List comments",
    description = "Returns comments newest first, optionally for one content item. Only approved comments are returned unless `approved_only=false`.",
    params(CommentListQuery),
    responses(
        (status = 200, description = "Page of comments", body = Paginated<CommentResponse>),
        (status = 400, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_comments(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CommentListQuery>,
) -> Result<Json<Paginated<CommentResponse>>, AppError> {
    let owner = query.owner()?;
    let window = PageWindow::resolve(query.page, query.skip, query.limit);
    let page = page_comments(
        &state.db,
        owner,
        query.approved_only.unwrap_or(true),
        window,
    )
    .await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/{id}/approve",
    tag = "Comments",
    operation_id = "approveComment",
    summary = "Approve a comment",
    description = "Marks a comment as approved so it shows up publicly. Approving an approved comment is a no-op.",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment approved", body = CommentResponse),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn approve_comment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CommentResponse>, AppError> {
    let existing = find_comment(&state.db, id).await?;
    if existing.is_approved {
        return Ok(Json(existing.into()));
    }

    let mut active: comment::ActiveModel = existing.into();
    active.is_approved = Set(true);
    let model = active.update(&state.db).await?;

    tracing::info!(id, "Comment approved");
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Delete a comment",
    description = "Deletes a comment. Its direct replies are kept and become top-level comments.",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    find_comment(&txn, id).await?;

    comment::Entity::update_many()
        .col_expr(comment::Column::ParentId, Expr::value(Option::<i32>::None))
        .filter(comment::Column::ParentId.eq(id))
        .exec(&txn)
        .await?;
    comment::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/comments",
    tag = "Comments",
    operation_id = "createBlogComment",
    summary = "Comment on a blog post",
    params(("id" = i32, Path, description = "Blog post ID")),
    request_body = CommentBody,
    responses(
        (status = 201, description = "Comment created (awaiting approval)", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Blog post not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn create_blog_comment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CommentBody>,
) -> Result<impl IntoResponse, AppError> {
    let model = insert_comment(&state.db, CommentOwner::Blog(id), payload).await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}/comments",
    tag = "Comments",
    operation_id = "listBlogComments",
    summary = "List approved comments on a blog post",
    params(("id" = i32, Path, description = "Blog post ID"), OwnerCommentsQuery),
    responses(
        (status = 200, description = "Page of approved comments", body = Paginated<CommentResponse>),
        (status = 404, description = "Blog post not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(id))]
pub async fn list_blog_comments(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppQuery(query): AppQuery<OwnerCommentsQuery>,
) -> Result<Json<Paginated<CommentResponse>>, AppError> {
    list_for_owner(&state.db, CommentOwner::Blog(id), query).await
}

#[utoipa::path(
    post,
    path = "/{id}/comments",
    tag = "Comments",
    operation_id = "createNewsComment",
    summary = "Comment on a news item",
    params(("id" = i32, Path, description = "News item ID")),
    request_body = CommentBody,
    responses(
        (status = 201, description = "Comment created (awaiting approval)", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "News item not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn create_news_comment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CommentBody>,
) -> Result<impl IntoResponse, AppError> {
    let model = insert_comment(&state.db, CommentOwner::News(id), payload).await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}/comments",
    tag = "Comments",
    operation_id = "listNewsComments",
    summary = "List approved comments on a news item",
    params(("id" = i32, Path, description = "News item ID"), OwnerCommentsQuery),
    responses(
        (status = 200, description = "Page of approved comments", body = Paginated<CommentResponse>),
        (status = 404, description = "News item not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(id))]
pub async fn list_news_comments(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppQuery(query): AppQuery<OwnerCommentsQuery>,
) -> Result<Json<Paginated<CommentResponse>>, AppError> {
    list_for_owner(&state.db, CommentOwner::News(id), query).await
}

#[utoipa::path(
    post,
    path = "/{id}/comments",
    tag = "Comments",
    operation_id = "createEventComment",
    summary = "Comment on an event",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = CommentBody,
    responses(
        (status = 201, description = "Comment created (awaiting approval)", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn create_event_comment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CommentBody>,
) -> Result<impl IntoResponse, AppError> {
    let model = insert_comment(&state.db, CommentOwner::Event(id), payload).await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}/comments",
    tag = "Comments",
    operation_id = "listEventComments",
    summary = "List approved comments on an event",
    params(("id" = i32, Path, description = "Event ID"), OwnerCommentsQuery),
    responses(
        (status = 200, description = "Page of approved comments", body = Paginated<CommentResponse>),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(id))]
pub async fn list_event_comments(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppQuery(query): AppQuery<OwnerCommentsQuery>,
) -> Result<Json<Paginated<CommentResponse>>, AppError> {
    list_for_owner(&state.db, CommentOwner::Event(id), query).await
}

async fn find_comment<C: ConnectionTrait>(db: &C, id: i32) -> Result<comment::Model, AppError> {
    comment::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))
}

/// Fail with `NotFound` unless the content item exists.
async fn ensure_owner_exists<C: ConnectionTrait>(db: &C, owner: CommentOwner) -> Result<(), AppError> {
    let (count, what) = match owner {
        CommentOwner::Blog(id) => (blog::Entity::find_by_id(id).count(db).await?, "Blog post"),
        CommentOwner::News(id) => (news::Entity::find_by_id(id).count(db).await?, "News item"),
        CommentOwner::Event(id) => (event::Entity::find_by_id(id).count(db).await?, "Event"),
    };
    if count == 0 {
        return Err(AppError::NotFound(format!("{what} not found")));
    }
    Ok(())
}

/// A reply must point at a comment on the same content item.
async fn resolve_parent<C: ConnectionTrait>(
    db: &C,
    owner: CommentOwner,
    parent_id: Option<i32>,
) -> Result<Option<i32>, AppError> {
    let Some(parent_id) = parent_id else {
        return Ok(None);
    };
    let found = comment::Entity::find_by_id(parent_id)
        .filter(comment::Column::ContentType.eq(owner.kind()))
        .filter(comment::Column::ContentId.eq(owner.id()))
        .count(db)
        .await?;
    if found > 0 {
        return Ok(Some(parent_id));
    }
    match COMMENT.reference("parent_id") {
        ReferencePolicy::DowngradeToNull => {
            tracing::debug!(parent_id, ?owner, "Reply target not on this content, posting top-level");
            Ok(None)
        }
        ReferencePolicy::Reject => Err(AppError::Validation(format!(
            "parent_id {parent_id} is not a comment on this content"
        ))),
    }
}

async fn insert_comment(
    db: &DatabaseConnection,
    owner: CommentOwner,
    body: CommentBody,
) -> Result<comment::Model, AppError> {
    validate_comment(&body)?;

    let txn = db.begin().await?;
    ensure_owner_exists(&txn, owner).await?;
    let user_id = resolve_reference::<user::Entity, _>(&txn, &COMMENT, "user_id", body.user_id).await?;
    let parent_id = resolve_parent(&txn, owner, body.parent_id).await?;

    let model = comment::ActiveModel {
        content: Set(body.content.trim().to_string()),
        author_name: Set(body.author_name.trim().to_string()),
        author_email: Set(non_blank(body.author_email).map(|e| e.to_lowercase())),
        user_id: Set(user_id),
        content_type: Set(owner.kind()),
        content_id: Set(owner.id()),
        parent_id: Set(parent_id),
        is_approved: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    tracing::info!(id = model.id, ?owner, "Comment submitted for moderation");
    Ok(model)
}

async fn page_comments(
    db: &DatabaseConnection,
    owner: Option<CommentOwner>,
    approved_only: bool,
    window: PageWindow,
) -> Result<Paginated<CommentResponse>, AppError> {
    let mut select = comment::Entity::find();
    if let Some(owner) = owner {
        select = select
            .filter(comment::Column::ContentType.eq(owner.kind()))
            .filter(comment::Column::ContentId.eq(owner.id()));
    }
    if approved_only {
        select = select.filter(comment::Column::IsApproved.eq(true));
    }

    let total = select.clone().paginate(db, window.limit).num_items().await?;
    let rows = select
        .order_by_desc(comment::Column::CreatedAt)
        .order_by_desc(comment::Column::Id)
        .offset(Some(window.offset))
        .limit(Some(window.limit))
        .all(db)
        .await?;

    Ok(Paginated {
        data: rows.into_iter().map(CommentResponse::from).collect(),
        pagination: window.pagination(total),
    })
}

async fn list_for_owner(
    db: &DatabaseConnection,
    owner: CommentOwner,
    query: OwnerCommentsQuery,
) -> Result<Json<Paginated<CommentResponse>>, AppError> {
    ensure_owner_exists(db, owner).await?;
    let window = PageWindow::resolve(query.page, query.skip, query.limit);
    Ok(Json(page_comments(db, Some(owner), true, window).await?))
}
