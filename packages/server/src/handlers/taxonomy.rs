use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{blog_category, blog_tag, category, event, event_tag, news, news_tag, tag};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::handlers::content::resolve_slug;
use crate::models::policy::BLOG_CATEGORY;
use crate::models::shared::{non_blank, validate_max_len};
use crate::models::taxonomy::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Tags",
    operation_id = "createTag",
    summary = "Create a tag",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created", body = TagResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Tag name already exists (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(name = %payload.name))]
pub async fn create_tag(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTagRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_name(&payload.name)?;
    let name = payload.name.trim().to_string();

    let txn = state.db.begin().await?;
    let exists = tag::Entity::find()
        .filter(tag::Column::Name.eq(name.as_str()))
        .count(&txn)
        .await?;
    if exists > 0 {
        return Err(AppError::Conflict(format!("Tag '{name}' already exists")));
    }

    let model = tag::ActiveModel {
        name: Set(name),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(TagResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Tags",
    operation_id = "listTags",
    summary = "List all tags",
    description = "Returns every tag ordered by name.",
    responses(
        (status = 200, description = "All tags", body = Vec<TagResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagResponse>>, AppError> {
    let rows = tag::Entity::find()
        .order_by_asc(tag::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(rows.into_iter().map(TagResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Tags",
    operation_id = "getTag",
    summary = "Get a tag by ID",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tag", body = TagResponse),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TagResponse>, AppError> {
    let model = tag::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".into()))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Tags",
    operation_id = "deleteTag",
    summary = "Delete a tag",
    description = "Deletes a tag and removes it from every blog post, news item and event.",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    if tag::Entity::find_by_id(id).count(&txn).await? == 0 {
        return Err(AppError::NotFound("Tag not found".into()));
    }

    blog_tag::Entity::delete_many()
        .filter(blog_tag::Column::TagId.eq(id))
        .exec(&txn)
        .await?;
    news_tag::Entity::delete_many()
        .filter(news_tag::Column::TagId.eq(id))
        .exec(&txn)
        .await?;
    event_tag::Entity::delete_many()
        .filter(event_tag::Column::TagId.eq(id))
        .exec(&txn)
        .await?;
    tag::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Categories",
    operation_id = "createCategory",
    summary = "Create a news/event category",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Category name already exists (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(name = %payload.name))]
pub async fn create_category(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_category(&payload.name, payload.description.as_deref())?;
    let name = payload.name.trim().to_string();

    let txn = state.db.begin().await?;
    ensure_category_name_free(&txn, &name, None).await?;

    let now = chrono::Utc::now();
    let model = category::ActiveModel {
        name: Set(name),
        description: Set(non_blank(payload.description)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List all news/event categories",
    responses(
        (status = 200, description = "All categories", body = Vec<CategoryResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let rows = category::Entity::find()
        .order_by_asc(category::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(rows.into_iter().map(CategoryResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Categories",
    operation_id = "getCategory",
    summary = "Get a news/event category by ID",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CategoryResponse>, AppError> {
    Ok(Json(find_category(&state.db, id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Categories",
    operation_id = "updateCategory",
    summary = "Update a news/event category",
    description = "Partially updates a category. `description` accepts `null` to clear it. Renaming to a name already in use returns 409.",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Category name already exists (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    if let Some(ref name) = payload.name {
        validate_name(name)?;
    }
    if let Some(Some(ref description)) = payload.description {
        validate_max_len(Some(description), "Description", 1000)?;
    }

    if payload == UpdateCategoryRequest::default() {
        return Ok(Json(find_category(&state.db, id).await?.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_category(&txn, id).await?;
    let mut active: category::ActiveModel = existing.into();

    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        ensure_category_name_free(&txn, &name, Some(id)).await?;
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(non_blank(description));
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Categories",
    operation_id = "deleteCategory",
    summary = "Delete a news/event category",
    description = "Deletes a category. News items and events in it are kept with their category cleared.",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    find_category(&txn, id).await?;

    news::Entity::update_many()
        .col_expr(news::Column::CategoryId, Expr::value(Option::<i32>::None))
        .filter(news::Column::CategoryId.eq(id))
        .exec(&txn)
        .await?;
    event::Entity::update_many()
        .col_expr(event::Column::CategoryId, Expr::value(Option::<i32>::None))
        .filter(event::Column::CategoryId.eq(id))
        .exec(&txn)
        .await?;
    category::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Blog Categories",
    operation_id = "createBlogCategory",
    summary = "Create a blog category",
    description = "Creates a blog category. If a category with the same name already exists it is returned unchanged with status 200. The slug is derived from the name when omitted, and a taken slug gets a numeric suffix.",
    request_body = CreateBlogCategoryRequest,
    responses(
        (status = 201, description = "Blog category created", body = BlogCategoryResponse),
        (status = 200, description = "Existing blog category with this name", body = BlogCategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(name = %payload.name))]
pub async fn create_blog_category(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateBlogCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_category(&payload.name, payload.description.as_deref())?;
    let name = payload.name.trim().to_string();

    let txn = state.db.begin().await?;
    if let Some(existing) = blog_category::Entity::find()
        .filter(blog_category::Column::Name.eq(name.as_str()))
        .one(&txn)
        .await?
    {
        return Ok((StatusCode::OK, Json(BlogCategoryResponse::from(existing))));
    }

    let slug = resolve_slug::<blog_category::Entity, _>(
        &txn,
        &BLOG_CATEGORY,
        blog_category::Column::Slug,
        blog_category::Column::Id,
        payload.slug.as_deref(),
        &name,
        None,
    )
    .await?;

    let model = blog_category::ActiveModel {
        name: Set(name),
        slug: Set(slug),
        description: Set(non_blank(payload.description)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(BlogCategoryResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Blog Categories",
    operation_id = "listBlogCategories",
    summary = "List all blog categories",
    responses(
        (status = 200, description = "All blog categories", body = Vec<BlogCategoryResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_blog_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<BlogCategoryResponse>>, AppError> {
    let rows = blog_category::Entity::find()
        .order_by_asc(blog_category::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(rows.into_iter().map(BlogCategoryResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Blog Categories",
    operation_id = "getBlogCategory",
    summary = "Get a blog category by ID",
    params(("id" = i32, Path, description = "Blog category ID")),
    responses(
        (status = 200, description = "Blog category", body = BlogCategoryResponse),
        (status = 404, description = "Blog category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_blog_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<BlogCategoryResponse>, AppError> {
    let model = blog_category::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog category not found".into()))?;
    Ok(Json(model.into()))
}

async fn find_category<C: ConnectionTrait>(db: &C, id: i32) -> Result<category::Model, AppError> {
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))
}

async fn ensure_category_name_free<C: ConnectionTrait>(
    db: &C,
    name: &str,
    exclude: Option<i32>,
) -> Result<(), AppError> {
    let mut select = category::Entity::find().filter(category::Column::Name.eq(name));
    if let Some(id) = exclude {
        select = select.filter(category::Column::Id.ne(id));
    }
    if select.count(db).await? > 0 {
        return Err(AppError::Conflict(format!("Category '{name}' already exists")));
    }
    Ok(())
}
