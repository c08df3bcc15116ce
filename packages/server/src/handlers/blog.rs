use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{ExprTrait, Func, LikeExpr, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{blog, blog_category, blog_tag, related_blog, stored_file, tag, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::handlers::content::*;
use crate::models::blog::*;
use crate::models::comment::CommentOwner;
use crate::models::policy::BLOG;
use crate::models::shared::{
    ContentSummary, PageWindow, Paginated, day_range, non_blank, parse_id_list, search_pattern,
};
use crate::models::taxonomy::BlogCategoryResponse;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Blogs",
    operation_id = "createBlog",
    summary = "Create a blog post",
    description = "Creates a blog post. The slug is derived from the title when omitted; an explicit slug that is already in use returns 409. Unknown author, category or image ids are stored as null, and unknown tag or related ids are dropped. Reading time is computed from the content.",
    request_body = CreateBlogRequest,
    responses(
        (status = 201, description = "Blog post created", body = BlogResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Slug already in use (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(title = %payload.title))]
pub async fn create_blog(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateBlogRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_blog(&payload)?;

    let txn = state.db.begin().await?;

    let title = payload.title.trim().to_string();
    let slug = resolve_slug::<blog::Entity, _>(
        &txn,
        &BLOG,
        blog::Column::Slug,
        blog::Column::Id,
        payload.slug.as_deref(),
        &title,
        None,
    )
    .await?;
    let author_id =
        resolve_reference::<user::Entity, _>(&txn, &BLOG, "author_id", payload.author_id).await?;
    let category_id = resolve_reference::<blog_category::Entity, _>(
        &txn,
        &BLOG,
        "category_id",
        payload.category_id,
    )
    .await?;
    let featured_image_id = resolve_reference::<stored_file::Entity, _>(
        &txn,
        &BLOG,
        "featured_image_id",
        payload.featured_image_id,
    )
    .await?;
    let og_image_id =
        resolve_reference::<stored_file::Entity, _>(&txn, &BLOG, "og_image_id", payload.og_image_id)
            .await?;

    let now = chrono::Utc::now();
    let model = blog::ActiveModel {
        title: Set(title),
        slug: Set(slug),
        introduction: Set(non_blank(payload.introduction)),
        reading_time_minutes: Set(reading_time_minutes(&payload.content)),
        content: Set(payload.content),
        author_name: Set(non_blank(payload.author_name)),
        author_bio: Set(non_blank(payload.author_bio)),
        author_id: Set(author_id),
        category_id: Set(category_id),
        featured_image_id: Set(featured_image_id),
        og_image_id: Set(og_image_id),
        cta_text: Set(non_blank(payload.cta_text)),
        cta_link: Set(non_blank(payload.cta_link)),
        seo_title: Set(non_blank(payload.seo_title)),
        meta_description: Set(non_blank(payload.meta_description)),
        publish_date: Set(payload.publish_date.unwrap_or(now)),
        is_published: Set(payload.is_published),
        view_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    replace_tags(&txn, model.id, &payload.tag_ids).await?;
    replace_related(&txn, model.id, &payload.related_blog_ids).await?;

    let response = blog_detail(&txn, model).await?;
    txn.commit().await?;

    tracing::info!(id = response.id, slug = %response.slug, "Blog post created");
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Blogs",
    operation_id = "listBlogs",
    summary = "List blog posts",
    description = "Returns a page of blog posts, newest publish date first. Only published posts are listed unless `is_published=false`. `search` matches title, content, introduction and author name case-insensitively; `tag_ids` matches posts carrying any of the given tags; the date range applies to the publish date and includes both ends.",
    params(BlogListQuery),
    responses(
        (status = 200, description = "Page of blog posts", body = Paginated<BlogListItem>),
        (status = 400, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_blogs(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<BlogListQuery>,
) -> Result<Json<Paginated<BlogListItem>>, AppError> {
    let window = PageWindow::resolve(query.page, query.skip, query.limit);
    let tag_ids = parse_id_list(query.tag_ids.as_deref(), "tag_ids")?;
    let (from, to) = day_range(query.start_date, query.end_date)?;

    let mut select =
        blog::Entity::find().filter(blog::Column::IsPublished.eq(query.is_published.unwrap_or(true)));

    if let Some(pattern) = search_pattern(query.search.as_deref()) {
        let mut any = Condition::any();
        for col in [
            blog::Column::Title,
            blog::Column::Content,
            blog::Column::Introduction,
            blog::Column::AuthorName,
        ] {
            any = any.add(
                Expr::expr(Func::lower(Expr::col(col)))
                    .like(LikeExpr::new(pattern.clone()).escape('\\')),
            );
        }
        select = select.filter(any);
    }
    if let Some(category_id) = query.category_id {
        select = select.filter(blog::Column::CategoryId.eq(category_id));
    }
    if let Some(author_id) = query.author_id {
        select = select.filter(blog::Column::AuthorId.eq(author_id));
    }
    if !tag_ids.is_empty() {
        select = select.filter(
            blog::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(blog_tag::Column::BlogId)
                    .from(blog_tag::Entity)
                    .and_where(blog_tag::Column::TagId.is_in(tag_ids))
                    .to_owned(),
            ),
        );
    }
    if let Some(from) = from {
        select = select.filter(blog::Column::PublishDate.gte(from));
    }
    if let Some(to) = to {
        select = select.filter(blog::Column::PublishDate.lt(to));
    }

    let total = select
        .clone()
        .paginate(&state.db, window.limit)
        .num_items()
        .await?;

    let rows = select
        .order_by_desc(blog::Column::PublishDate)
        .order_by_desc(blog::Column::Id)
        .offset(Some(window.offset))
        .limit(Some(window.limit))
        .all(&state.db)
        .await?;

    let ids: Vec<i32> = rows.iter().map(|m| m.id).collect();
    let mut tags = load_tags::<blog_tag::Entity, _>(
        &state.db,
        blog_tag::Column::BlogId,
        blog_tag::Column::TagId,
        &ids,
    )
    .await?;
    let categories: HashMap<i32, BlogCategoryResponse> =
        load_by_ids::<blog_category::Entity, _>(
            &state.db,
            blog_category::Column::Id,
            rows.iter().filter_map(|m| m.category_id),
            |m| m.id,
        )
        .await?
        .into_iter()
        .map(|(id, m)| (id, m.into()))
        .collect();
    let files = load_files(&state.db, rows.iter().filter_map(|m| m.featured_image_id)).await?;

    let data = rows
        .into_iter()
        .map(|m| {
            let category = m.category_id.and_then(|id| categories.get(&id).cloned());
            let featured = m.featured_image_id.and_then(|id| files.get(&id).cloned());
            let post_tags = tags.remove(&m.id).unwrap_or_default();
            BlogListItem::new(m, category, post_tags, featured)
        })
        .collect();

    Ok(Json(Paginated {
        data,
        pagination: window.pagination(total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Blogs",
    operation_id = "getBlog",
    summary = "Get a blog post by ID",
    description = "Returns the full blog post with its category, tags, images, related posts and approved comments. Does not count as a view.",
    params(("id" = i32, Path, description = "Blog post ID")),
    responses(
        (status = 200, description = "Blog post", body = BlogResponse),
        (status = 404, description = "Blog post not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<BlogResponse>, AppError> {
    let model = find_blog(&state.db, id).await?;
    Ok(Json(blog_detail(&state.db, model).await?))
}

#[utoipa::path(
    get,
    path = "/slug/{slug}",
    tag = "Blogs",
    operation_id = "getBlogBySlug",
    summary = "Get a blog post by slug",
    description = "Returns the full blog post and increments its view count.",
    params(("slug" = String, Path, description = "Blog post slug")),
    responses(
        (status = 200, description = "Blog post", body = BlogResponse),
        (status = 404, description = "Blog post not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(slug = %slug))]
pub async fn get_blog_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogResponse>, AppError> {
    let txn = state.db.begin().await?;

    let updated = blog::Entity::update_many()
        .col_expr(
            blog::Column::ViewCount,
            Expr::col(blog::Column::ViewCount).add(1),
        )
        .filter(blog::Column::Slug.eq(slug.as_str()))
        .exec(&txn)
        .await?;
    if updated.rows_affected == 0 {
        return Err(AppError::NotFound("Blog post not found".into()));
    }

    let model = blog::Entity::find()
        .filter(blog::Column::Slug.eq(slug.as_str()))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog post not found".into()))?;
    let response = blog_detail(&txn, model).await?;
    txn.commit().await?;

    Ok(Json(response))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Blogs",
    operation_id = "updateBlog",
    summary = "Update a blog post",
    description = "Partially updates a blog post. Omitted fields are left unchanged and nullable fields accept `null`. `tag_ids` and `related_blog_ids` replace the current sets when present. Changing the title without giving a slug regenerates the slug. Reading time is recomputed when the content changes.",
    params(("id" = i32, Path, description = "Blog post ID")),
    request_body = UpdateBlogRequest,
    responses(
        (status = 200, description = "Blog post updated", body = BlogResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Blog post not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Slug already in use (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn update_blog(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateBlogRequest>,
) -> Result<Json<BlogResponse>, AppError> {
    validate_update_blog(&payload)?;

    if payload == UpdateBlogRequest::default() {
        let existing = find_blog(&state.db, id).await?;
        return Ok(Json(blog_detail(&state.db, existing).await?));
    }

    let txn = state.db.begin().await?;
    let existing = find_blog_for_update(&txn, id).await?;

    let title_changed = payload
        .title
        .as_deref()
        .is_some_and(|t| t.trim() != existing.title);
    let title = payload
        .title
        .as_deref()
        .map(|t| t.trim().to_string())
        .unwrap_or_else(|| existing.title.clone());
    let slug = if payload.slug.is_some() || title_changed {
        Some(
            resolve_slug::<blog::Entity, _>(
                &txn,
                &BLOG,
                blog::Column::Slug,
                blog::Column::Id,
                payload.slug.as_deref(),
                &title,
                Some(id),
            )
            .await?,
        )
    } else {
        None
    };

    let mut active: blog::ActiveModel = existing.into();
    active.title = Set(title);
    if let Some(slug) = slug {
        active.slug = Set(slug);
    }
    if let Some(content) = payload.content {
        active.reading_time_minutes = Set(reading_time_minutes(&content));
        active.content = Set(content);
    }
    if let Some(v) = patch_text(payload.introduction) {
        active.introduction = Set(v);
    }
    if let Some(v) = patch_text(payload.author_name) {
        active.author_name = Set(v);
    }
    if let Some(v) = patch_text(payload.author_bio) {
        active.author_bio = Set(v);
    }
    if let Some(v) = patch_text(payload.cta_text) {
        active.cta_text = Set(v);
    }
    if let Some(v) = patch_text(payload.cta_link) {
        active.cta_link = Set(v);
    }
    if let Some(v) = patch_text(payload.seo_title) {
        active.seo_title = Set(v);
    }
    if let Some(v) = patch_text(payload.meta_description) {
        active.meta_description = Set(v);
    }
    if let Some(v) = payload.author_id {
        active.author_id =
            Set(resolve_reference::<user::Entity, _>(&txn, &BLOG, "author_id", v).await?);
    }
    if let Some(v) = payload.category_id {
        active.category_id = Set(
            resolve_reference::<blog_category::Entity, _>(&txn, &BLOG, "category_id", v).await?,
        );
    }
    if let Some(v) = payload.featured_image_id {
        active.featured_image_id = Set(resolve_reference::<stored_file::Entity, _>(
            &txn,
            &BLOG,
            "featured_image_id",
            v,
        )
        .await?);
    }
    if let Some(v) = payload.og_image_id {
        active.og_image_id =
            Set(resolve_reference::<stored_file::Entity, _>(&txn, &BLOG, "og_image_id", v).await?);
    }
    if let Some(v) = payload.publish_date {
        active.publish_date = Set(v);
    }
    if let Some(v) = payload.is_published {
        active.is_published = Set(v);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;

    if let Some(ref tag_ids) = payload.tag_ids {
        replace_tags(&txn, id, tag_ids).await?;
    }
    if let Some(ref related) = payload.related_blog_ids {
        replace_related(&txn, id, related).await?;
    }

    let response = blog_detail(&txn, model).await?;
    txn.commit().await?;

    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Blogs",
    operation_id = "deleteBlog",
    summary = "Delete a blog post",
    description = "Deletes a blog post together with its tag assignments, related-post links and comments. Uploaded images are kept.",
    params(("id" = i32, Path, description = "Blog post ID")),
    responses(
        (status = 204, description = "Blog post deleted"),
        (status = 404, description = "Blog post not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_blog(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    find_blog_for_update(&txn, id).await?;

    blog_tag::Entity::delete_many()
        .filter(blog_tag::Column::BlogId.eq(id))
        .exec(&txn)
        .await?;
    related_blog::Entity::delete_many()
        .filter(
            Condition::any()
                .add(related_blog::Column::BlogId.eq(id))
                .add(related_blog::Column::RelatedBlogId.eq(id)),
        )
        .exec(&txn)
        .await?;
    delete_comments(&txn, CommentOwner::Blog(id)).await?;
    blog::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_blog<C: ConnectionTrait>(db: &C, id: i32) -> Result<blog::Model, AppError> {
    blog::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog post not found".into()))
}

async fn find_blog_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<blog::Model, AppError> {
    use sea_orm::sea_query::LockType;
    blog::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog post not found".into()))
}

async fn replace_tags(txn: &DatabaseTransaction, blog_id: i32, tag_ids: &[i32]) -> Result<(), DbErr> {
    blog_tag::Entity::delete_many()
        .filter(blog_tag::Column::BlogId.eq(blog_id))
        .exec(txn)
        .await?;

    let tag_ids = existing_ids::<tag::Entity, _>(txn, tag::Column::Id, tag_ids, None).await?;
    if tag_ids.is_empty() {
        return Ok(());
    }
    blog_tag::Entity::insert_many(tag_ids.into_iter().map(|tag_id| blog_tag::ActiveModel {
        blog_id: Set(blog_id),
        tag_id: Set(tag_id),
    }))
    .exec_without_returning(txn)
    .await?;
    Ok(())
}

async fn replace_related(
    txn: &DatabaseTransaction,
    blog_id: i32,
    related_ids: &[i32],
) -> Result<(), DbErr> {
    related_blog::Entity::delete_many()
        .filter(related_blog::Column::BlogId.eq(blog_id))
        .exec(txn)
        .await?;

    let related_ids =
        existing_ids::<blog::Entity, _>(txn, blog::Column::Id, related_ids, Some(blog_id)).await?;
    if related_ids.is_empty() {
        return Ok(());
    }
    related_blog::Entity::insert_many(related_ids.into_iter().map(|related_blog_id| {
        related_blog::ActiveModel {
            blog_id: Set(blog_id),
            related_blog_id: Set(related_blog_id),
        }
    }))
    .exec_without_returning(txn)
    .await?;
    Ok(())
}

async fn blog_detail<C: ConnectionTrait>(
    db: &C,
    model: blog::Model,
) -> Result<BlogResponse, AppError> {
    let category = match model.category_id {
        Some(id) => blog_category::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(BlogCategoryResponse::from),
        None => None,
    };
    let tags = load_tags::<blog_tag::Entity, _>(
        db,
        blog_tag::Column::BlogId,
        blog_tag::Column::TagId,
        &[model.id],
    )
    .await?
    .remove(&model.id)
    .unwrap_or_default();
    let files = load_files(db, [model.featured_image_id, model.og_image_id].into_iter().flatten())
        .await?;

    let related_ids = linked_ids::<related_blog::Entity, _>(
        db,
        related_blog::Column::BlogId,
        related_blog::Column::RelatedBlogId,
        model.id,
    )
    .await?;
    let related = load_by_ids::<blog::Entity, _>(db, blog::Column::Id, related_ids.clone(), |m| m.id)
        .await?;
    let related_blogs = related_ids
        .iter()
        .filter_map(|id| related.get(id))
        .map(ContentSummary::from)
        .collect();

    let comments = approved_comments(db, CommentOwner::Blog(model.id)).await?;
    let featured_image = model.featured_image_id.and_then(|id| files.get(&id).cloned());
    let og_image = model.og_image_id.and_then(|id| files.get(&id).cloned());

    Ok(BlogResponse::new(
        model,
        BlogRelations {
            category,
            tags,
            featured_image,
            og_image,
            related_blogs,
            comments,
        },
    ))
}
