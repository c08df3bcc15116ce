use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{ExprTrait, Func, LikeExpr, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{category, event, news, news_event, news_tag, related_news, stored_file, tag};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::handlers::content::*;
use crate::models::comment::CommentOwner;
use crate::models::news::*;
use crate::models::policy::NEWS;
use crate::models::shared::{
    ContentSummary, PageWindow, Paginated, day_range, non_blank, parse_id_list, search_pattern,
};
use crate::models::taxonomy::CategoryResponse;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "News",
    operation_id = "createNews",
    summary = "Create a news item",
    description = "Creates a news item. The slug is derived from the title when omitted; an explicit slug that is already in use returns 409. Unknown category or image ids are stored as null, and unknown tag, related news or event ids are dropped.",
    request_body = CreateNewsRequest,
    responses(
        (status = 201, description = "News item created", body = NewsResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Slug already in use (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(title = %payload.title))]
pub async fn create_news(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateNewsRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_news(&payload)?;

    let txn = state.db.begin().await?;

    let title = payload.title.trim().to_string();
    let slug = resolve_slug::<news::Entity, _>(
        &txn,
        &NEWS,
        news::Column::Slug,
        news::Column::Id,
        payload.slug.as_deref(),
        &title,
        None,
    )
    .await?;
    let category_id =
        resolve_reference::<category::Entity, _>(&txn, &NEWS, "category_id", payload.category_id)
            .await?;
    let featured_image_id = resolve_reference::<stored_file::Entity, _>(
        &txn,
        &NEWS,
        "featured_image_id",
        payload.featured_image_id,
    )
    .await?;

    let now = chrono::Utc::now();
    let model = news::ActiveModel {
        title: Set(title),
        slug: Set(slug),
        summary: Set(non_blank(payload.summary)),
        content: Set(payload.content),
        author: Set(non_blank(payload.author)),
        source: Set(non_blank(payload.source)),
        contact_info: Set(non_blank(payload.contact_info)),
        category_id: Set(category_id),
        featured_image_id: Set(featured_image_id),
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
    replace_related(&txn, model.id, &payload.related_news_ids).await?;
    replace_linked_events(&txn, model.id, &payload.related_event_ids).await?;

    let response = news_detail(&txn, model).await?;
    txn.commit().await?;

    tracing::info!(id = response.id, slug = %response.slug, "News item created");
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "News",
    operation_id = "listNews",
    summary = "List news items",
    description = "Returns a page of news items, newest publish date first. Only published items are listed unless `is_published=false`. `search` matches title, content and summary case-insensitively; `tag_ids` matches items carrying any of the given tags; the date range applies to the publish date and includes both ends.",
    params(NewsListQuery),
    responses(
        (status = 200, description = "Page of news items", body = Paginated<NewsListItem>),
        (status = 400, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_news(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<NewsListQuery>,
) -> Result<Json<Paginated<NewsListItem>>, AppError> {
    let window = PageWindow::resolve(query.page, query.skip, query.limit);
    let tag_ids = parse_id_list(query.tag_ids.as_deref(), "tag_ids")?;
    let (from, to) = day_range(query.start_date, query.end_date)?;

    let mut select =
        news::Entity::find().filter(news::Column::IsPublished.eq(query.is_published.unwrap_or(true)));

    if let Some(pattern) = search_pattern(query.search.as_deref()) {
        let mut any = Condition::any();
        for col in [news::Column::Title, news::Column::Content, news::Column::Summary] {
            any = any.add(
                Expr::expr(Func::lower(Expr::col(col)))
                    .like(LikeExpr::new(pattern.clone()).escape('\\')),
            );
        }
        select = select.filter(any);
    }
    if let Some(category_id) = query.category_id {
        select = select.filter(news::Column::CategoryId.eq(category_id));
    }
    if !tag_ids.is_empty() {
        select = select.filter(
            news::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(news_tag::Column::NewsId)
                    .from(news_tag::Entity)
                    .and_where(news_tag::Column::TagId.is_in(tag_ids))
                    .to_owned(),
            ),
        );
    }
    if let Some(from) = from {
        select = select.filter(news::Column::PublishDate.gte(from));
    }
    if let Some(to) = to {
        select = select.filter(news::Column::PublishDate.lt(to));
    }

    let total = select
        .clone()
        .paginate(&state.db, window.limit)
        .num_items()
        .await?;

    let rows = select
        .order_by_desc(news::Column::PublishDate)
        .order_by_desc(news::Column::Id)
        .offset(Some(window.offset))
        .limit(Some(window.limit))
        .all(&state.db)
        .await?;

    let ids: Vec<i32> = rows.iter().map(|m| m.id).collect();
    let mut tags = load_tags::<news_tag::Entity, _>(
        &state.db,
        news_tag::Column::NewsId,
        news_tag::Column::TagId,
        &ids,
    )
    .await?;
    let categories = load_categories(&state.db, rows.iter().filter_map(|m| m.category_id)).await?;
    let files = load_files(&state.db, rows.iter().filter_map(|m| m.featured_image_id)).await?;

    let data = rows
        .into_iter()
        .map(|m| {
            let category = m.category_id.and_then(|id| categories.get(&id).cloned());
            let featured = m.featured_image_id.and_then(|id| files.get(&id).cloned());
            let item_tags = tags.remove(&m.id).unwrap_or_default();
            NewsListItem::new(m, category, item_tags, featured)
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
    tag = "News",
    operation_id = "getNews",
    summary = "Get a news item by ID",
    description = "Returns the full news item with its category, tags, image, related news, linked events and approved comments. Does not count as a view.",
    params(("id" = i32, Path, description = "News item ID")),
    responses(
        (status = 200, description = "News item", body = NewsResponse),
        (status = 404, description = "News item not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<NewsResponse>, AppError> {
    let model = find_news(&state.db, id).await?;
    Ok(Json(news_detail(&state.db, model).await?))
}

#[utoipa::path(
    get,
    path = "/slug/{slug}",
    tag = "News",
    operation_id = "getNewsBySlug",
    summary = "Get a news item by slug",
    description = "Returns the full news item and increments its view count.",
    params(("slug" = String, Path, description = "News item slug")),
    responses(
        (status = 200, description = "News item", body = NewsResponse),
        (status = 404, description = "News item not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(slug = %slug))]
pub async fn get_news_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<NewsResponse>, AppError> {
    let txn = state.db.begin().await?;

    let updated = news::Entity::update_many()
        .col_expr(
            news::Column::ViewCount,
            Expr::col(news::Column::ViewCount).add(1),
        )
        .filter(news::Column::Slug.eq(slug.as_str()))
        .exec(&txn)
        .await?;
    if updated.rows_affected == 0 {
        return Err(AppError::NotFound("News item not found".into()));
    }

    let model = news::Entity::find()
        .filter(news::Column::Slug.eq(slug.as_str()))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("News item not found".into()))?;
    let response = news_detail(&txn, model).await?;
    txn.commit().await?;

    Ok(Json(response))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "News",
    operation_id = "updateNews",
    summary = "Update a news item",
    description = "Partially updates a news item. Omitted fields are left unchanged and nullable fields accept `null`. `tag_ids`, `related_news_ids` and `related_event_ids` replace the current sets when present. Changing the title without giving a slug regenerates the slug.",
    params(("id" = i32, Path, description = "News item ID")),
    request_body = UpdateNewsRequest,
    responses(
        (status = 200, description = "News item updated", body = NewsResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "News item not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Slug already in use (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn update_news(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateNewsRequest>,
) -> Result<Json<NewsResponse>, AppError> {
    validate_update_news(&payload)?;

    if payload == UpdateNewsRequest::default() {
        let existing = find_news(&state.db, id).await?;
        return Ok(Json(news_detail(&state.db, existing).await?));
    }

    let txn = state.db.begin().await?;
    let existing = find_news_for_update(&txn, id).await?;

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
            resolve_slug::<news::Entity, _>(
                &txn,
                &NEWS,
                news::Column::Slug,
                news::Column::Id,
                payload.slug.as_deref(),
                &title,
                Some(id),
            )
            .await?,
        )
    } else {
        None
    };

    let mut active: news::ActiveModel = existing.into();
    active.title = Set(title);
    if let Some(slug) = slug {
        active.slug = Set(slug);
    }
    if let Some(content) = payload.content {
        active.content = Set(content);
    }
    if let Some(v) = patch_text(payload.summary) {
        active.summary = Set(v);
    }
    if let Some(v) = patch_text(payload.author) {
        active.author = Set(v);
    }
    if let Some(v) = patch_text(payload.source) {
        active.source = Set(v);
    }
    if let Some(v) = patch_text(payload.contact_info) {
        active.contact_info = Set(v);
    }
    if let Some(v) = payload.category_id {
        active.category_id =
            Set(resolve_reference::<category::Entity, _>(&txn, &NEWS, "category_id", v).await?);
    }
    if let Some(v) = payload.featured_image_id {
        active.featured_image_id = Set(resolve_reference::<stored_file::Entity, _>(
            &txn,
            &NEWS,
            "featured_image_id",
            v,
        )
        .await?);
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
    if let Some(ref related) = payload.related_news_ids {
        replace_related(&txn, id, related).await?;
    }
    if let Some(ref events) = payload.related_event_ids {
        replace_linked_events(&txn, id, events).await?;
    }

    let response = news_detail(&txn, model).await?;
    txn.commit().await?;

    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "News",
    operation_id = "deleteNews",
    summary = "Delete a news item",
    description = "Deletes a news item together with its tag assignments, related links, event links and comments. Uploaded images are kept.",
    params(("id" = i32, Path, description = "News item ID")),
    responses(
        (status = 204, description = "News item deleted"),
        (status = 404, description = "News item not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_news(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    find_news_for_update(&txn, id).await?;

    news_tag::Entity::delete_many()
        .filter(news_tag::Column::NewsId.eq(id))
        .exec(&txn)
        .await?;
    related_news::Entity::delete_many()
        .filter(
            Condition::any()
                .add(related_news::Column::NewsId.eq(id))
                .add(related_news::Column::RelatedNewsId.eq(id)),
        )
        .exec(&txn)
        .await?;
    news_event::Entity::delete_many()
        .filter(news_event::Column::NewsId.eq(id))
        .exec(&txn)
        .await?;
    delete_comments(&txn, CommentOwner::News(id)).await?;
    news::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_news<C: ConnectionTrait>(db: &C, id: i32) -> Result<news::Model, AppError> {
    news::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("News item not found".into()))
}

async fn find_news_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<news::Model, AppError> {
    use sea_orm::sea_query::LockType;
    news::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("News item not found".into()))
}

/// Categories keyed by id, for news and events.
pub(crate) async fn load_categories<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, CategoryResponse>, DbErr> {
    let rows = load_by_ids::<category::Entity, _>(db, category::Column::Id, ids, |m| m.id).await?;
    Ok(rows.into_iter().map(|(id, m)| (id, m.into())).collect())
}

async fn replace_tags(txn: &DatabaseTransaction, news_id: i32, tag_ids: &[i32]) -> Result<(), DbErr> {
    news_tag::Entity::delete_many()
        .filter(news_tag::Column::NewsId.eq(news_id))
        .exec(txn)
        .await?;

    let tag_ids = existing_ids::<tag::Entity, _>(txn, tag::Column::Id, tag_ids, None).await?;
    if tag_ids.is_empty() {
        return Ok(());
    }
    news_tag::Entity::insert_many(tag_ids.into_iter().map(|tag_id| news_tag::ActiveModel {
        news_id: Set(news_id),
        tag_id: Set(tag_id),
    }))
    .exec_without_returning(txn)
    .await?;
    Ok(())
}

async fn replace_related(
    txn: &DatabaseTransaction,
    news_id: i32,
    related_ids: &[i32],
) -> Result<(), DbErr> {
    related_news::Entity::delete_many()
        .filter(related_news::Column::NewsId.eq(news_id))
        .exec(txn)
        .await?;

    let related_ids =
        existing_ids::<news::Entity, _>(txn, news::Column::Id, related_ids, Some(news_id)).await?;
    if related_ids.is_empty() {
        return Ok(());
    }
    related_news::Entity::insert_many(related_ids.into_iter().map(|related_news_id| {
        related_news::ActiveModel {
            news_id: Set(news_id),
            related_news_id: Set(related_news_id),
        }
    }))
    .exec_without_returning(txn)
    .await?;
    Ok(())
}

/// Replace the events linked to a news item.
async fn replace_linked_events(
    txn: &DatabaseTransaction,
    news_id: i32,
    event_ids: &[i32],
) -> Result<(), DbErr> {
    news_event::Entity::delete_many()
        .filter(news_event::Column::NewsId.eq(news_id))
        .exec(txn)
        .await?;

    let event_ids = existing_ids::<event::Entity, _>(txn, event::Column::Id, event_ids, None).await?;
    if event_ids.is_empty() {
        return Ok(());
    }
    news_event::Entity::insert_many(event_ids.into_iter().map(|event_id| {
        news_event::ActiveModel {
            news_id: Set(news_id),
            event_id: Set(event_id),
        }
    }))
    .exec_without_returning(txn)
    .await?;
    Ok(())
}

async fn news_detail<C: ConnectionTrait>(
    db: &C,
    model: news::Model,
) -> Result<NewsResponse, AppError> {
    let category = load_categories(db, model.category_id)
        .await?
        .into_values()
        .next();
    let tags = load_tags::<news_tag::Entity, _>(
        db,
        news_tag::Column::NewsId,
        news_tag::Column::TagId,
        &[model.id],
    )
    .await?
    .remove(&model.id)
    .unwrap_or_default();
    let featured_image = load_files(db, model.featured_image_id)
        .await?
        .into_values()
        .next();

    let related_ids = linked_ids::<related_news::Entity, _>(
        db,
        related_news::Column::NewsId,
        related_news::Column::RelatedNewsId,
        model.id,
    )
    .await?;
    let related = load_by_ids::<news::Entity, _>(db, news::Column::Id, related_ids.clone(), |m| m.id)
        .await?;
    let related_news = related_ids
        .iter()
        .filter_map(|id| related.get(id))
        .map(ContentSummary::from)
        .collect();

    let event_ids = linked_ids::<news_event::Entity, _>(
        db,
        news_event::Column::NewsId,
        news_event::Column::EventId,
        model.id,
    )
    .await?;
    let events =
        load_by_ids::<event::Entity, _>(db, event::Column::Id, event_ids.clone(), |m| m.id).await?;
    let related_events = event_ids
        .iter()
        .filter_map(|id| events.get(id))
        .map(ContentSummary::from)
        .collect();

    let comments = approved_comments(db, CommentOwner::News(model.id)).await?;

    Ok(NewsResponse::new(
        model,
        NewsRelations {
            category,
            tags,
            featured_image,
            related_news,
            related_events,
            comments,
        },
    ))
}
