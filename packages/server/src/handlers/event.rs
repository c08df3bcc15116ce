use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{ExprTrait, Func, LikeExpr, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{
    category, event, event_tag, news, news_event, related_event, stored_file, tag,
};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::handlers::content::*;
use crate::handlers::news::load_categories;
use crate::models::comment::CommentOwner;
use crate::models::event::*;
use crate::models::policy::EVENT;
use crate::models::shared::{
    ContentSummary, PageWindow, Paginated, day_range, non_blank, parse_id_list, search_pattern,
};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Events",
    operation_id = "createEvent",
    summary = "Create an event",
    description = "Creates an event. The slug is derived from the title when omitted; an explicit slug that is already in use returns 409. `end_date` may not precede `start_date`. Unknown category or image ids are stored as null, and unknown tag, related event or news ids are dropped.",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Slug already in use (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(title = %payload.title))]
pub async fn create_event(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_event(&payload)?;

    let txn = state.db.begin().await?;

    let title = payload.title.trim().to_string();
    let slug = resolve_slug::<event::Entity, _>(
        &txn,
        &EVENT,
        event::Column::Slug,
        event::Column::Id,
        payload.slug.as_deref(),
        &title,
        None,
    )
    .await?;
    let category_id =
        resolve_reference::<category::Entity, _>(&txn, &EVENT, "category_id", payload.category_id)
            .await?;
    let featured_image_id = resolve_reference::<stored_file::Entity, _>(
        &txn,
        &EVENT,
        "featured_image_id",
        payload.featured_image_id,
    )
    .await?;

    let now = chrono::Utc::now();
    let model = event::ActiveModel {
        title: Set(title),
        slug: Set(slug),
        summary: Set(non_blank(payload.summary)),
        description: Set(payload.description),
        organizer: Set(non_blank(payload.organizer)),
        venue: Set(non_blank(payload.venue)),
        location_address: Set(non_blank(payload.location_address)),
        location_coordinates: Set(non_blank(payload.location_coordinates)),
        registration_link: Set(non_blank(payload.registration_link)),
        has_registration_form: Set(payload.has_registration_form),
        ticket_price: Set(payload.ticket_price),
        is_free: Set(payload.is_free),
        contact_info: Set(non_blank(payload.contact_info)),
        start_date: Set(payload.start_date),
        end_date: Set(payload.end_date),
        category_id: Set(category_id),
        featured_image_id: Set(featured_image_id),
        is_published: Set(payload.is_published),
        view_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    replace_tags(&txn, model.id, &payload.tag_ids).await?;
    replace_related(&txn, model.id, &payload.related_event_ids).await?;
    replace_linked_news(&txn, model.id, &payload.related_news_ids).await?;

    let response = event_detail(&txn, model).await?;
    txn.commit().await?;

    tracing::info!(id = response.id, slug = %response.slug, "Event created");
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Events",
    operation_id = "listEvents",
    summary = "List events",
    description = "Returns a page of events, soonest start date first. Events that have already started are hidden unless `include_past=true`, and only published events are listed unless `is_published=false`. `search` matches title, description, summary, venue and address case-insensitively; the date range applies to the start date and includes both ends.",
    params(EventListQuery),
    responses(
        (status = 200, description = "Page of events", body = Paginated<EventListItem>),
        (status = 400, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_events(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<EventListQuery>,
) -> Result<Json<Paginated<EventListItem>>, AppError> {
    let window = PageWindow::resolve(query.page, query.skip, query.limit);
    let tag_ids = parse_id_list(query.tag_ids.as_deref(), "tag_ids")?;
    let (from, to) = day_range(query.start_date, query.end_date)?;

    let mut select = event::Entity::find()
        .filter(event::Column::IsPublished.eq(query.is_published.unwrap_or(true)));

    if let Some(pattern) = search_pattern(query.search.as_deref()) {
        let mut any = Condition::any();
        for col in [
            event::Column::Title,
            event::Column::Description,
            event::Column::Summary,
            event::Column::Venue,
            event::Column::LocationAddress,
        ] {
            any = any.add(
                Expr::expr(Func::lower(Expr::col(col)))
                    .like(LikeExpr::new(pattern.clone()).escape('\\')),
            );
        }
        select = select.filter(any);
    }
    if let Some(category_id) = query.category_id {
        select = select.filter(event::Column::CategoryId.eq(category_id));
    }
    if !tag_ids.is_empty() {
        select = select.filter(
            event::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(event_tag::Column::EventId)
                    .from(event_tag::Entity)
                    .and_where(event_tag::Column::TagId.is_in(tag_ids))
                    .to_owned(),
            ),
        );
    }
    if let Some(from) = from {
        select = select.filter(event::Column::StartDate.gte(from));
    }
    if let Some(to) = to {
        select = select.filter(event::Column::StartDate.lt(to));
    }
    if !query.include_past.unwrap_or(false) {
        select = select.filter(event::Column::StartDate.gte(chrono::Utc::now()));
    }

    let total = select
        .clone()
        .paginate(&state.db, window.limit)
        .num_items()
        .await?;

    let rows = select
        .order_by_asc(event::Column::StartDate)
        .order_by_asc(event::Column::Id)
        .offset(Some(window.offset))
        .limit(Some(window.limit))
        .all(&state.db)
        .await?;

    let ids: Vec<i32> = rows.iter().map(|m| m.id).collect();
    let mut tags = load_tags::<event_tag::Entity, _>(
        &state.db,
        event_tag::Column::EventId,
        event_tag::Column::TagId,
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
            let event_tags = tags.remove(&m.id).unwrap_or_default();
            EventListItem::new(m, category, event_tags, featured)
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
    tag = "Events",
    operation_id = "getEvent",
    summary = "Get an event by ID",
    description = "Returns the full event with its category, tags, image, related events, linked news and approved comments. Does not count as a view.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event", body = EventResponse),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EventResponse>, AppError> {
    let model = find_event(&state.db, id).await?;
    Ok(Json(event_detail(&state.db, model).await?))
}

#[utoipa::path(
    get,
    path = "/slug/{slug}",
    tag = "Events",
    operation_id = "getEventBySlug",
    summary = "Get an event by slug",
    description = "Returns the full event and increments its view count.",
    params(("slug" = String, Path, description = "Event slug")),
    responses(
        (status = 200, description = "Event", body = EventResponse),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(slug = %slug))]
pub async fn get_event_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<EventResponse>, AppError> {
    let txn = state.db.begin().await?;

    let updated = event::Entity::update_many()
        .col_expr(
            event::Column::ViewCount,
            Expr::col(event::Column::ViewCount).add(1),
        )
        .filter(event::Column::Slug.eq(slug.as_str()))
        .exec(&txn)
        .await?;
    if updated.rows_affected == 0 {
        return Err(AppError::NotFound("Event not found".into()));
    }

    let model = event::Entity::find()
        .filter(event::Column::Slug.eq(slug.as_str()))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))?;
    let response = event_detail(&txn, model).await?;
    txn.commit().await?;

    Ok(Json(response))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Events",
    operation_id = "updateEvent",
    summary = "Update an event",
    description = "Partially updates an event. Omitted fields are left unchanged and nullable fields accept `null`. `tag_ids`, `related_event_ids` and `related_news_ids` replace the current sets when present. The resulting schedule must still have `end_date` on or after `start_date`.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Slug already in use (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    if payload == UpdateEventRequest::default() {
        let existing = find_event(&state.db, id).await?;
        return Ok(Json(event_detail(&state.db, existing).await?));
    }

    let txn = state.db.begin().await?;
    let existing = find_event_for_update(&txn, id).await?;
    validate_update_event(&payload, &existing)?;

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
            resolve_slug::<event::Entity, _>(
                &txn,
                &EVENT,
                event::Column::Slug,
                event::Column::Id,
                payload.slug.as_deref(),
                &title,
                Some(id),
            )
            .await?,
        )
    } else {
        None
    };

    let mut active: event::ActiveModel = existing.into();
    active.title = Set(title);
    if let Some(slug) = slug {
        active.slug = Set(slug);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(v) = patch_text(payload.summary) {
        active.summary = Set(v);
    }
    if let Some(v) = patch_text(payload.organizer) {
        active.organizer = Set(v);
    }
    if let Some(v) = patch_text(payload.venue) {
        active.venue = Set(v);
    }
    if let Some(v) = patch_text(payload.location_address) {
        active.location_address = Set(v);
    }
    if let Some(v) = patch_text(payload.location_coordinates) {
        active.location_coordinates = Set(v);
    }
    if let Some(v) = patch_text(payload.registration_link) {
        active.registration_link = Set(v);
    }
    if let Some(v) = patch_text(payload.contact_info) {
        active.contact_info = Set(v);
    }
    if let Some(v) = payload.has_registration_form {
        active.has_registration_form = Set(v);
    }
    if let Some(v) = payload.ticket_price {
        active.ticket_price = Set(v);
    }
    if let Some(v) = payload.is_free {
        active.is_free = Set(v);
    }
    if let Some(v) = payload.start_date {
        active.start_date = Set(v);
    }
    if let Some(v) = payload.end_date {
        active.end_date = Set(v);
    }
    if let Some(v) = payload.category_id {
        active.category_id =
            Set(resolve_reference::<category::Entity, _>(&txn, &EVENT, "category_id", v).await?);
    }
    if let Some(v) = payload.featured_image_id {
        active.featured_image_id = Set(resolve_reference::<stored_file::Entity, _>(
            &txn,
            &EVENT,
            "featured_image_id",
            v,
        )
        .await?);
    }
    if let Some(v) = payload.is_published {
        active.is_published = Set(v);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;

    if let Some(ref tag_ids) = payload.tag_ids {
        replace_tags(&txn, id, tag_ids).await?;
    }
    if let Some(ref related) = payload.related_event_ids {
        replace_related(&txn, id, related).await?;
    }
    if let Some(ref news_ids) = payload.related_news_ids {
        replace_linked_news(&txn, id, news_ids).await?;
    }

    let response = event_detail(&txn, model).await?;
    txn.commit().await?;

    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Events",
    operation_id = "deleteEvent",
    summary = "Delete an event",
    description = "Deletes an event together with its tag assignments, related links, news links and comments. Uploaded images are kept.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    find_event_for_update(&txn, id).await?;

    event_tag::Entity::delete_many()
        .filter(event_tag::Column::EventId.eq(id))
        .exec(&txn)
        .await?;
    related_event::Entity::delete_many()
        .filter(
            Condition::any()
                .add(related_event::Column::EventId.eq(id))
                .add(related_event::Column::RelatedEventId.eq(id)),
        )
        .exec(&txn)
        .await?;
    news_event::Entity::delete_many()
        .filter(news_event::Column::EventId.eq(id))
        .exec(&txn)
        .await?;
    delete_comments(&txn, CommentOwner::Event(id)).await?;
    event::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_event<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

async fn find_event_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<event::Model, AppError> {
    use sea_orm::sea_query::LockType;
    event::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

async fn replace_tags(
    txn: &DatabaseTransaction,
    event_id: i32,
    tag_ids: &[i32],
) -> Result<(), DbErr> {
    event_tag::Entity::delete_many()
        .filter(event_tag::Column::EventId.eq(event_id))
        .exec(txn)
        .await?;

    let tag_ids = existing_ids::<tag::Entity, _>(txn, tag::Column::Id, tag_ids, None).await?;
    if tag_ids.is_empty() {
        return Ok(());
    }
    event_tag::Entity::insert_many(tag_ids.into_iter().map(|tag_id| event_tag::ActiveModel {
        event_id: Set(event_id),
        tag_id: Set(tag_id),
    }))
    .exec_without_returning(txn)
    .await?;
    Ok(())
}

async fn replace_related(
    txn: &DatabaseTransaction,
    event_id: i32,
    related_ids: &[i32],
) -> Result<(), DbErr> {
    related_event::Entity::delete_many()
        .filter(related_event::Column::EventId.eq(event_id))
        .exec(txn)
        .await?;

    let related_ids =
        existing_ids::<event::Entity, _>(txn, event::Column::Id, related_ids, Some(event_id))
            .await?;
    if related_ids.is_empty() {
        return Ok(());
    }
    related_event::Entity::insert_many(related_ids.into_iter().map(|related_event_id| {
        related_event::ActiveModel {
            event_id: Set(event_id),
            related_event_id: Set(related_event_id),
        }
    }))
    .exec_without_returning(txn)
    .await?;
    Ok(())
}

/// Replace the news items linked to an event.
async fn replace_linked_news(
    txn: &DatabaseTransaction,
    event_id: i32,
    news_ids: &[i32],
) -> Result<(), DbErr> {
    news_event::Entity::delete_many()
        .filter(news_event::Column::EventId.eq(event_id))
        .exec(txn)
        .await?;

    let news_ids = existing_ids::<news::Entity, _>(txn, news::Column::Id, news_ids, None).await?;
    if news_ids.is_empty() {
        return Ok(());
    }
    news_event::Entity::insert_many(news_ids.into_iter().map(|news_id| {
        news_event::ActiveModel {
            news_id: Set(news_id),
            event_id: Set(event_id),
        }
    }))
    .exec_without_returning(txn)
    .await?;
    Ok(())
}

async fn event_detail<C: ConnectionTrait>(
    db: &C,
    model: event::Model,
) -> Result<EventResponse, AppError> {
    let category = load_categories(db, model.category_id)
        .await?
        .into_values()
        .next();
    let tags = load_tags::<event_tag::Entity, _>(
        db,
        event_tag::Column::EventId,
        event_tag::Column::TagId,
        &[model.id],
    )
    .await?
    .remove(&model.id)
    .unwrap_or_default();
    let featured_image = load_files(db, model.featured_image_id)
        .await?
        .into_values()
        .next();

    let related_ids = linked_ids::<related_event::Entity, _>(
        db,
        related_event::Column::EventId,
        related_event::Column::RelatedEventId,
        model.id,
    )
    .await?;
    let related =
        load_by_ids::<event::Entity, _>(db, event::Column::Id, related_ids.clone(), |m| m.id)
            .await?;
    let related_events = related_ids
        .iter()
        .filter_map(|id| related.get(id))
        .map(ContentSummary::from)
        .collect();

    let news_ids = linked_ids::<news_event::Entity, _>(
        db,
        news_event::Column::EventId,
        news_event::Column::NewsId,
        model.id,
    )
    .await?;
    let linked =
        load_by_ids::<news::Entity, _>(db, news::Column::Id, news_ids.clone(), |m| m.id).await?;
    let related_news = news_ids
        .iter()
        .filter_map(|id| linked.get(id))
        .map(ContentSummary::from)
        .collect();

    let comments = approved_comments(db, CommentOwner::Event(model.id)).await?;

    Ok(EventResponse::new(
        model,
        EventRelations {
            category,
            tags,
            featured_image,
            related_events,
            related_news,
            comments,
        },
    ))
}
