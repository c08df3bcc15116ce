use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::newsletter_subscription::{self, SubscriptionStatus};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::newsletter::*;
use crate::models::shared::{non_blank, normalize_email, validate_email, validate_max_len};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/subscribe",
    tag = "Newsletter",
    operation_id = "subscribe",
    summary = "Subscribe to the newsletter",
    description = "Creates a pending subscription with a confirmation token. Subscribing an address that is already active returns the existing subscription with a message. Subscribing an address that had unsubscribed reactivates it.",
    request_body = SubscribeRequest,
    responses(
        (status = 201, description = "Subscription created", body = SubscriptionResponse),
        (status = 200, description = "Existing subscription returned or reactivated", body = SubscriptionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn subscribe(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SubscribeRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_email(&payload.email)?;
    validate_max_len(payload.name.as_deref(), "Name", 100)?;
    validate_max_len(payload.source.as_deref(), "Source", 100)?;
    let email = normalize_email(&payload.email);

    let txn = state.db.begin().await?;
    let existing = newsletter_subscription::Entity::find()
        .filter(newsletter_subscription::Column::Email.eq(email.as_str()))
        .one(&txn)
        .await?;

    if let Some(existing) = existing {
        if existing.status != SubscriptionStatus::Unsubscribed {
            return Ok((
                StatusCode::OK,
                Json(SubscriptionResponse::new(existing, Some(ALREADY_SUBSCRIBED))),
            ));
        }

        let status = reactivated_status(&existing);
        let mut active: newsletter_subscription::ActiveModel = existing.into();
        active.status = Set(status);
        active.unsubscribed_at = Set(None);
        let model = active.update(&txn).await?;
        txn.commit().await?;

        tracing::info!(id = model.id, "Newsletter subscription reactivated");
        return Ok((
            StatusCode::OK,
            Json(SubscriptionResponse::new(model, Some(REACTIVATED))),
        ));
    }

    let model = newsletter_subscription::ActiveModel {
        email: Set(email),
        name: Set(non_blank(payload.name)),
        source: Set(non_blank(payload.source)),
        status: Set(SubscriptionStatus::Pending),
        confirmation_token: Set(Some(Uuid::new_v4().to_string())),
        subscribed_at: Set(chrono::Utc::now()),
        confirmed_at: Set(None),
        unsubscribed_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    tracing::info!(id = model.id, "Newsletter subscription created");
    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse::new(model, None)),
    ))
}

#[utoipa::path(
    get,
    path = "/confirm/{token}",
    tag = "Newsletter",
    operation_id = "confirmSubscription",
    summary = "Confirm a subscription",
    description = "Confirms the subscription that owns the token. Tokens are single use.",
    params(("token" = String, Path, description = "Confirmation token")),
    responses(
        (status = 200, description = "Subscription confirmed", body = MessageResponse),
        (status = 404, description = "Invalid or already used token (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, token))]
pub async fn confirm(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let txn = state.db.begin().await?;
    let existing = newsletter_subscription::Entity::find()
        .filter(newsletter_subscription::Column::ConfirmationToken.eq(token.as_str()))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid or expired token".into()))?;

    let status = confirmed_status(existing.status);
    let mut active: newsletter_subscription::ActiveModel = existing.into();
    active.status = Set(status);
    active.confirmed_at = Set(Some(chrono::Utc::now()));
    active.confirmation_token = Set(None);
    let model = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(id = model.id, "Newsletter subscription confirmed");
    Ok(Json(MessageResponse::new(CONFIRMED)))
}

#[utoipa::path(
    post,
    path = "/unsubscribe",
    tag = "Newsletter",
    operation_id = "unsubscribe",
    summary = "Unsubscribe from the newsletter",
    request_body = UnsubscribeRequest,
    responses(
        (status = 200, description = "Unsubscribed", body = MessageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Email not subscribed (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    AppJson(payload): AppJson<UnsubscribeRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalize_email(&payload.email);

    let txn = state.db.begin().await?;
    let existing = newsletter_subscription::Entity::find()
        .filter(newsletter_subscription::Column::Email.eq(email.as_str()))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Email not found in our subscription list".into()))?;

    let mut active: newsletter_subscription::ActiveModel = existing.into();
    active.status = Set(SubscriptionStatus::Unsubscribed);
    active.unsubscribed_at = Set(Some(chrono::Utc::now()));
    let model = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(id = model.id, "Newsletter subscription cancelled");
    Ok(Json(MessageResponse::new(UNSUBSCRIBED)))
}
