use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::newsletter_subscription::{self, SubscriptionStatus};

pub const ALREADY_SUBSCRIBED: &str = "This email is already subscribed to our newsletter.";
pub const REACTIVATED: &str = "Your subscription has been reactivated.";
pub const CONFIRMED: &str = "Subscription confirmed successfully";
pub const UNSUBSCRIBED: &str = "Successfully unsubscribed";

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubscribeRequest {
    #[schema(example = "reader@example.com")]
    pub email: String,
    pub name: Option<String>,
    /// Where the sign-up came from, e.g. `footer`.
    pub source: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UnsubscribeRequest {
    #[schema(example = "reader@example.com")]
    pub email: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubscriptionResponse {
    pub id: i32,
    pub email: String,
    pub name: Option<String>,
    pub source: Option<String>,
    pub status: SubscriptionStatus,
    pub is_confirmed: bool,
    pub is_active: bool,
    pub subscribed_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
    /// Set when an existing subscription was returned or reactivated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SubscriptionResponse {
    pub fn new(m: newsletter_subscription::Model, message: Option<&str>) -> Self {
        Self {
            id: m.id,
            is_confirmed: m.confirmed_at.is_some(),
            is_active: m.status != SubscriptionStatus::Unsubscribed,
            email: m.email,
            name: m.name,
            source: m.source,
            status: m.status,
            subscribed_at: m.subscribed_at,
            confirmed_at: m.confirmed_at,
            unsubscribed_at: m.unsubscribed_at,
            message: message.map(String::from),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Status a subscription returns to when it is reactivated.
pub fn reactivated_status(m: &newsletter_subscription::Model) -> SubscriptionStatus {
    if m.confirmed_at.is_some() {
        SubscriptionStatus::Confirmed
    } else {
        SubscriptionStatus::Pending
    }
}

/// Status after a confirmation link is used. Unsubscribed stays unsubscribed.
pub fn confirmed_status(current: SubscriptionStatus) -> SubscriptionStatus {
    match current {
        SubscriptionStatus::Unsubscribed => SubscriptionStatus::Unsubscribed,
        _ => SubscriptionStatus::Confirmed,
    }
}
