use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

use server::entity::newsletter_subscription;

use crate::common::{TestApp, routes};

async fn token_for(app: &TestApp, email: &str) -> Option<String> {
    newsletter_subscription::Entity::find()
        .filter(newsletter_subscription::Column::Email.eq(email))
        .one(&app.db)
        .await
        .expect("DB query failed")
        .expect("Subscription not found")
        .confirmation_token
}

mod subscribe {
    use super::*;

    #[tokio::test]
    async fn new_subscription_is_pending() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::SUBSCRIBE,
                &json!({ "email": " Reader@Example.com ", "name": "Reader" }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["email"], "reader@example.com");
        assert_eq!(res.body["status"], "pending");
        assert_eq!(res.body["is_confirmed"], false);
        assert_eq!(res.body["is_active"], true);
        assert!(res.body.get("confirmation_token").is_none());
        assert!(token_for(&app, "reader@example.com").await.is_some());
    }

    #[tokio::test]
    async fn active_email_is_returned_as_is() {
        let app = TestApp::spawn().await;
        let first = app
            .post(routes::SUBSCRIBE, &json!({ "email": "dup@example.com" }))
            .await;

        let res = app
            .post(routes::SUBSCRIBE, &json!({ "email": "DUP@example.com" }))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.id(), first.id());
        assert!(res.body["message"].as_str().is_some());
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app
            .post(routes::SUBSCRIBE, &json!({ "email": "nobody" }))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn confirm_then_unsubscribe_then_reactivate() {
        let app = TestApp::spawn().await;
        app.post(routes::SUBSCRIBE, &json!({ "email": "cycle@example.com" }))
            .await;
        let token = token_for(&app, "cycle@example.com")
            .await
            .expect("pending subscription should have a token");

        let res = app.get(&routes::confirm(&token)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(token_for(&app, "cycle@example.com").await.is_none());

        // Tokens are single use.
        let res = app.get(&routes::confirm(&token)).await;
        assert_eq!(res.status, 404);

        let res = app
            .post(routes::UNSUBSCRIBE, &json!({ "email": "cycle@example.com" }))
            .await;
        assert_eq!(res.status, 200);

        let res = app
            .post(routes::SUBSCRIBE, &json!({ "email": "cycle@example.com" }))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "confirmed");
        assert_eq!(res.body["is_active"], true);
        assert_eq!(res.body["is_confirmed"], true);
        assert!(res.body["unsubscribed_at"].is_null());
    }

    #[tokio::test]
    async fn unconfirmed_subscription_reactivates_as_pending() {
        let app = TestApp::spawn().await;
        app.post(routes::SUBSCRIBE, &json!({ "email": "late@example.com" }))
            .await;
        app.post(routes::UNSUBSCRIBE, &json!({ "email": "late@example.com" }))
            .await;

        let res = app
            .post(routes::SUBSCRIBE, &json!({ "email": "late@example.com" }))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "pending");
    }

    #[tokio::test]
    async fn unknown_token_and_email_are_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::confirm("does-not-exist")).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Invalid or expired token");

        let res = app
            .post(routes::UNSUBSCRIBE, &json!({ "email": "ghost@example.com" }))
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Email not found in our subscription list");
    }
}
