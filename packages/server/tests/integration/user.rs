use serde_json::json;

use crate::common::{TestApp, routes};

mod users {
    use super::*;

    #[tokio::test]
    async fn creates_user_without_exposing_password() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::USERS,
                &json!({ "username": "alice", "email": "Alice@Example.com", "password": "secret1" }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["username"], "alice");
        assert_eq!(res.body["email"], "alice@example.com");
        assert!(res.body.get("password").is_none());

        let fetched = app.get(&routes::user(res.id())).await;
        assert_eq!(fetched.status, 200);
        assert_eq!(fetched.body["username"], "alice");
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let app = TestApp::spawn().await;
        app.post(
            routes::USERS,
            &json!({ "username": "bob", "email": "bob@example.com", "password": "secret1" }),
        )
        .await;

        let res = app
            .post(
                routes::USERS,
                &json!({ "username": "bob", "email": "other@example.com", "password": "secret1" }),
            )
            .await;
        assert_eq!(res.status, 409);

        let res = app
            .post(
                routes::USERS,
                &json!({ "username": "robert", "email": "BOB@example.com", "password": "secret1" }),
            )
            .await;
        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn validates_input() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::USERS,
                &json!({ "username": "bad name", "email": "x@example.com", "password": "secret1" }),
            )
            .await;
        assert_eq!(res.status, 400);

        let res = app
            .post(
                routes::USERS,
                &json!({ "username": "carol", "email": "x@example.com", "password": "123" }),
            )
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let app = TestApp::spawn().await;
        assert_eq!(app.get(&routes::user(31337)).await.status, 404);
    }
}

mod contact {
    use super::*;

    #[tokio::test]
    async fn stores_submission() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::CONTACT,
                &json!({
                    "full_name": "Dana Smith",
                    "email": "dana@example.com",
                    "subject": "Partnership",
                    "message": "We would like to sponsor the fair.",
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["subject"], "Partnership");
        assert!(res.body["phone_number"].is_null());
    }

    #[tokio::test]
    async fn short_message_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::CONTACT,
                &json!({
                    "full_name": "Dana Smith",
                    "email": "dana@example.com",
                    "subject": "Hi",
                    "message": "Too short",
                }),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}
