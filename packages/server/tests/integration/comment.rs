use serde_json::json;

use crate::common::{TestApp, ids_of, routes};

mod comment_creation {
    use super::*;

    #[tokio::test]
    async fn new_comments_await_approval() {
        let app = TestApp::spawn().await;
        let blog = app.create_blog("Commented post").await;

        let res = app
            .post(
                &routes::blog_comments(blog),
                &json!({
                    "content": "Nice post",
                    "author_name": "Ann",
                    "author_email": "Ann@Example.com",
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["is_approved"], false);
        assert_eq!(res.body["content_type"], "blog");
        assert_eq!(res.body["content_id"], blog);
        assert_eq!(res.body["author_email"], "ann@example.com");

        let public = app.get(&routes::blog_comments(blog)).await;
        assert_eq!(public.body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn generic_endpoint_targets_any_content() {
        let app = TestApp::spawn().await;
        let event = app.create_event("Discussed event").await;

        let res = app
            .post(
                routes::COMMENTS,
                &json!({
                    "content_type": "event",
                    "content_id": event,
                    "content": "See you there",
                    "author_name": "Bo",
                }),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["content_type"], "event");
    }

    #[tokio::test]
    async fn missing_content_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                &routes::news_comments(777),
                &json!({ "content": "Hello", "author_name": "Cy" }),
            )
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn validates_content_and_email() {
        let app = TestApp::spawn().await;
        let blog = app.create_blog("Strict post").await;

        let res = app
            .post(
                &routes::blog_comments(blog),
                &json!({ "content": " ", "author_name": "Di" }),
            )
            .await;
        assert_eq!(res.status, 400);

        let res = app
            .post(
                &routes::blog_comments(blog),
                &json!({ "content": "ok", "author_name": "Di", "author_email": "not-an-email" }),
            )
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn foreign_parent_becomes_top_level() {
        let app = TestApp::spawn().await;
        let blog = app.create_blog("First thread").await;
        let other = app.create_blog("Second thread").await;
        let parent = app.comment_on_blog(blog, "Root comment").await;

        let reply = app
            .post(
                &routes::blog_comments(blog),
                &json!({ "content": "Reply", "author_name": "Ed", "parent_id": parent }),
            )
            .await;
        assert_eq!(reply.body["parent_id"], parent);

        let stray = app
            .post(
                &routes::blog_comments(other),
                &json!({ "content": "Stray", "author_name": "Ed", "parent_id": parent }),
            )
            .await;
        assert_eq!(stray.status, 201);
        assert!(stray.body["parent_id"].is_null());
    }

    #[tokio::test]
    async fn unknown_user_is_dropped() {
        let app = TestApp::spawn().await;
        let blog = app.create_blog("Anonymous post").await;

        let res = app
            .post(
                &routes::blog_comments(blog),
                &json!({ "content": "Hi", "author_name": "Fi", "user_id": 5555 }),
            )
            .await;
        assert_eq!(res.status, 201);
        assert!(res.body["user_id"].is_null());
    }
}

mod moderation {
    use super::*;

    #[tokio::test]
    async fn approval_publishes_and_is_idempotent() {
        let app = TestApp::spawn().await;
        let blog = app.create_blog("Moderated post").await;
        let id = app.comment_on_blog(blog, "Please approve").await;

        let res = app.post(&routes::comment_approve(id), &json!({})).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["is_approved"], true);

        let again = app.post(&routes::comment_approve(id), &json!({})).await;
        assert_eq!(again.status, 200);
        assert_eq!(again.body["is_approved"], true);

        let public = app.get(&routes::blog_comments(blog)).await;
        assert_eq!(ids_of(&public.body["data"]), vec![id as i64]);
    }

    #[tokio::test]
    async fn moderation_queue_lists_unapproved() {
        let app = TestApp::spawn().await;
        let blog = app.create_blog("Queue post").await;
        let first = app.comment_on_blog(blog, "first").await;
        let second = app.comment_on_blog(blog, "second").await;

        let res = app
            .get(&format!(
                "{}?content_type=blog&content_id={blog}&approved_only=false",
                routes::COMMENTS
            ))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(ids_of(&res.body["data"]), vec![second as i64, first as i64]);

        let res = app
            .get(&format!("{}?content_type=blog", routes::COMMENTS))
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn deleting_a_parent_keeps_replies() {
        let app = TestApp::spawn().await;
        let blog = app.create_blog("Threaded post").await;
        let parent = app.comment_on_blog(blog, "parent").await;
        let reply = app
            .post(
                &routes::blog_comments(blog),
                &json!({ "content": "child", "author_name": "Gus", "parent_id": parent }),
            )
            .await
            .id();

        assert_eq!(app.delete(&routes::comment(parent)).await.status, 204);

        let res = app.post(&routes::comment_approve(reply), &json!({})).await;
        assert_eq!(res.status, 200);
        assert!(res.body["parent_id"].is_null());
    }

    #[tokio::test]
    async fn approving_unknown_comment_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app.post(&routes::comment_approve(999), &json!({})).await;
        assert_eq!(res.status, 404);
    }
}
