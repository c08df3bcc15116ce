use serde_json::json;

use crate::common::{TestApp, ids_of, routes};

mod news_creation {
    use super::*;

    #[tokio::test]
    async fn creates_article_with_category_and_tags() {
        let app = TestApp::spawn().await;
        let category = app.create_category("Local").await;
        let tag = app.create_tag("council").await;

        let res = app
            .post(
                routes::NEWS,
                &json!({
                    "title": "Council approves budget",
                    "content": "The vote passed.",
                    "author": "Desk",
                    "category_id": category,
                    "tag_ids": [tag],
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["slug"], "council-approves-budget");
        assert_eq!(res.body["category"]["name"], "Local");
        assert_eq!(ids_of(&res.body["tags"]), vec![tag as i64]);
    }

    #[tokio::test]
    async fn rejects_overlong_summary() {
        let app = TestApp::spawn().await;
        let res = app
            .post(
                routes::NEWS,
                &json!({ "title": "Long summary", "content": "x", "summary": "s".repeat(501) }),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn rejects_taken_explicit_slug() {
        let app = TestApp::spawn().await;
        app.create_news("Breaking story").await;

        let res = app
            .post(
                routes::NEWS,
                &json!({ "title": "Other story", "slug": "breaking-story", "content": "x" }),
            )
            .await;
        assert_eq!(res.status, 409);
    }
}

mod news_relations {
    use super::*;

    #[tokio::test]
    async fn links_related_news_and_events() {
        let app = TestApp::spawn().await;
        let earlier = app.create_news("Earlier report").await;
        let event = app.create_event("Town meeting").await;

        let res = app
            .post(
                routes::NEWS,
                &json!({
                    "title": "Follow-up report",
                    "content": "x",
                    "related_news_ids": [earlier],
                    "related_event_ids": [event, 9999],
                }),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let id = res.id();
        assert_eq!(ids_of(&res.body["related_news"]), vec![earlier as i64]);
        assert_eq!(ids_of(&res.body["related_events"]), vec![event as i64]);

        let res = app.get(&routes::event(event)).await;
        assert_eq!(ids_of(&res.body["related_news"]), vec![id as i64]);
    }

    #[tokio::test]
    async fn cannot_relate_to_itself() {
        let app = TestApp::spawn().await;
        let id = app.create_news("Self reference").await;

        let res = app
            .patch(&routes::news(id), &json!({ "related_news_ids": [id] }))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["related_news"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_news_unlinks_events() {
        let app = TestApp::spawn().await;
        let event = app.create_event("Linked event").await;
        let res = app
            .post(
                routes::NEWS,
                &json!({ "title": "Linked news", "content": "x", "related_event_ids": [event] }),
            )
            .await;
        let id = res.id();

        assert_eq!(app.delete(&routes::news(id)).await.status, 204);
        assert_eq!(app.get(&routes::news(id)).await.status, 404);

        let res = app.get(&routes::event(event)).await;
        assert!(res.body["related_news"].as_array().unwrap().is_empty());
    }
}

mod news_reading {
    use super::*;

    #[tokio::test]
    async fn slug_lookup_counts_views() {
        let app = TestApp::spawn().await;
        app.create_news("Popular article").await;

        app.get(&routes::news_by_slug("popular-article")).await;
        let res = app.get(&routes::news_by_slug("popular-article")).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["view_count"], 2);
    }

    #[tokio::test]
    async fn filters_by_category_and_date() {
        let app = TestApp::spawn().await;
        let category = app.create_category("Weather").await;
        app.post(
            routes::NEWS,
            &json!({
                "title": "Storm warning",
                "content": "x",
                "category_id": category,
                "publish_date": "2024-03-10T08:00:00Z",
            }),
        )
        .await;
        app.post(
            routes::NEWS,
            &json!({ "title": "Market update", "content": "x", "publish_date": "2024-05-10T08:00:00Z" }),
        )
        .await;

        let res = app
            .get(&format!("{}?category_id={category}", routes::NEWS))
            .await;
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["title"], "Storm warning");

        let res = app
            .get(&format!("{}?start_date=2024-05-01&end_date=2024-05-31", routes::NEWS))
            .await;
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["title"], "Market update");
    }
}
