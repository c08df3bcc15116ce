use serde_json::json;

use crate::common::{TestApp, ids_of, routes};

mod tags {
    use super::*;

    #[tokio::test]
    async fn creates_and_lists_tags_by_name() {
        let app = TestApp::spawn().await;
        app.create_tag("zebra").await;
        app.create_tag("apple").await;

        let res = app.get(routes::TAGS).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body[0]["name"], "apple");
        assert_eq!(res.body[1]["name"], "zebra");
    }

    #[tokio::test]
    async fn duplicate_name_conflicts() {
        let app = TestApp::spawn().await;
        app.create_tag("rust").await;

        let res = app.post(routes::TAGS, &json!({ "name": "rust" })).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app.post(routes::TAGS, &json!({ "name": "  " })).await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn deleting_a_tag_detaches_it() {
        let app = TestApp::spawn().await;
        let tag = app.create_tag("temporary").await;
        let keep = app.create_tag("permanent").await;
        let res = app
            .post(
                routes::BLOGS,
                &json!({ "title": "Tagged twice", "content": "x", "tag_ids": [tag, keep] }),
            )
            .await;
        let blog = res.id();

        assert_eq!(app.delete(&routes::tag(tag)).await.status, 204);
        assert_eq!(app.get(&routes::tag(tag)).await.status, 404);

        let res = app.get(&routes::blog(blog)).await;
        assert_eq!(ids_of(&res.body["tags"]), vec![keep as i64]);
    }
}

mod categories {
    use super::*;

    #[tokio::test]
    async fn create_update_and_conflict() {
        let app = TestApp::spawn().await;
        let id = app.create_category("Community").await;
        app.create_category("Sports").await;

        let res = app
            .patch(&routes::category(id), &json!({ "description": "Local life" }))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["description"], "Local life");

        let res = app.patch(&routes::category(id), &json!({ "name": "Sports" })).await;
        assert_eq!(res.status, 409);

        let res = app.post(routes::CATEGORIES, &json!({ "name": "Community" })).await;
        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn deleting_a_category_clears_content_references() {
        let app = TestApp::spawn().await;
        let category = app.create_category("Announcements").await;
        let res = app
            .post(
                routes::NEWS,
                &json!({ "title": "Categorised news", "content": "x", "category_id": category }),
            )
            .await;
        let news = res.id();
        assert_eq!(res.body["category"]["name"], "Announcements");

        assert_eq!(app.delete(&routes::category(category)).await.status, 204);

        let res = app.get(&routes::news(news)).await;
        assert_eq!(res.status, 200);
        assert!(res.body["category_id"].is_null());
        assert!(res.body["category"].is_null());
    }
}

mod blog_categories {
    use super::*;

    #[tokio::test]
    async fn existing_name_returns_existing_category() {
        let app = TestApp::spawn().await;
        let id = app.create_blog_category("Tutorials").await;

        let res = app
            .post(routes::BLOG_CATEGORIES, &json!({ "name": "Tutorials" }))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.id(), id);
    }

    #[tokio::test]
    async fn taken_explicit_slug_is_disambiguated() {
        let app = TestApp::spawn().await;
        let res = app
            .post(routes::BLOG_CATEGORIES, &json!({ "name": "Guides", "slug": "howto" }))
            .await;
        assert_eq!(res.body["slug"], "howto");

        let res = app
            .post(routes::BLOG_CATEGORIES, &json!({ "name": "Recipes", "slug": "HowTo" }))
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["slug"], "howto-2");

        let fetched = app.get(&routes::blog_category(res.id())).await;
        assert_eq!(fetched.body["name"], "Recipes");
    }
}
