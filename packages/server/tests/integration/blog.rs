use serde_json::json;

use crate::common::{TestApp, UploadFields, ids_of, routes};

mod blog_creation {
    use super::*;

    #[tokio::test]
    async fn generates_slug_and_reading_time() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::BLOGS,
                &json!({
                    "title": "Hello, World Post!",
                    "content": "<p>short</p>",
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["slug"], "hello-world-post");
        assert_eq!(res.body["reading_time_minutes"], 1);
        assert_eq!(res.body["is_published"], true);
        assert_eq!(res.body["view_count"], 0);
    }

    #[tokio::test]
    async fn duplicate_titles_get_numbered_slugs() {
        let app = TestApp::spawn().await;
        let first = app.create_blog("Same Title").await;
        let second = app.create_blog("Same Title").await;
        let third = app.create_blog("Same Title").await;

        assert_eq!(app.get(&routes::blog(first)).await.body["slug"], "same-title");
        assert_eq!(app.get(&routes::blog(second)).await.body["slug"], "same-title-2");
        assert_eq!(app.get(&routes::blog(third)).await.body["slug"], "same-title-3");
    }

    #[tokio::test]
    async fn rejects_taken_explicit_slug() {
        let app = TestApp::spawn().await;
        app.create_blog("Original post").await;

        let res = app
            .post(
                routes::BLOGS,
                &json!({
                    "title": "Another post",
                    "slug": "Original Post",
                    "content": "x",
                }),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");

        let res = app.get(routes::BLOGS).await;
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["title"], "Original post");
    }

    #[tokio::test]
    async fn rejects_short_title_and_empty_content() {
        let app = TestApp::spawn().await;

        let res = app
            .post(routes::BLOGS, &json!({ "title": "Hey", "content": "x" }))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let res = app
            .post(routes::BLOGS, &json!({ "title": "Long enough", "content": "  " }))
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn unknown_references_are_dropped() {
        let app = TestApp::spawn().await;
        let tag = app.create_tag("rust").await;

        let res = app
            .post(
                routes::BLOGS,
                &json!({
                    "title": "Dangling references",
                    "content": "x",
                    "category_id": 9999,
                    "featured_image_id": 9999,
                    "tag_ids": [tag, 9999, tag],
                    "related_blog_ids": [9999],
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["category_id"].is_null());
        assert!(res.body["featured_image_id"].is_null());
        assert_eq!(ids_of(&res.body["tags"]), vec![tag as i64]);
        assert!(res.body["related_blogs"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn links_category_tags_and_related_posts() {
        let app = TestApp::spawn().await;
        let category = app.create_blog_category("Engineering").await;
        let zeta = app.create_tag("zeta").await;
        let alpha = app.create_tag("alpha").await;
        let other = app.create_blog("Earlier post").await;

        let res = app
            .post(
                routes::BLOGS,
                &json!({
                    "title": "Linked post",
                    "content": "x",
                    "category_id": category,
                    "tag_ids": [zeta, alpha],
                    "related_blog_ids": [other],
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["category"]["name"], "Engineering");
        assert_eq!(res.body["tags"][0]["name"], "alpha");
        assert_eq!(res.body["tags"][1]["name"], "zeta");
        assert_eq!(res.body["related_blogs"][0]["slug"], "earlier-post");

        // Related links are one-directional.
        let earlier = app.get(&routes::blog(other)).await;
        assert!(earlier.body["related_blogs"].as_array().unwrap().is_empty());
    }
}

mod blog_reading {
    use super::*;

    #[tokio::test]
    async fn slug_lookup_counts_views_but_id_lookup_does_not() {
        let app = TestApp::spawn().await;
        let id = app.create_blog("Counted post").await;

        let first = app.get(&routes::blog_by_slug("counted-post")).await;
        assert_eq!(first.status, 200);
        assert_eq!(first.body["view_count"], 1);

        let second = app.get(&routes::blog_by_slug("counted-post")).await;
        assert_eq!(second.body["view_count"], 2);

        let by_id = app.get(&routes::blog(id)).await;
        assert_eq!(by_id.body["view_count"], 2);
        let again = app.get(&routes::blog(id)).await;
        assert_eq!(again.body["view_count"], 2);
    }

    #[tokio::test]
    async fn unknown_slug_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app.get(&routes::blog_by_slug("nope")).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn detail_shows_only_approved_comments() {
        let app = TestApp::spawn().await;
        let id = app.create_blog("Discussed post").await;
        let approved = app.comment_on_blog(id, "Great read").await;
        app.comment_on_blog(id, "Pending review").await;

        let res = app.post(&routes::comment_approve(approved), &json!({})).await;
        assert_eq!(res.status, 200);

        let detail = app.get(&routes::blog(id)).await;
        assert_eq!(ids_of(&detail.body["comments"]), vec![approved as i64]);
    }
}

mod blog_listing {
    use super::*;

    #[tokio::test]
    async fn lists_published_posts_newest_first() {
        let app = TestApp::spawn().await;
        app.post(
            routes::BLOGS,
            &json!({ "title": "Old post", "content": "x", "publish_date": "2020-01-01T00:00:00Z" }),
        )
        .await;
        app.post(
            routes::BLOGS,
            &json!({ "title": "New post", "content": "x", "publish_date": "2024-01-01T00:00:00Z" }),
        )
        .await;
        app.post(
            routes::BLOGS,
            &json!({ "title": "Draft post", "content": "x", "is_published": false }),
        )
        .await;

        let res = app.get(routes::BLOGS).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 2);
        assert_eq!(res.body["data"][0]["title"], "New post");
        assert_eq!(res.body["data"][1]["title"], "Old post");

        let drafts = app.get(&format!("{}?is_published=false", routes::BLOGS)).await;
        assert_eq!(drafts.body["pagination"]["total"], 1);
        assert_eq!(drafts.body["data"][0]["title"], "Draft post");
    }

    #[tokio::test]
    async fn filters_by_search_and_tag() {
        let app = TestApp::spawn().await;
        let tag = app.create_tag("databases").await;
        app.create_blog("Writing parsers").await;
        app.post(
            routes::BLOGS,
            &json!({ "title": "Postgres tuning", "content": "indexes", "tag_ids": [tag] }),
        )
        .await;

        let res = app.get(&format!("{}?search=POSTGRES", routes::BLOGS)).await;
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["title"], "Postgres tuning");

        let res = app.get(&format!("{}?tag_ids={tag}", routes::BLOGS)).await;
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["tags"][0]["name"], "databases");

        let res = app.get(&format!("{}?tag_ids=abc", routes::BLOGS)).await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn paginates() {
        let app = TestApp::spawn().await;
        for i in 0..5 {
            app.create_blog(&format!("Paged post {i}")).await;
        }

        let res = app.get(&format!("{}?page=2&limit=2", routes::BLOGS)).await;
        assert_eq!(res.body["data"].as_array().unwrap().len(), 2);
        assert_eq!(res.body["pagination"]["page"], 2);
        assert_eq!(res.body["pagination"]["total"], 5);
        assert_eq!(res.body["pagination"]["total_pages"], 3);
    }

    #[tokio::test]
    async fn huge_page_yields_empty_result() {
        let app = TestApp::spawn().await;
        app.create_blog("Only post").await;

        let res = app
            .get(&format!("{}?page={}&limit=100", routes::BLOGS, u64::MAX))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["data"].as_array().unwrap().is_empty());
        assert_eq!(res.body["pagination"]["total"], 1);
    }
}

mod blog_update {
    use super::*;

    #[tokio::test]
    async fn title_change_regenerates_slug() {
        let app = TestApp::spawn().await;
        let id = app.create_blog("First title").await;

        let res = app
            .patch(&routes::blog(id), &json!({ "title": "Second title" }))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["slug"], "second-title");
    }

    #[tokio::test]
    async fn keeping_the_same_title_keeps_the_slug() {
        let app = TestApp::spawn().await;
        let id = app.create_blog("Stable title").await;

        let res = app
            .patch(&routes::blog(id), &json!({ "title": "Stable title", "content": "new" }))
            .await;
        assert_eq!(res.body["slug"], "stable-title");
        assert_eq!(res.body["content"], "new");
    }

    #[tokio::test]
    async fn empty_patch_returns_current_post() {
        let app = TestApp::spawn().await;
        let id = app.create_blog("Untouched post").await;

        let res = app.patch(&routes::blog(id), &json!({})).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["title"], "Untouched post");
    }

    #[tokio::test]
    async fn tag_list_replaces_existing_tags() {
        let app = TestApp::spawn().await;
        let a = app.create_tag("a-tag").await;
        let b = app.create_tag("b-tag").await;
        let res = app
            .post(routes::BLOGS, &json!({ "title": "Tagged post", "content": "x", "tag_ids": [a] }))
            .await;
        let id = res.id();

        let res = app.patch(&routes::blog(id), &json!({ "tag_ids": [b] })).await;
        assert_eq!(ids_of(&res.body["tags"]), vec![b as i64]);
    }

    #[tokio::test]
    async fn null_clears_optional_text() {
        let app = TestApp::spawn().await;
        let res = app
            .post(
                routes::BLOGS,
                &json!({ "title": "With intro", "content": "x", "introduction": "Hi" }),
            )
            .await;
        let id = res.id();

        let res = app.patch(&routes::blog(id), &json!({ "introduction": null })).await;
        assert!(res.body["introduction"].is_null());
    }

    #[tokio::test]
    async fn unknown_post_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app.patch(&routes::blog(4242), &json!({ "title": "Whatever title" })).await;
        assert_eq!(res.status, 404);
    }
}

mod blog_deletion {
    use super::*;

    #[tokio::test]
    async fn removes_links_and_comments() {
        let app = TestApp::spawn().await;
        let target = app.create_blog("Doomed post").await;
        let res = app
            .post(
                routes::BLOGS,
                &json!({ "title": "Referrer post", "content": "x", "related_blog_ids": [target] }),
            )
            .await;
        let referrer = res.id();
        let comment = app.comment_on_blog(target, "bye").await;

        let res = app.delete(&routes::blog(target)).await;
        assert_eq!(res.status, 204);

        assert_eq!(app.get(&routes::blog(target)).await.status, 404);
        assert_eq!(app.delete(&routes::comment(comment)).await.status, 404);
        let referrer = app.get(&routes::blog(referrer)).await;
        assert!(referrer.body["related_blogs"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn keeps_featured_image_file() {
        let app = TestApp::spawn().await;
        let res = app
            .upload("hero.txt", "text/plain", b"hero".to_vec(), UploadFields::default())
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let file = res.id();
        let key = res.body["file_path"].as_str().unwrap().to_string();

        let res = app
            .post(
                routes::BLOGS,
                &json!({ "title": "Illustrated post", "content": "x", "featured_image_id": file }),
            )
            .await;
        assert_eq!(res.body["featured_image"]["id"], file);

        assert_eq!(app.delete(&routes::blog(res.id())).await.status, 204);

        let res = app.get(&routes::file(file)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], file);
        assert!(app.storage_dir.path().join(&key).exists());
    }
}
