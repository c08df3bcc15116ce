use serde_json::json;

use crate::common::{TestApp, ids_of, routes};

fn event_body(title: &str, start: &str) -> serde_json::Value {
    json!({
        "title": title,
        "description": "All welcome.",
        "start_date": start,
    })
}

mod event_creation {
    use super::*;

    #[tokio::test]
    async fn defaults_to_free_and_published() {
        let app = TestApp::spawn().await;

        let res = app
            .post(routes::EVENTS, &event_body("Summer fair", "2099-07-01T10:00:00Z"))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["slug"], "summer-fair");
        assert_eq!(res.body["is_free"], true);
        assert_eq!(res.body["is_published"], true);
    }

    #[tokio::test]
    async fn end_before_start_is_rejected() {
        let app = TestApp::spawn().await;
        let mut body = event_body("Backwards event", "2099-07-02T10:00:00Z");
        body["end_date"] = json!("2099-07-01T10:00:00Z");

        let res = app.post(routes::EVENTS, &body).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn negative_price_is_rejected() {
        let app = TestApp::spawn().await;
        let mut body = event_body("Paid event", "2099-07-02T10:00:00Z");
        body["ticket_price"] = json!(-5.0);
        body["is_free"] = json!(false);

        let res = app.post(routes::EVENTS, &body).await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn links_related_events() {
        let app = TestApp::spawn().await;
        let first = app.create_event("Opening night").await;
        let mut body = event_body("Closing night", "2099-08-01T19:00:00Z");
        body["related_event_ids"] = json!([first]);

        let res = app.post(routes::EVENTS, &body).await;
        assert_eq!(ids_of(&res.body["related_events"]), vec![first as i64]);
    }
}

mod event_listing {
    use super::*;

    #[tokio::test]
    async fn hides_past_events_unless_asked() {
        let app = TestApp::spawn().await;
        app.post(routes::EVENTS, &event_body("Past event", "2001-01-01T10:00:00Z"))
            .await;
        app.post(routes::EVENTS, &event_body("Later event", "2099-02-01T10:00:00Z"))
            .await;
        app.post(routes::EVENTS, &event_body("Sooner event", "2099-01-01T10:00:00Z"))
            .await;

        let res = app.get(routes::EVENTS).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 2);
        assert_eq!(res.body["data"][0]["title"], "Sooner event");
        assert_eq!(res.body["data"][1]["title"], "Later event");

        let res = app.get(&format!("{}?include_past=true", routes::EVENTS)).await;
        assert_eq!(res.body["pagination"]["total"], 3);
        assert_eq!(res.body["data"][0]["title"], "Past event");
    }

    #[tokio::test]
    async fn searches_venue() {
        let app = TestApp::spawn().await;
        let mut body = event_body("Jazz evening", "2099-03-01T19:00:00Z");
        body["venue"] = json!("Riverside Hall");
        app.post(routes::EVENTS, &body).await;
        app.create_event("Chess club").await;

        let res = app.get(&format!("{}?search=riverside", routes::EVENTS)).await;
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["title"], "Jazz evening");
    }
}

mod event_update {
    use super::*;

    #[tokio::test]
    async fn update_checks_merged_schedule() {
        let app = TestApp::spawn().await;
        let mut body = event_body("Two day event", "2099-05-01T09:00:00Z");
        body["end_date"] = json!("2099-05-02T17:00:00Z");
        let id = app.post(routes::EVENTS, &body).await.id();

        let res = app
            .patch(&routes::event(id), &json!({ "start_date": "2099-05-03T09:00:00Z" }))
            .await;
        assert_eq!(res.status, 400);

        let res = app
            .patch(
                &routes::event(id),
                &json!({ "start_date": "2099-05-03T09:00:00Z", "end_date": null }),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["end_date"].is_null());
    }

    #[tokio::test]
    async fn slug_lookup_and_delete() {
        let app = TestApp::spawn().await;
        let id = app.create_event("Book swap").await;

        let res = app.get(&routes::event_by_slug("book-swap")).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["view_count"], 1);

        assert_eq!(app.delete(&routes::event(id)).await.status, 204);
        assert_eq!(app.get(&routes::event_by_slug("book-swap")).await.status, 404);
    }
}
