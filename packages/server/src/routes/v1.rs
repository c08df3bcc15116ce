use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{blog, comment, event, news, newsletter, storage, taxonomy, user};
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/blogs", blog_routes())
        .nest("/blog-categories", blog_category_routes())
        .nest("/news", news_routes())
        .nest("/events", event_routes())
        .nest("/categories", category_routes())
        .nest("/tags", tag_routes())
        .nest("/comments", comment_routes())
        .nest("/newsletter", newsletter_routes())
        .nest("/storage", storage_routes(config.storage.max_upload_size))
        .nest("/users", user_routes())
        .nest("/contact", contact_routes())
}

fn blog_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(blog::list_blogs, blog::create_blog))
        .routes(routes!(blog::get_blog_by_slug))
        .routes(routes!(blog::get_blog, blog::update_blog, blog::delete_blog))
        .routes(routes!(
            comment::list_blog_comments,
            comment::create_blog_comment
        ))
}

fn blog_category_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            taxonomy::list_blog_categories,
            taxonomy::create_blog_category
        ))
        .routes(routes!(taxonomy::get_blog_category))
}

fn news_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(news::list_news, news::create_news))
        .routes(routes!(news::get_news_by_slug))
        .routes(routes!(news::get_news, news::update_news, news::delete_news))
        .routes(routes!(
            comment::list_news_comments,
            comment::create_news_comment
        ))
}

fn event_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(event::list_events, event::create_event))
        .routes(routes!(event::get_event_by_slug))
        .routes(routes!(
            event::get_event,
            event::update_event,
            event::delete_event
        ))
        .routes(routes!(
            comment::list_event_comments,
            comment::create_event_comment
        ))
}

fn category_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(taxonomy::list_categories, taxonomy::create_category))
        .routes(routes!(
            taxonomy::get_category,
            taxonomy::update_category,
            taxonomy::delete_category
        ))
}

fn tag_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(taxonomy::list_tags, taxonomy::create_tag))
        .routes(routes!(taxonomy::get_tag, taxonomy::delete_tag))
}

fn comment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(comment::list_comments, comment::create_comment))
        .routes(routes!(comment::delete_comment))
        .routes(routes!(comment::approve_comment))
}

fn newsletter_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(newsletter::subscribe))
        .routes(routes!(newsletter::confirm))
        .routes(routes!(newsletter::unsubscribe))
}

fn storage_routes(max_upload_size: u64) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(storage::upload_file))
        .layer(storage::upload_body_limit(max_upload_size));

    OpenApiRouter::new()
        .routes(routes!(storage::list_files))
        .routes(routes!(storage::get_file, storage::delete_file))
        .routes(routes!(storage::file_url))
        .routes(routes!(storage::list_objects))
        .routes(routes!(storage::serve_local))
        .merge(upload)
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(user::create_user))
        .routes(routes!(user::get_user))
}

fn contact_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(user::submit_contact))
}
