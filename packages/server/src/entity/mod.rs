pub mod blog;
pub mod blog_category;
pub mod blog_tag;
pub mod category;
pub mod comment;
pub mod contact_submission;
pub mod event;
pub mod event_tag;
pub mod news;
pub mod news_event;
pub mod news_tag;
pub mod newsletter_subscription;
pub mod related_blog;
pub mod related_event;
pub mod related_news;
pub mod stored_file;
pub mod tag;
pub mod user;
