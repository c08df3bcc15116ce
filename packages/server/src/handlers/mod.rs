pub mod blog;
pub mod comment;
pub mod content;
pub mod event;
pub mod news;
pub mod newsletter;
pub mod storage;
pub mod taxonomy;
pub mod user;
