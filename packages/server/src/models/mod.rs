pub mod blog;
pub mod comment;
pub mod event;
pub mod news;
pub mod newsletter;
pub mod policy;
pub mod shared;
pub mod storage;
pub mod taxonomy;
pub mod user;
