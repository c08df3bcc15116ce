mod common;

mod blog;
mod comment;
mod event;
mod news;
mod newsletter;
mod storage;
mod taxonomy;
mod user;
