pub mod config;
pub mod file_type;
pub mod image;
pub mod storage;

pub use file_type::FileType;
