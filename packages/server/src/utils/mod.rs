pub mod filename;
pub mod password;
pub mod slug;
