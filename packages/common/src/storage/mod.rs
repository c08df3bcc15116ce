mod adapter;
mod error;
mod key;
mod traits;

pub mod filesystem;
pub mod remote;

pub use adapter::{Backend, StorageAdapter, UploadedObject};
pub use error::StorageError;
pub use key::{generate_object_name, validate_folder, validate_key};
pub use traits::{ObjectStore, ObjectSummary};
