use std::fmt;
use std::time::Duration;

/// Errors that can occur during object storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// The requested object was not found.
    NotFound(String),
    /// An I/O error occurred on the local backend.
    Io(std::io::Error),
    /// The upload contained no bytes.
    EmptyPayload,
    /// The object exceeds the configured size limit.
    PayloadTooLarge { actual: u64, limit: u64 },
    /// The key or folder would escape the storage root or is malformed.
    InvalidKey(String),
    /// No usable backend owns the object, or the remote service refused the call.
    BackendUnavailable(String),
    /// A backend call did not finish within the configured timeout.
    Timeout(Duration),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "object not found: {key}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::EmptyPayload => write!(f, "uploaded file is empty"),
            Self::PayloadTooLarge { actual, limit } => {
                write!(f, "file exceeds size limit ({actual} > {limit} bytes)")
            }
            Self::InvalidKey(msg) => write!(f, "invalid storage key: {msg}"),
            Self::BackendUnavailable(msg) => write!(f, "storage backend unavailable: {msg}"),
            Self::Timeout(after) => {
                write!(f, "storage backend timed out after {}s", after.as_secs())
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<s3::error::S3Error> for StorageError {
    fn from(err: s3::error::S3Error) -> Self {
        Self::BackendUnavailable(err.to_string())
    }
}
