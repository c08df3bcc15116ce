use std::path::Path;

use uuid::Uuid;

use super::error::StorageError;

const MAX_EXTENSION_LEN: usize = 10;

/// Validate an upload folder such as `blog_image` or `archive/2024`.
pub fn validate_folder(folder: &str) -> Result<&str, StorageError> {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        return Err(StorageError::InvalidKey("folder must not be empty".into()));
    }
    for segment in folder.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(StorageError::InvalidKey(format!(
                "folder '{folder}' contains an empty or relative segment"
            )));
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(StorageError::InvalidKey(format!(
                "folder '{folder}' contains unsupported characters"
            )));
        }
    }
    Ok(folder)
}

/// Validate an object key before it is mapped onto a backend.
///
/// Keys are relative, `/`-separated and never contain `.`/`..` segments,
/// backslashes or control characters.
pub fn validate_key(key: &str) -> Result<&str, StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key must not be empty".into()));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(format!("key '{key}' is not relative")));
    }
    if key.chars().any(|c| c.is_control()) {
        return Err(StorageError::InvalidKey(
            "key contains control characters".into(),
        ));
    }
    if key
        .split('/')
        .any(|s| s.is_empty() || s == "." || s == "..")
    {
        return Err(StorageError::InvalidKey(format!(
            "key '{key}' contains an empty or relative segment"
        )));
    }
    Ok(key)
}

/// Lowercased extension of the declared name, including the dot.
fn extension_of(declared_name: &str) -> String {
    Path::new(declared_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| {
            !e.is_empty()
                && e.len() <= MAX_EXTENSION_LEN
                && e.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Generate a collision-resistant object name and its key under `folder`.
///
/// Returns `(filename, key)`, e.g. `("3f2a...9c.jpg", "blog_image/3f2a...9c.jpg")`.
pub fn generate_object_name(
    folder: &str,
    declared_name: &str,
) -> Result<(String, String), StorageError> {
    let folder = validate_folder(folder)?;
    let filename = format!("{}{}", Uuid::new_v4().simple(), extension_of(declared_name));
    let key = format!("{folder}/{filename}");
    Ok((filename, key))
}
