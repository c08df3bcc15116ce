/// Why a client-supplied filename was refused.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FilenameError {
    /// Nothing left after stripping directories and whitespace.
    #[error("Filename cannot be empty")]
    Empty,
    #[error("Invalid filename: null bytes are not allowed")]
    NullByte,
    /// CR, LF and friends; would leak into headers.
    #[error("Invalid filename: control characters are not allowed")]
    ControlCharacter,
    #[error("Invalid filename: must be at most 255 characters")]
    TooLong,
}

const MAX_FILENAME_CHARS: usize = 255;

/// Reduce an uploaded file's declared name to its last path component.
///
/// Browsers and HTTP clients sometimes send full paths (`C:\fakepath\a.png`,
/// `../../a.png`). Only the final component is kept; it is stored for display
/// and never used to address the object.
pub fn sanitize_original_filename(raw: &str) -> Result<String, FilenameError> {
    if raw.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    let last = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();

    if last.is_empty() || last == "." || last == ".." {
        return Err(FilenameError::Empty);
    }
    if last.chars().any(|c| c.is_control()) {
        return Err(FilenameError::ControlCharacter);
    }
    if last.chars().count() > MAX_FILENAME_CHARS {
        return Err(FilenameError::TooLong);
    }

    Ok(last.to_string())
}
