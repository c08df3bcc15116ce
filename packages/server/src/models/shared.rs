use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

/// Paginated list envelope.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Minimal view of a linked content item (related posts, cross-links).
#[derive(Serialize, Clone, utoipa::ToSchema)]
pub struct ContentSummary {
    pub id: i32,
    pub title: String,
    pub slug: String,
}

/// Offset window resolved from `page`/`limit` or `skip`/`limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u64,
}

pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;
/// Largest offset PostgreSQL accepts (`OFFSET` is a bigint).
const MAX_OFFSET: u64 = i64::MAX as u64;

impl PageWindow {
    /// `page` wins over `skip` when both are given. `limit` is clamped to 1-100.
    pub fn resolve(page: Option<u64>, skip: Option<u64>, limit: Option<u64>) -> Self {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = match page {
            Some(page) => (page.max(1) - 1).saturating_mul(limit),
            None => skip.unwrap_or(0),
        }
        .min(MAX_OFFSET);
        Self { offset, limit }
    }

    pub fn pagination(&self, total: u64) -> Pagination {
        Pagination {
            page: self.offset / self.limit + 1,
            per_page: self.limit,
            total,
            total_pages: total.div_ceil(self.limit),
        }
    }
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Lowercased `%term%` pattern, or `None` for a blank search.
pub fn search_pattern(search: Option<&str>) -> Option<String> {
    let term = search?.trim();
    if term.is_empty() {
        return None;
    }
    Some(format!("%{}%", escape_like(&term.to_lowercase())))
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Parse `"1, 2,3"` into ids. Blank input yields an empty list.
pub fn parse_id_list(raw: Option<&str>, field: &str) -> Result<Vec<i32>, AppError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i32>().map_err(|_| {
                AppError::Validation(format!("{field} must be a comma separated list of integers"))
            })
        })
        .collect()
}

/// Inclusive calendar-day range converted to `[from, to)` instants.
pub fn day_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), AppError> {
    if let (Some(s), Some(e)) = (start, end)
        && s > e
    {
        return Err(AppError::Validation(
            "start_date must not be after end_date".into(),
        ));
    }
    let from = start.map(|d| d.and_time(NaiveTime::MIN).and_utc());
    let to = end
        .and_then(|d| d.checked_add_days(Days::new(1)))
        .map(|d| d.and_time(NaiveTime::MIN).and_utc());
    Ok((from, to))
}

/// Validate the trimmed length of a required string field.
pub fn validate_len(value: &str, field: &str, min: usize, max: usize) -> Result<(), AppError> {
    let n = value.trim().chars().count();
    if n < min || n > max {
        return Err(AppError::Validation(format!(
            "{field} must be {min}-{max} characters"
        )));
    }
    Ok(())
}

/// Validate an optional string field against a maximum length.
pub fn validate_max_len(value: Option<&str>, field: &str, max: usize) -> Result<(), AppError> {
    if let Some(v) = value
        && v.chars().count() > max
    {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Validate a title (5-255 characters after trimming).
pub fn validate_title(title: &str) -> Result<(), AppError> {
    validate_len(title, "Title", 5, 255)
}

/// Minimal structural e-mail check: one `@`, non-empty local part, dotted domain.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let valid = email.len() <= 254
        && !email.chars().any(char::is_whitespace)
        && match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            }
            None => false,
        };
    if !valid {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    Ok(())
}

/// Trim and lowercase an e-mail for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trim an optional string, mapping blank to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
