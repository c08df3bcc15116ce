use std::str::FromStr;

use axum::Json;
use axum::body::Body;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::FileType;
use common::storage::filesystem::LOCAL_BACKEND_ID;
use sea_orm::prelude::Expr;
use sea_orm::*;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::entity::{blog, event, news, stored_file};
use crate::error::{AppError, ErrorBody};
use crate::extractors::query::AppQuery;
use crate::models::shared::PageWindow;
use crate::models::storage::*;
use crate::state::AppState;
use crate::utils::filename::sanitize_original_filename;

/// Room for multipart boundaries and the small text fields.
const MULTIPART_OVERHEAD: usize = 64 * 1024;
const DEFAULT_OBJECT_LIST: usize = 100;
const MAX_OBJECT_LIST: usize = 1000;

/// Body limit layer for the upload route.
pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let max = usize::try_from(max_upload_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(max.saturating_add(MULTIPART_OVERHEAD))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Multipart error: {}", e.body_text()))
    }
}

/// Buffer a multipart field, failing as soon as it exceeds `max_size`.
async fn read_bounded(mut field: Field<'_>, max_size: u64) -> Result<Vec<u8>, AppError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if (buf.len() + chunk.len()) as u64 > max_size {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds maximum size of {max_size} bytes"
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

async fn read_text(field: Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map(|t| t.trim().to_string())
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {}", e.body_text())))
}

fn parse_flag(raw: &str) -> Result<bool, AppError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::Validation("compress must be true or false".into())),
    }
}

/// Declared content type, or a guess from the filename when the client sent none.
fn effective_content_type(declared: Option<&str>, filename: &str) -> String {
    match declared.map(str::trim) {
        Some(ct) if !ct.is_empty() && ct != "application/octet-stream" => ct.to_string(),
        _ => mime_guess::from_path(filename)
            .first_or_octet_stream()
            .to_string(),
    }
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Storage",
    operation_id = "uploadFile",
    summary = "Upload a file",
    description = "Stores a file on the active backend and records it. The `file` field is required. `file_type` (default `other`) also selects the storage folder. JPEG, PNG and WebP images are resized and recompressed unless `compress=false`; other files are stored as sent.",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = StoredFileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 503, description = "Storage backend unavailable (BACKEND_UNAVAILABLE, BACKEND_TIMEOUT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let max_size = state.storage.max_upload_size();

    let mut content: Option<Vec<u8>> = None;
    let mut declared_name: Option<String> = None;
    let mut declared_type: Option<String> = None;
    let mut file_type = FileType::default();
    let mut related_entity_id: Option<i32> = None;
    let mut compress: Option<bool> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                declared_name = field.file_name().map(str::to_string);
                declared_type = field.content_type().map(str::to_string);
                content = Some(read_bounded(field, max_size).await?);
            }
            Some("file_type") => {
                let raw = read_text(field, "file_type").await?;
                if !raw.is_empty() {
                    file_type = FileType::from_str(&raw).map_err(AppError::Validation)?;
                }
            }
            Some("related_entity_id") => {
                let raw = read_text(field, "related_entity_id").await?;
                if !raw.is_empty() {
                    related_entity_id = Some(raw.parse().map_err(|_| {
                        AppError::Validation("related_entity_id must be an integer".into())
                    })?);
                }
            }
            Some("compress") => {
                let raw = read_text(field, "compress").await?;
                if !raw.is_empty() {
                    compress = Some(parse_flag(&raw)?);
                }
            }
            _ => {}
        }
    }

    let content = content.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let original_filename = sanitize_original_filename(declared_name.as_deref().unwrap_or(""))
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let content_type = effective_content_type(declared_type.as_deref(), &original_filename);
    let original_size = content.len() as u64;

    let (bytes, content_type) = if compress.unwrap_or(state.images.compress_by_default()) {
        let images = state.images.clone();
        let normalized = tokio::task::spawn_blocking(move || images.normalize(content, &content_type))
            .await
            .map_err(|e| AppError::Internal(format!("Image task failed: {e}")))?;
        if normalized.compressed_size != normalized.original_size || normalized.resized {
            tracing::debug!(
                original = normalized.original_size,
                compressed = normalized.compressed_size,
                resized = normalized.resized,
                "Image normalized"
            );
        }
        (normalized.bytes, normalized.content_type)
    } else {
        (content, content_type)
    };

    let object = state
        .storage
        .upload(&bytes, &original_filename, file_type.folder(), &content_type)
        .await?;

    let now = chrono::Utc::now();
    let row = stored_file::ActiveModel {
        filename: Set(object.filename.clone()),
        original_filename: Set(original_filename),
        file_path: Set(object.key.clone()),
        file_type: Set(file_type),
        content_type: Set(content_type),
        size_bytes: Set(i64::try_from(object.size_bytes).unwrap_or(i64::MAX)),
        original_size_bytes: Set(i64::try_from(original_size).unwrap_or(i64::MAX)),
        content_hash: Set(object.content_hash.clone()),
        bucket_name: Set(object.backend.clone()),
        public_url: Set(Some(object.public_url.clone())),
        related_entity_id: Set(related_entity_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = match row.insert(&state.db).await {
        Ok(model) => model,
        Err(e) => {
            // Best effort; the row is what makes the object reachable.
            if let Err(cleanup) = state.storage.delete(&object.key, &object.backend).await {
                tracing::warn!(key = %object.key, error = %cleanup, "Failed to remove orphaned object");
            }
            return Err(e.into());
        }
    };

    Ok((StatusCode::CREATED, Json(StoredFileResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/files",
    tag = "Storage",
    operation_id = "listFiles",
    summary = "List stored files",
    description = "Returns stored files, newest first, optionally filtered by type or related entity.",
    params(FileListQuery),
    responses(
        (status = 200, description = "Stored files", body = FileListResponse),
        (status = 400, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_files(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<FileListQuery>,
) -> Result<Json<FileListResponse>, AppError> {
    let window = PageWindow::resolve(None, query.skip, query.limit);

    let mut select = stored_file::Entity::find();
    if let Some(file_type) = query.file_type {
        select = select.filter(stored_file::Column::FileType.eq(file_type));
    }
    if let Some(related) = query.related_entity_id {
        select = select.filter(stored_file::Column::RelatedEntityId.eq(related));
    }

    let count = select
        .clone()
        .paginate(&state.db, window.limit)
        .num_items()
        .await?;
    let rows = select
        .order_by_desc(stored_file::Column::CreatedAt)
        .order_by_desc(stored_file::Column::Id)
        .offset(Some(window.offset))
        .limit(Some(window.limit))
        .all(&state.db)
        .await?;

    Ok(Json(FileListResponse {
        files: rows.into_iter().map(StoredFileResponse::from).collect(),
        count,
    }))
}

#[utoipa::path(
    get,
    path = "/files/{id}",
    tag = "Storage",
    operation_id = "getFile",
    summary = "Get a stored file by ID",
    params(("id" = i32, Path, description = "Stored file ID")),
    responses(
        (status = 200, description = "Stored file", body = StoredFileResponse),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<StoredFileResponse>, AppError> {
    Ok(Json(find_file(&state.db, id).await?.into()))
}

#[utoipa::path(
    delete,
    path = "/files/{id}",
    tag = "Storage",
    operation_id = "deleteFile",
    summary = "Delete a stored file",
    description = "Removes the object from its backend, clears any featured or Open Graph image references to it, then deletes the record. A missing backend object is not an error.",
    params(("id" = i32, Path, description = "Stored file ID")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Storage backend unavailable (BACKEND_UNAVAILABLE, BACKEND_TIMEOUT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let file = find_file(&state.db, id).await?;

    let removed = state
        .storage
        .delete(&file.file_path, &file.bucket_name)
        .await?;
    if !removed {
        tracing::warn!(key = %file.file_path, backend = %file.bucket_name, "Backend object already gone");
    }

    let txn = state.db.begin().await?;
    blog::Entity::update_many()
        .col_expr(blog::Column::FeaturedImageId, Expr::value(Option::<i32>::None))
        .filter(blog::Column::FeaturedImageId.eq(id))
        .exec(&txn)
        .await?;
    blog::Entity::update_many()
        .col_expr(blog::Column::OgImageId, Expr::value(Option::<i32>::None))
        .filter(blog::Column::OgImageId.eq(id))
        .exec(&txn)
        .await?;
    news::Entity::update_many()
        .col_expr(news::Column::FeaturedImageId, Expr::value(Option::<i32>::None))
        .filter(news::Column::FeaturedImageId.eq(id))
        .exec(&txn)
        .await?;
    event::Entity::update_many()
        .col_expr(event::Column::FeaturedImageId, Expr::value(Option::<i32>::None))
        .filter(event::Column::FeaturedImageId.eq(id))
        .exec(&txn)
        .await?;
    stored_file::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/files/{id}/url",
    tag = "Storage",
    operation_id = "getFileUrl",
    summary = "Get a download URL for a stored file",
    description = "Returns a presigned URL for remote storage, or the static URL for local storage (which does not expire).",
    params(("id" = i32, Path, description = "Stored file ID"), FileUrlQuery),
    responses(
        (status = 200, description = "Download URL", body = FileUrlResponse),
        (status = 400, description = "Invalid expiry (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Storage backend unavailable (BACKEND_UNAVAILABLE, BACKEND_TIMEOUT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(id))]
pub async fn file_url(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppQuery(query): AppQuery<FileUrlQuery>,
) -> Result<Json<FileUrlResponse>, AppError> {
    let expires_in = query.expires_in.unwrap_or(DEFAULT_URL_TTL);
    if expires_in == 0 || expires_in > MAX_URL_TTL {
        return Err(AppError::Validation(format!(
            "expires_in must be between 1 and {MAX_URL_TTL} seconds"
        )));
    }

    let file = find_file(&state.db, id).await?;
    let url = state
        .storage
        .url_for(&file.file_path, &file.bucket_name, expires_in)
        .await?;

    Ok(Json(FileUrlResponse { url, expires_in }))
}

#[utoipa::path(
    get,
    path = "/objects",
    tag = "Storage",
    operation_id = "listObjects",
    summary = "List objects on the active backend",
    description = "Lists raw backend objects under `prefix`, whether or not they have a stored file record.",
    params(ObjectListQuery),
    responses(
        (status = 200, description = "Backend objects", body = ObjectListResponse),
        (status = 400, description = "Invalid prefix (VALIDATION_ERROR)", body = ErrorBody),
        (status = 503, description = "Storage backend unavailable (BACKEND_UNAVAILABLE, BACKEND_TIMEOUT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(prefix = %query.prefix))]
pub async fn list_objects(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ObjectListQuery>,
) -> Result<Json<ObjectListResponse>, AppError> {
    let max = query
        .max
        .unwrap_or(DEFAULT_OBJECT_LIST)
        .clamp(1, MAX_OBJECT_LIST);
    let objects = state.storage.list(&query.prefix, max).await?;

    Ok(Json(ObjectListResponse {
        backend: state.storage.backend_id().to_string(),
        count: objects.len(),
        objects: objects.into_iter().map(ObjectSummaryResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/local/{*key}",
    tag = "Storage",
    operation_id = "serveLocalFile",
    summary = "Download a locally stored object",
    params(("key" = String, Path, description = "Storage key, e.g. `blog_image/<name>.jpg`")),
    responses(
        (status = 200, description = "Object content"),
        (status = 304, description = "Not modified (ETag matched)"),
        (status = 400, description = "Invalid key (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Object not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers), fields(key = %key))]
pub async fn serve_local(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let (file, size) = state.storage.open_local(&key).await?;
    let record = stored_file::Entity::find()
        .filter(stored_file::Column::FilePath.eq(key.as_str()))
        .filter(stored_file::Column::BucketName.eq(LOCAL_BACKEND_ID))
        .one(&state.db)
        .await?;

    let etag = record.as_ref().map(|r| format!("\"{}\"", r.content_hash));
    if let Some(etag) = &etag
        && let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag.as_str() || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let content_type = mime_guess::from_path(&key).first_or_octet_stream();
    let filename = record
        .as_ref()
        .map(|r| r.original_filename.as_str())
        .or_else(|| key.rsplit('/').next())
        .unwrap_or("download");
    let disposition = if renders_inline(content_type.essence_str()) {
        "inline"
    } else {
        "attachment"
    };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(disposition, filename),
        )
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .header(header::CACHE_CONTROL, "public, max-age=86400");
    if let Some(etag) = &etag {
        builder = builder.header(header::ETAG, etag);
    }

    builder
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// Raster images are displayed in place; everything else, SVG included, is downloaded.
fn renders_inline(content_type: &str) -> bool {
    content_type.starts_with("image/") && content_type != "image/svg+xml"
}

/// Build a safe `Content-Disposition` header value.
fn content_disposition_value(disposition: &str, filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    let encoded: String = filename
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
                String::from(b as char)
            } else {
                format!("%{b:02X}")
            }
        })
        .collect();

    format!("{disposition}; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}

async fn find_file<C: ConnectionTrait>(db: &C, id: i32) -> Result<stored_file::Model, AppError> {
    stored_file::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))
}
