use std::path::Path;

use axum::{
    body::Body,
    extract::{Multipart, Path as UrlPath, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::info;

use crate::archive;
use crate::error::ApiError;
use crate::listing;
use crate::metadata;
use crate::moves;
use crate::protocol::*;
use crate::share::{self, SharePayload};
use crate::trash;
use crate::AppState;

// Stream chunk size, 64KiB.
const STREAM_CAPACITY: usize = 65536;

// ============================================================================
// Listing views
// ============================================================================

pub async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListingResponse>, ApiError> {
    let abs = state.storage.resolve(&query.path)?;
    let contents = listing::list(&state.storage, &query.path).await?;
    Ok(Json(ListingResponse {
        path: state.storage.relative_of(&abs),
        contents,
    }))
}

pub async fn list_recent(
    State(state): State<AppState>,
) -> Result<Json<EntriesResponse>, ApiError> {
    let contents = listing::list_recent(&state.storage).await?;
    Ok(Json(EntriesResponse { contents }))
}

pub async fn list_starred(State(state): State<AppState>) -> Json<EntriesResponse> {
    Json(EntriesResponse {
        contents: listing::list_starred(&state.storage).await,
    })
}

pub async fn list_trash(State(state): State<AppState>) -> Json<TrashListResponse> {
    Json(TrashListResponse {
        items: trash::list_trash(&state.storage).await,
    })
}

// ============================================================================
// Tree mutations
// ============================================================================

pub async fn create_folder(
    State(state): State<AppState>,
    Json(req): Json<CreateFolderRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let name = if req.folder_name.is_empty() {
        "New Folder"
    } else {
        req.folder_name.as_str()
    };
    let target = state.storage.resolve_within(&req.current_path, name)?;
    tokio::fs::create_dir_all(&target).await?;
    Ok(Json(OkResponse { success: true }))
}

pub async fn delete(
    State(state): State<AppState>,
    Json(req): Json<DeleteRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let record = trash::move_to_trash(&state.storage, &req.path).await?;
    info!("Trashed '{}' as {}", record.original_path, record.trash_id);
    Ok(Json(OkResponse { success: true }))
}

pub async fn restore(
    State(state): State<AppState>,
    Json(req): Json<RestoreRequest>,
) -> Result<Json<RestoreResponse>, ApiError> {
    let restored_path = trash::restore(&state.storage, &req.trash_id).await?;
    Ok(Json(RestoreResponse {
        success: true,
        restored_path,
    }))
}

pub async fn empty_trash(
    State(state): State<AppState>,
) -> Result<Json<OkResponse>, ApiError> {
    trash::empty_trash(&state.storage).await?;
    Ok(Json(OkResponse { success: true }))
}

pub async fn move_items(
    State(state): State<AppState>,
    Json(req): Json<MoveRequest>,
) -> Result<Response, ApiError> {
    if req.sources.is_empty() {
        let body = MoveResponse {
            success: false,
            moved: vec![],
            errors: vec!["No items selected".to_string()],
        };
        return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
    }

    let outcome = moves::move_many(&state.storage, &req.sources, &req.destination).await?;
    // All-failed batches answer 400; partial success is still a success.
    let status = if outcome.moved.is_empty() && !outcome.errors.is_empty() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    let body = MoveResponse {
        success: !outcome.moved.is_empty() || outcome.errors.is_empty(),
        moved: outcome.moved,
        errors: outcome.errors,
    };
    Ok((status, Json(body)).into_response())
}

pub async fn star(
    State(state): State<AppState>,
    Json(req): Json<StarRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    // Resolve to validate containment and normalize the stored form.
    let abs = state.storage.resolve(&req.path)?;
    let normalized = state.storage.relative_of(&abs);
    let mut doc = metadata::load(&state.storage).await;
    doc.set_starred(&normalized, req.starred);
    metadata::save(&state.storage, &doc).await?;
    Ok(Json(OkResponse { success: true }))
}

// ============================================================================
// Upload / download / stream
// ============================================================================

pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    // The `path` field is expected before the file parts; parts seen earlier
    // land in the storage root.
    let mut destination = String::new();
    let mut count = 0usize;
    let mut errors = Vec::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Internal(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    {
        if field.file_name().is_none() {
            if field.name() == Some("path") {
                destination = field.text().await.unwrap_or_default();
            }
            continue;
        }

        let filename = field
            .file_name()
            .map(|n| n.to_string())
            .unwrap_or_default();
        let target = match state.storage.resolve_within(&destination, &filename) {
            Ok(t) => t,
            Err(_) => {
                errors.push(format!("Rejected unsafe filename '{filename}'"));
                continue;
            }
        };

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Chunks go straight to disk; whole files are never held in memory.
        let mut out = match tokio::fs::File::create(&target).await {
            Ok(f) => f,
            Err(e) => {
                errors.push(format!("Failed to create '{filename}': {}", e.kind()));
                continue;
            }
        };
        let mut failure = None;
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    if let Err(e) = out.write_all(&chunk).await {
                        failure = Some(format!("Failed to write '{filename}': {}", e.kind()));
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    failure = Some(format!("Failed to read '{filename}': {e}"));
                    break;
                }
            }
        }
        if let Some(message) = failure {
            errors.push(message);
            // Do not leave a truncated file behind.
            let _ = tokio::fs::remove_file(&target).await;
            continue;
        }
        count += 1;
    }

    info!("Uploaded {count} file(s) into '{destination}'");
    Ok(Json(UploadResponse {
        success: errors.is_empty(),
        count,
        errors,
    }))
}

pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let abs = state.storage.resolve(&query.path)?;
    let meta = tokio::fs::metadata(&abs)
        .await
        .map_err(|_| ApiError::NotFound(query.path.clone()))?;
    let name = abs
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "download".to_string());

    if meta.is_dir() {
        // Folders download as a zip, same packaging as folder shares.
        let zipped = archive::zip_directory(abs).await?;
        return zip_response(zipped, &name).await;
    }
    file_response(&abs, &name, false).await
}

pub async fn stream(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let abs = state.storage.resolve(&query.path)?;
    let meta = tokio::fs::metadata(&abs)
        .await
        .map_err(|_| ApiError::NotFound(query.path.clone()))?;
    if meta.is_dir() {
        return Err(ApiError::NotFound(format!("no file at '{}'", query.path)));
    }
    let name = abs
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    file_response(&abs, &name, true).await
}

// ============================================================================
// Shares
// ============================================================================

pub async fn create_share(
    State(state): State<AppState>,
    Json(req): Json<ShareRequest>,
) -> Result<Json<ShareCreatedResponse>, ApiError> {
    let token = share::create_share(&state.storage, &req.path).await?;
    let public_url = format!("{}/api/share/{token}/download", state.public_base_url);
    info!("Created share {token} for '{}'", req.path);
    Ok(Json(ShareCreatedResponse { token, public_url }))
}

pub async fn share_info(
    State(state): State<AppState>,
    UrlPath(token): UrlPath<String>,
) -> Result<Json<ShareInfoResponse>, ApiError> {
    Ok(Json(share::share_info(&state.storage, &token).await?))
}

pub async fn share_list(
    State(state): State<AppState>,
    UrlPath(token): UrlPath<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ShareEntriesResponse>, ApiError> {
    let entries = share::browse(&state.storage, &token, &query.path).await?;
    Ok(Json(ShareEntriesResponse { entries }))
}

pub async fn share_download(
    State(state): State<AppState>,
    UrlPath(token): UrlPath<String>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    match share::download_target(&state.storage, &token, &query.path).await? {
        SharePayload::File { abs, name } => file_response(&abs, &name, false).await,
        SharePayload::Folder { abs, name } => {
            let zipped = archive::zip_directory(abs).await?;
            zip_response(zipped, &name).await
        }
    }
}

// ============================================================================
// Streaming helpers
// ============================================================================

fn disposition(inline: bool, name: &str) -> String {
    if inline {
        "inline".to_string()
    } else {
        // Names are client-visible only; strip quotes rather than escape.
        format!("attachment; filename=\"{}\"", name.replace('"', "'"))
    }
}

async fn file_response(abs: &Path, name: &str, inline: bool) -> Result<Response, ApiError> {
    let file = tokio::fs::File::open(abs)
        .await
        .map_err(|_| ApiError::NotFound(name.to_string()))?;
    let len = file.metadata().await.map(|m| m.len()).ok();
    let mime = mime_guess::from_path(abs).first_or_octet_stream();

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CONTENT_DISPOSITION, disposition(inline, name));
    if let Some(len) = len {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }
    builder
        .body(Body::from_stream(ReaderStream::with_capacity(
            file,
            STREAM_CAPACITY,
        )))
        .map_err(|e| ApiError::Internal(std::io::Error::new(std::io::ErrorKind::Other, e)))
}

async fn zip_response(zipped: std::fs::File, name: &str) -> Result<Response, ApiError> {
    let len = zipped.metadata().map(|m| m.len()).ok();
    let file = tokio::fs::File::from_std(zipped);

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            disposition(false, &format!("{name}.zip")),
        );
    if let Some(len) = len {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }
    builder
        .body(Body::from_stream(ReaderStream::with_capacity(
            file,
            STREAM_CAPACITY,
        )))
        .map_err(|e| ApiError::Internal(std::io::Error::new(std::io::ErrorKind::Other, e)))
}
