use std::path::PathBuf;

use chrono::Utc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::listing;
use crate::metadata::{self, ShareRecord};
use crate::protocol::{Entry, ShareInfoResponse};
use crate::storage::Storage;

/// What a share download request resolved to.
pub enum SharePayload {
    File { abs: PathBuf, name: String },
    Folder { abs: PathBuf, name: String },
}

/// Issue a capability token for a path. Possession of the token is the only
/// credential, so it comes from the OS random source (uuid v4, 122 bits).
pub async fn create_share(storage: &Storage, relative: &str) -> Result<String, ApiError> {
    let abs = storage.resolve(relative)?;
    if !tokio::fs::try_exists(&abs).await.unwrap_or(false) {
        return Err(ApiError::NotFound(relative.to_string()));
    }

    let token = Uuid::new_v4().simple().to_string();
    let mut doc = metadata::load(storage).await;
    doc.shared.insert(
        token.clone(),
        ShareRecord {
            path: storage.relative_of(&abs),
            created: Utc::now().timestamp_millis(),
        },
    );
    // Creating a share touches nothing on disk but the document, so a
    // persistence failure is the whole operation failing.
    metadata::save(storage, &doc).await?;
    Ok(token)
}

/// Dereference a token. `LinkInvalid` when the token is unknown,
/// `TargetGone` when the recorded path no longer points at anything; the
/// record itself is kept in both cases.
pub async fn resolve_share(
    storage: &Storage,
    token: &str,
) -> Result<(ShareRecord, PathBuf, std::fs::Metadata), ApiError> {
    let doc = metadata::load(storage).await;
    let record = doc.shared.get(token).cloned().ok_or(ApiError::LinkInvalid)?;
    let abs = storage
        .resolve(&record.path)
        .map_err(|_| ApiError::TargetGone)?;
    let meta = tokio::fs::metadata(&abs)
        .await
        .map_err(|_| ApiError::TargetGone)?;
    Ok((record, abs, meta))
}

pub async fn share_info(storage: &Storage, token: &str) -> Result<ShareInfoResponse, ApiError> {
    let (record, abs, meta) = resolve_share(storage, token).await?;
    let name = abs
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let content_type = if meta.is_dir() {
        "inode/directory".to_string()
    } else {
        mime_guess::from_path(&abs)
            .first_or_octet_stream()
            .to_string()
    };
    Ok(ShareInfoResponse {
        name,
        size: meta.len(),
        content_type,
        created: record.created,
        is_directory: meta.is_dir(),
    })
}

/// Browse inside a shared directory. `sub` resolves against the shared
/// directory, not the storage root, through the same containment rules, so a
/// share cannot be used to reach sibling paths outside its subtree.
pub async fn browse(storage: &Storage, token: &str, sub: &str) -> Result<Vec<Entry>, ApiError> {
    let (_, abs, meta) = resolve_share(storage, token).await?;
    if !meta.is_dir() {
        return Err(ApiError::NotADirectory("shared item".to_string()));
    }
    let scoped = Storage::new(abs);
    listing::list(&scoped, sub).await
}

/// Resolve what a download request for this token/sub-path pair serves:
/// the shared file itself, a file inside a shared folder, or a folder to be
/// packaged as an archive.
pub async fn download_target(
    storage: &Storage,
    token: &str,
    sub: &str,
) -> Result<SharePayload, ApiError> {
    let (_, abs, meta) = resolve_share(storage, token).await?;
    let top_name = abs
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "share".to_string());

    if !meta.is_dir() {
        if !sub.is_empty() {
            return Err(ApiError::NotFound(sub.to_string()));
        }
        return Ok(SharePayload::File { abs, name: top_name });
    }

    if sub.is_empty() {
        return Ok(SharePayload::Folder { abs, name: top_name });
    }

    let scoped = Storage::new(abs);
    let inner = scoped.resolve(sub)?;
    let inner_meta = tokio::fs::metadata(&inner)
        .await
        .map_err(|_| ApiError::NotFound(sub.to_string()))?;
    let name = inner
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or(top_name);
    if inner_meta.is_dir() {
        Ok(SharePayload::Folder { abs: inner, name })
    } else {
        Ok(SharePayload::File { abs: inner, name })
    }
}
