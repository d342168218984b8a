use chrono::Utc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::metadata::{self, TrashRecord};
use crate::storage::Storage;

/// Generate a trash id: wall-clock millis plus a v4 uuid, wide enough that a
/// collision with an existing entry is not a practical concern.
fn fresh_trash_id() -> String {
    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

/// `name.ext` -> `name-restored-<millis>.ext`; no extension, no split.
fn restored_name(original: &str, millis: i64) -> String {
    match original.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            format!("{stem}-restored-{millis}.{ext}")
        }
        _ => format!("{original}-restored-{millis}"),
    }
}

/// Move a live item into the hidden trash area and record it. The physical
/// move happens first; the metadata append is persisted best-effort.
pub async fn move_to_trash(storage: &Storage, relative: &str) -> Result<TrashRecord, ApiError> {
    let abs = storage.resolve(relative)?;
    let original_name = match abs.file_name() {
        Some(n) => n.to_string_lossy().to_string(),
        // The storage root itself is not a deletable item.
        None => return Err(ApiError::AccessDenied),
    };
    let meta = tokio::fs::metadata(&abs)
        .await
        .map_err(|_| ApiError::NotFound(relative.to_string()))?;

    let trash_id = fresh_trash_id();
    let trash_dir = storage.trash_dir();
    tokio::fs::create_dir_all(&trash_dir).await?;
    tokio::fs::rename(&abs, trash_dir.join(&trash_id)).await?;

    let record = TrashRecord {
        trash_id,
        original_path: storage.relative_of(&abs),
        original_name,
        is_directory: meta.is_dir(),
        size: meta.len(),
        deleted_at: Utc::now().timestamp_millis(),
    };

    let mut doc = metadata::load(storage).await;
    doc.trash.push(record.clone());
    metadata::save_quiet(storage, &doc).await;
    Ok(record)
}

/// Records whose physical trash entry still exists. Orphaned records are
/// filtered from the view but left in the document.
pub async fn list_trash(storage: &Storage) -> Vec<TrashRecord> {
    let doc = metadata::load(storage).await;
    let trash_dir = storage.trash_dir();
    let mut items = Vec::new();
    for record in doc.trash {
        if tokio::fs::try_exists(trash_dir.join(&record.trash_id))
            .await
            .unwrap_or(false)
        {
            items.push(record);
        }
    }
    items
}

/// Put a trashed item back. Restores to the exact original path when vacant,
/// otherwise under a `-restored-<millis>` name so nothing is overwritten.
/// Returns the relative path the item ended up at.
pub async fn restore(storage: &Storage, trash_id: &str) -> Result<String, ApiError> {
    let mut doc = metadata::load(storage).await;
    let idx = doc
        .trash
        .iter()
        .position(|r| r.trash_id == trash_id)
        .ok_or_else(|| ApiError::NotFound(format!("trash entry {trash_id}")))?;
    let record = doc.trash[idx].clone();

    let trashed = storage.trash_dir().join(&record.trash_id);
    if !tokio::fs::try_exists(&trashed).await.unwrap_or(false) {
        return Err(ApiError::NotFound(format!("trash entry {trash_id}")));
    }

    let mut target = storage.resolve(&record.original_path)?;
    if tokio::fs::try_exists(&target).await.unwrap_or(false) {
        let renamed = restored_name(&record.original_name, Utc::now().timestamp_millis());
        target = match target.parent() {
            Some(parent) => parent.join(renamed),
            None => return Err(ApiError::AccessDenied),
        };
    }
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::rename(&trashed, &target).await?;

    doc.trash.remove(idx);
    metadata::save_quiet(storage, &doc).await;
    Ok(storage.relative_of(&target))
}

/// Remove every physical trash entry and clear the trash collection.
/// A no-op on an already-empty trash.
pub async fn empty_trash(storage: &Storage) -> Result<(), ApiError> {
    let trash_dir = storage.trash_dir();
    match tokio::fs::read_dir(&trash_dir).await {
        Ok(mut dir) => {
            while let Some(entry) = dir.next_entry().await? {
                let path = entry.path();
                let is_dir = entry
                    .file_type()
                    .await
                    .map(|t| t.is_dir())
                    .unwrap_or(false);
                if is_dir {
                    tokio::fs::remove_dir_all(&path).await?;
                } else {
                    tokio::fs::remove_file(&path).await?;
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let mut doc = metadata::load(storage).await;
    doc.trash.clear();
    metadata::save_quiet(storage, &doc).await;
    Ok(())
}
