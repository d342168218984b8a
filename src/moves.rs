use std::path::{Path, PathBuf};

use futures_util::future::join_all;
use tracing::info;

use crate::error::ApiError;
use crate::metadata;
use crate::storage::Storage;

#[derive(Debug)]
pub struct MoveOutcome {
    pub moved: Vec<String>,
    pub errors: Vec<String>,
}

/// Relocate a batch of live items into `destination`. The destination is
/// validated once up front; each source is then processed concurrently and
/// independently, so one bad item never blocks its siblings. Star and share
/// records pointing at a moved path are rewritten in a single metadata pass
/// after the physical moves.
pub async fn move_many(
    storage: &Storage,
    sources: &[String],
    destination: &str,
) -> Result<MoveOutcome, ApiError> {
    let dest_abs = storage
        .resolve(destination)
        .map_err(|_| ApiError::InvalidDestination)?;
    let dest_meta = tokio::fs::metadata(&dest_abs)
        .await
        .map_err(|_| ApiError::InvalidDestination)?;
    if !dest_meta.is_dir() {
        return Err(ApiError::InvalidDestination);
    }

    let results = join_all(
        sources
            .iter()
            .map(|src| move_one(storage, src, &dest_abs)),
    )
    .await;

    let mut moved = Vec::new();
    let mut renames: Vec<(String, String)> = Vec::new();
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok((old_rel, new_rel, name)) => {
                moved.push(name);
                renames.push((old_rel, new_rel));
            }
            Err(message) => errors.push(message),
        }
    }

    // One document write for the whole batch; nothing to do when every
    // source failed.
    if !renames.is_empty() {
        let mut doc = metadata::load(storage).await;
        for (old, new) in &renames {
            doc.rewrite_path(old, new);
        }
        metadata::save_quiet(storage, &doc).await;
        info!("Moved {} item(s) into '{destination}'", renames.len());
    }

    Ok(MoveOutcome { moved, errors })
}

/// Move a single source, reporting failures as readable messages so the
/// batch can carry on.
async fn move_one(
    storage: &Storage,
    source: &str,
    dest_abs: &Path,
) -> Result<(String, String, String), String> {
    let src_abs: PathBuf = storage
        .resolve(source)
        .map_err(|_| format!("Access denied for '{source}'"))?;
    let name = src_abs
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| "Cannot move the storage root".to_string())?;

    if tokio::fs::metadata(&src_abs).await.is_err() {
        return Err(format!("Item '{name}' not found"));
    }

    // Component-wise prefix check: `foo` is not an ancestor of `foobar`,
    // but it is of `foo/sub`. Covers destination == source as well.
    if dest_abs.starts_with(&src_abs) {
        return Err(ApiError::SelfContainment(name).to_string());
    }

    let target = dest_abs.join(&name);
    if tokio::fs::try_exists(&target).await.unwrap_or(false) {
        return Err(ApiError::AlreadyExists(name).to_string());
    }

    tokio::fs::rename(&src_abs, &target)
        .await
        .map_err(|e| format!("Failed to move '{name}': {}", e.kind()))?;

    Ok((
        storage.relative_of(&src_abs),
        storage.relative_of(&target),
        name,
    ))
}
