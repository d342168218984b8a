use std::fs::Metadata;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::ApiError;
use crate::metadata;
use crate::protocol::Entry;
use crate::storage::Storage;

/// Cap on the "recent files" view.
pub const RECENT_LIMIT: usize = 50;

fn mtime_millis(meta: &Metadata) -> i64 {
    meta.modified()
        .map(|t| {
            t.duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as i64)
                .unwrap_or(0)
        })
        .unwrap_or(0)
}

fn entry_for(storage: &Storage, abs: &Path, name: String, meta: &Metadata) -> Entry {
    Entry {
        name,
        path: storage.relative_of(abs),
        is_directory: meta.is_dir(),
        size: meta.len(),
        mtime: mtime_millis(meta),
    }
}

/// List one directory. Dot-prefixed names are never reported; whether the
/// client wants hidden files shown is a presentation concern, not ours.
pub async fn list(storage: &Storage, relative: &str) -> Result<Vec<Entry>, ApiError> {
    let abs = storage.resolve(relative)?;
    let meta = tokio::fs::metadata(&abs)
        .await
        .map_err(|_| ApiError::NotFound(relative.to_string()))?;
    if !meta.is_dir() {
        return Err(ApiError::NotADirectory(relative.to_string()));
    }

    let mut entries = Vec::new();
    let mut dir = tokio::fs::read_dir(&abs).await?;
    while let Some(entry) = dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let meta = match entry.metadata().await {
            Ok(m) => m,
            Err(_) => continue,
        };
        entries.push(entry_for(storage, &entry.path(), name, &meta));
    }

    // Directories first, then case-insensitive name; the trailing exact name
    // keeps the order total.
    entries.sort_by_key(|e| (!e.is_directory, e.name.to_lowercase(), e.name.clone()));
    Ok(entries)
}

/// Flat scan of every non-hidden file under the root, newest first, capped at
/// `RECENT_LIMIT`. The walk is synchronous so it runs on the blocking pool.
pub async fn list_recent(storage: &Storage) -> Result<Vec<Entry>, ApiError> {
    let storage = storage.clone();
    tokio::task::spawn_blocking(move || {
        let mut entries: Vec<Entry> = WalkDir::new(storage.root())
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.')
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let meta = e.metadata().ok()?;
                let name = e.file_name().to_string_lossy().to_string();
                Some(entry_for(&storage, e.path(), name, &meta))
            })
            .collect();

        entries.sort_by(|a, b| b.mtime.cmp(&a.mtime).then_with(|| a.path.cmp(&b.path)));
        entries.truncate(RECENT_LIMIT);
        entries
    })
    .await
    .map_err(|e| ApiError::Internal(std::io::Error::new(std::io::ErrorKind::Other, e)))
}

/// Resolve every starred path and report the ones that still exist. Stale
/// records are skipped, not errors, and are not pruned here.
pub async fn list_starred(storage: &Storage) -> Vec<Entry> {
    let doc = metadata::load(storage).await;
    let mut entries = Vec::new();
    for path in &doc.starred {
        let abs = match storage.resolve(path) {
            Ok(a) => a,
            Err(_) => continue,
        };
        let meta = match tokio::fs::metadata(&abs).await {
            Ok(m) => m,
            Err(_) => continue,
        };
        let name = abs
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        entries.push(entry_for(storage, &abs, name, &meta));
    }
    entries
}
