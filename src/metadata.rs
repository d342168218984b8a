use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ApiError;
use crate::storage::Storage;

// ============================================================================
// Persisted records
// ============================================================================

/// One trashed item. The record and the physical entry under the trash area
/// (named by `trash_id`) exist or not-exist together.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashRecord {
    pub trash_id: String,
    pub original_path: String,
    pub original_name: String,
    pub is_directory: bool,
    pub size: u64,
    /// Deletion time, epoch milliseconds.
    pub deleted_at: i64,
}

/// One share token's target. Never expires; never auto-removed when the
/// target disappears — dereferencing in that state fails gracefully instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareRecord {
    pub path: String,
    /// Creation time, epoch milliseconds.
    pub created: i64,
}

/// The whole metadata side-channel, persisted as one JSON document under the
/// storage root. Always loaded, mutated and saved as a unit so the durable
/// copy stays self-consistent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataDocument {
    #[serde(default)]
    pub starred: Vec<String>,
    #[serde(default)]
    pub trash: Vec<TrashRecord>,
    #[serde(default)]
    pub shared: HashMap<String, ShareRecord>,
}

impl MetadataDocument {
    /// Add or remove a starred path. Idempotent in both directions.
    pub fn set_starred(&mut self, path: &str, starred: bool) {
        if starred {
            if !self.starred.iter().any(|p| p == path) {
                self.starred.push(path.to_string());
            }
        } else {
            self.starred.retain(|p| p != path);
        }
    }

    /// Rewrite star and share records whose path exactly equals `old`.
    /// Records pointing *inside* a moved directory are left alone; the
    /// self-healing reads skip them once stale.
    pub fn rewrite_path(&mut self, old: &str, new: &str) {
        for star in self.starred.iter_mut() {
            if star == old {
                *star = new.to_string();
            }
        }
        for share in self.shared.values_mut() {
            if share.path == old {
                share.path = new.to_string();
            }
        }
    }
}

// ============================================================================
// Load / save
// ============================================================================

/// Load the metadata document. Best-effort: a missing file or a parse error
/// yields an empty document, never an error — metadata must not be able to
/// break core file operations.
pub async fn load(storage: &Storage) -> MetadataDocument {
    let path = storage.metadata_path();
    match tokio::fs::read(&path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Metadata document unreadable, starting fresh: {e}");
                MetadataDocument::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => MetadataDocument::default(),
        Err(e) => {
            warn!("Failed to read metadata document: {e}");
            MetadataDocument::default()
        }
    }
}

/// Persist the whole document.
pub async fn save(storage: &Storage, doc: &MetadataDocument) -> Result<(), ApiError> {
    let bytes = serde_json::to_vec_pretty(doc)
        .map_err(|e| ApiError::Persistence(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
    tokio::fs::write(storage.metadata_path(), bytes)
        .await
        .map_err(ApiError::Persistence)
}

/// Persist, logging and swallowing any failure. Used after a filesystem
/// action that already succeeded: the client sees success and the metadata
/// catches up on the next write.
pub async fn save_quiet(storage: &Storage, doc: &MetadataDocument) {
    if let Err(e) = save(storage, doc).await {
        warn!("Metadata write failed (operation already applied): {e}");
    }
}
