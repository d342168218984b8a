use serde::{Deserialize, Serialize};

use crate::metadata::TrashRecord;

// ============================================================================
// Shared data types
// ============================================================================

/// One directory-listing row. Derived from the filesystem on every request,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub name: String,
    /// `/`-separated path relative to the storage root.
    pub path: String,
    pub is_directory: bool,
    pub size: u64,
    /// Modification time, epoch milliseconds.
    pub mtime: i64,
}

// ============================================================================
// Requests (client -> server)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    #[serde(default)]
    pub current_path: String,
    #[serde(default)]
    pub folder_name: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRequest {
    pub trash_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub sources: Vec<String>,
    #[serde(default)]
    pub destination: String,
}

#[derive(Debug, Deserialize)]
pub struct StarRequest {
    pub path: String,
    pub starred: bool,
}

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub path: String,
}

// ============================================================================
// Responses (server -> client)
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub path: String,
    pub contents: Vec<Entry>,
}

#[derive(Debug, Serialize)]
pub struct EntriesResponse {
    pub contents: Vec<Entry>,
}

#[derive(Debug, Serialize)]
pub struct TrashListResponse {
    pub items: Vec<TrashRecord>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    pub success: bool,
    pub moved: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResponse {
    pub success: bool,
    pub restored_path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareCreatedResponse {
    pub token: String,
    pub public_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareInfoResponse {
    pub name: String,
    pub size: u64,
    pub content_type: String,
    /// Share creation time, epoch milliseconds.
    pub created: i64,
    pub is_directory: bool,
}

#[derive(Debug, Serialize)]
pub struct ShareEntriesResponse {
    pub entries: Vec<Entry>,
}
