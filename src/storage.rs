use std::path::{Path, PathBuf};

use crate::error::ApiError;

/// Name of the hidden trash area directly under the storage root.
pub const TRASH_DIR: &str = ".trash";
/// Metadata document filename, also directly under the storage root.
pub const METADATA_FILE: &str = ".metadata.json";

/// Handle to the storage root. All client paths are `/`-separated strings
/// relative to this directory; resolution is purely lexical so paths of
/// items that do not exist yet (uploads, trashed originals) still resolve.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn trash_dir(&self) -> PathBuf {
        self.root.join(TRASH_DIR)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    /// Resolve a client-supplied relative path to an absolute path inside the
    /// storage root. `.` and `..` segments are collapsed before any
    /// containment decision; a `..` that would climb above the root fails
    /// with `AccessDenied`. An empty path denotes the root itself.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, ApiError> {
        let mut parts: Vec<&str> = Vec::new();
        // Backslashes are treated as separators too so a crafted
        // `..\..\name` cannot slip through as a single segment.
        for segment in relative.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    if parts.pop().is_none() {
                        return Err(ApiError::AccessDenied);
                    }
                }
                other => parts.push(other),
            }
        }

        // The trash area and the metadata document are internal state, not
        // client-addressable items; letting a request rename or delete them
        // would destroy every star/trash/share record.
        if let Some(first) = parts.first() {
            if *first == TRASH_DIR || *first == METADATA_FILE {
                return Err(ApiError::AccessDenied);
            }
        }

        let mut abs = self.root.clone();
        for part in parts {
            abs.push(part);
        }
        Ok(abs)
    }

    /// Join a user-controlled name segment (an uploaded filename, a new
    /// folder name) onto a base directory. The joined result must still live
    /// inside the resolved base; a name like `../../etc/passwd` is rejected
    /// rather than silently relocated.
    pub fn resolve_within(&self, base: &str, name: &str) -> Result<PathBuf, ApiError> {
        let base_abs = self.resolve(base)?;
        let joined = if base.is_empty() {
            self.resolve(name)?
        } else {
            self.resolve(&format!("{base}/{name}"))?
        };
        // Path::starts_with compares whole components, so `foo` is never
        // mistaken for a prefix of `foobar`.
        if !joined.starts_with(&base_abs) || joined == base_abs {
            return Err(ApiError::AccessDenied);
        }
        Ok(joined)
    }

    /// Inverse of `resolve`: the `/`-separated relative form of an absolute
    /// path under the root. Empty string for the root itself.
    pub fn relative_of(&self, abs: &Path) -> String {
        abs.strip_prefix(&self.root)
            .unwrap_or(abs)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}
