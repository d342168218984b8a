use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::{write::FileOptions, ZipWriter};

use crate::error::ApiError;

fn zip_entry_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Package a directory into an anonymous temp file containing a zip of its
/// visible contents, rewound and ready to stream. Dot-prefixed entries are
/// skipped at every level, matching the listing policy.
pub async fn zip_directory(dir: PathBuf) -> Result<std::fs::File, ApiError> {
    tokio::task::spawn_blocking(move || -> Result<std::fs::File, std::io::Error> {
        let file = tempfile::tempfile()?;
        let mut zip = ZipWriter::new(file);
        let options =
            FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'))
            .filter_map(|e| e.ok())
        {
            let name = zip_entry_name(&dir, entry.path());
            if entry.file_type().is_dir() {
                zip.add_directory(name, options)?;
            } else if entry.file_type().is_file() {
                zip.start_file(name, options)?;
                let mut reader = std::fs::File::open(entry.path())?;
                std::io::copy(&mut reader, &mut zip)?;
            }
        }

        let mut file = zip.finish()?;
        file.seek(SeekFrom::Start(0))?;
        Ok(file)
    })
    .await
    .map_err(|e| ApiError::Internal(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    .map_err(ApiError::Internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[tokio::test]
    async fn zips_nested_visible_files_and_skips_hidden() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), b"beta").unwrap();
        std::fs::write(dir.path().join(".hidden"), b"nope").unwrap();

        let file = zip_directory(dir.path().to_path_buf()).await.unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();

        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.iter().any(|n| n == "a.txt"));
        assert!(names.iter().any(|n| n == "sub/b.txt"));
        assert!(!names.iter().any(|n| n.contains(".hidden")));

        let mut content = String::new();
        archive
            .by_name("sub/b.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "beta");
    }
}
