//! Capability-token sharing: issuance, dereference failures, subtree
//! confinement while browsing, and interaction with move and trash.

use nas_server::error::ApiError;
use nas_server::share::{self, SharePayload};
use nas_server::{metadata, moves, trash, Storage};

async fn setup() -> (tempfile::TempDir, Storage) {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::new(dir.path().canonicalize().unwrap());
    tokio::fs::create_dir_all(storage.trash_dir()).await.unwrap();
    (dir, storage)
}

async fn write_file(storage: &Storage, rel: &str, contents: &str) {
    let abs = storage.resolve(rel).unwrap();
    if let Some(parent) = abs.parent() {
        tokio::fs::create_dir_all(parent).await.unwrap();
    }
    tokio::fs::write(abs, contents).await.unwrap();
}

#[tokio::test]
async fn share_tokens_are_long_and_unique() {
    let (_dir, storage) = setup().await;
    write_file(&storage, "doc.pdf", "pdf").await;

    let a = share::create_share(&storage, "doc.pdf").await.unwrap();
    let b = share::create_share(&storage, "doc.pdf").await.unwrap();
    assert_ne!(a, b);
    assert!(a.len() >= 32);
}

#[tokio::test]
async fn sharing_a_missing_path_fails() {
    let (_dir, storage) = setup().await;
    assert!(matches!(
        share::create_share(&storage, "ghost.txt").await,
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
async fn unknown_token_is_link_invalid() {
    let (_dir, storage) = setup().await;
    assert!(matches!(
        share::resolve_share(&storage, "deadbeef").await,
        Err(ApiError::LinkInvalid)
    ));
}

#[tokio::test]
async fn share_info_reports_the_target() {
    let (_dir, storage) = setup().await;
    write_file(&storage, "media/song.mp3", "notes").await;
    let token = share::create_share(&storage, "media/song.mp3").await.unwrap();

    let info = share::share_info(&storage, &token).await.unwrap();
    assert_eq!(info.name, "song.mp3");
    assert_eq!(info.size, 5);
    assert!(!info.is_directory);
    assert_eq!(info.content_type, "audio/mpeg");
}

#[tokio::test]
async fn share_follows_a_moved_target() {
    let (_dir, storage) = setup().await;
    write_file(&storage, "inbox/report.txt", "r").await;
    tokio::fs::create_dir_all(storage.resolve("archive").unwrap())
        .await
        .unwrap();

    let token = share::create_share(&storage, "inbox/report.txt")
        .await
        .unwrap();
    moves::move_many(&storage, &["inbox/report.txt".to_string()], "archive")
        .await
        .unwrap();

    let (record, _, _) = share::resolve_share(&storage, &token).await.unwrap();
    assert_eq!(record.path, "archive/report.txt");
    assert!(share::share_info(&storage, &token).await.is_ok());
}

#[tokio::test]
async fn trashed_target_is_gone_but_the_token_survives() {
    let (_dir, storage) = setup().await;
    write_file(&storage, "temp.txt", "t").await;
    let token = share::create_share(&storage, "temp.txt").await.unwrap();

    trash::move_to_trash(&storage, "temp.txt").await.unwrap();

    assert!(matches!(
        share::resolve_share(&storage, &token).await,
        Err(ApiError::TargetGone)
    ));
    let doc = metadata::load(&storage).await;
    assert!(doc.shared.contains_key(&token));
}

#[tokio::test]
async fn browsing_is_confined_to_the_shared_subtree() {
    let (_dir, storage) = setup().await;
    write_file(&storage, "public/readme.md", "hi").await;
    write_file(&storage, "public/sub/deep.txt", "d").await;
    write_file(&storage, "private/secret.txt", "s").await;

    let token = share::create_share(&storage, "public").await.unwrap();

    let entries = share::browse(&storage, &token, "").await.unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["sub", "readme.md"]);

    let sub = share::browse(&storage, &token, "sub").await.unwrap();
    assert_eq!(sub[0].name, "deep.txt");
    // Paths are relative to the share root, not the storage root.
    assert_eq!(sub[0].path, "sub/deep.txt");

    assert!(matches!(
        share::browse(&storage, &token, "../private").await,
        Err(ApiError::AccessDenied)
    ));
}

#[tokio::test]
async fn browsing_a_file_share_is_rejected() {
    let (_dir, storage) = setup().await;
    write_file(&storage, "single.txt", "x").await;
    let token = share::create_share(&storage, "single.txt").await.unwrap();

    assert!(matches!(
        share::browse(&storage, &token, "").await,
        Err(ApiError::NotADirectory(_))
    ));
}

#[tokio::test]
async fn download_target_distinguishes_files_and_folders() {
    let (_dir, storage) = setup().await;
    write_file(&storage, "pack/a.txt", "a").await;
    write_file(&storage, "solo.txt", "s").await;

    let file_token = share::create_share(&storage, "solo.txt").await.unwrap();
    match share::download_target(&storage, &file_token, "").await.unwrap() {
        SharePayload::File { name, .. } => assert_eq!(name, "solo.txt"),
        SharePayload::Folder { .. } => panic!("file share resolved as folder"),
    }
    // A sub-path makes no sense on a file share.
    assert!(matches!(
        share::download_target(&storage, &file_token, "a.txt").await,
        Err(ApiError::NotFound(_))
    ));

    let dir_token = share::create_share(&storage, "pack").await.unwrap();
    match share::download_target(&storage, &dir_token, "").await.unwrap() {
        SharePayload::Folder { name, .. } => assert_eq!(name, "pack"),
        SharePayload::File { .. } => panic!("folder share resolved as file"),
    }
    match share::download_target(&storage, &dir_token, "a.txt").await.unwrap() {
        SharePayload::File { name, .. } => assert_eq!(name, "a.txt"),
        SharePayload::Folder { .. } => panic!("inner file resolved as folder"),
    }

    // Escaping the share through the sub-path is the same attack as any
    // other traversal.
    assert!(matches!(
        share::download_target(&storage, &dir_token, "../solo.txt").await,
        Err(ApiError::AccessDenied)
    ));
}
