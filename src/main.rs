use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use nas_server::{router, AppState, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let root = PathBuf::from(
        std::env::var("STORAGE_ROOT").unwrap_or_else(|_| "./storage".to_string()),
    );
    std::fs::create_dir_all(&root)
        .with_context(|| format!("creating storage root {}", root.display()))?;
    let root = root
        .canonicalize()
        .context("canonicalizing storage root")?;

    let storage = Storage::new(root);
    std::fs::create_dir_all(storage.trash_dir()).context("creating trash area")?;

    let state = AppState {
        storage,
        public_base_url: std::env::var("PUBLIC_BASE_URL").unwrap_or_default(),
    };
    let app = router(state);

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse()
        .context("parsing BIND_ADDR")?;
    info!("Server listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
