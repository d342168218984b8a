pub mod archive;
pub mod error;
pub mod handlers;
pub mod listing;
pub mod metadata;
pub mod moves;
pub mod protocol;
pub mod share;
pub mod storage;
pub mod trash;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    /// Prefix for share URLs handed back to clients, e.g. "https://nas.local".
    pub public_base_url: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/files", get(handlers::list_files))
        .route("/api/recent", get(handlers::list_recent))
        .route("/api/starred", get(handlers::list_starred))
        .route("/api/trash", get(handlers::list_trash))
        .route("/api/trash", delete(handlers::empty_trash))
        .route("/api/folder", post(handlers::create_folder))
        .route("/api/delete", delete(handlers::delete))
        .route("/api/restore", post(handlers::restore))
        .route("/api/move", post(handlers::move_items))
        .route("/api/star", post(handlers::star))
        // Uploads carry whole files; the default 2 MB body cap must not
        // apply. Fields stream to disk, so memory stays bounded regardless.
        .route(
            "/api/upload",
            post(handlers::upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/api/download", get(handlers::download))
        .route("/api/stream", get(handlers::stream))
        .route("/api/share", post(handlers::create_share))
        .route("/api/share/:token/info", get(handlers::share_info))
        .route("/api/share/:token/list", get(handlers::share_list))
        .route("/api/share/:token/download", get(handlers::share_download))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}
