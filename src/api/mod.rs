//! HTTP surface consumed by the desktop shell.
//!
//! The GUI is a separate process; everything it can do goes through this
//! local router: project lifecycle, tree mutations, content I/O, settings,
//! export, and the streaming AI endpoints.

mod handlers;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::ai::AiGateway;
use crate::config::ConfigStore;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ConfigStore,
    pub gateway: Arc<dyn AiGateway>,
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Settings
        .route("/config", get(handlers::get_config))
        .route("/config", put(handlers::put_config))
        // Project lifecycle
        .route("/project/open", post(handlers::open_project))
        .route("/project", get(handlers::load_project))
        // Documents
        .route("/files", post(handlers::create_file))
        .route("/files/{category}/reorder", post(handlers::reorder_files))
        .route("/files/{category}/{id}", put(handlers::rename_file))
        .route("/files/{category}/{id}", delete(handlers::delete_file))
        .route("/files/{category}/{id}/content", get(handlers::read_content))
        .route("/files/{category}/{id}/content", put(handlers::save_content))
        .route("/files/{category}/{id}/summary", put(handlers::set_summary))
        .route("/files/settings/{id}/active", put(handlers::set_active))
        .route(
            "/files/content/{id}/summarize",
            post(handlers::summarize_chapter),
        )
        // Export
        .route("/export", post(handlers::export_category))
        // AI
        .route("/ai/chat", post(handlers::chat))
        .route("/ai/expand", post(handlers::expand))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
