use std::convert::Infallible;
use std::path::PathBuf;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use tokio_stream::{wrappers::ReceiverStream, StreamExt as _};
use uuid::Uuid;

use crate::ai::{AiError, StreamEvent};
use crate::api::AppState;
use crate::config::AppConfig;
use crate::models::*;
use crate::project::context::{build_story_context, ContextOptions};
use crate::project::{export, ProjectStore};

const EXPAND_INSTRUCTION: &str = "You are a fiction co-writer. Expand the following passage \
into a richer, more detailed version, keeping its point of view, tense, and tone. \
Return only the expanded passage.";

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
/// The full error is logged server-side for debugging, but clients only
/// see a generic message to avoid leaking internal details.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Gateway failures: configuration and validation problems are the user's
/// to fix and are surfaced verbatim; anything else is an upstream failure.
fn ai_error(err: AiError) -> (StatusCode, String) {
    match err {
        AiError::MissingApiKey | AiError::EmptyPrompt => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        other => (StatusCode::BAD_GATEWAY, other.to_string()),
    }
}

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Document not found".to_string())
}

/// Resolve the store for the currently open project.
fn current_store(state: &AppState) -> Result<ProjectStore, (StatusCode, String)> {
    state
        .config
        .get()
        .last_opened_project
        .map(ProjectStore::open)
        .ok_or((StatusCode::NOT_FOUND, "No project is open".to_string()))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Settings
// ============================================================

pub async fn get_config(State(state): State<AppState>) -> Json<AppConfig> {
    Json(state.config.get())
}

pub async fn put_config(
    State(state): State<AppState>,
    Json(input): Json<AppConfig>,
) -> Result<Json<AppConfig>, (StatusCode, String)> {
    state.config.set(input.clone()).map_err(internal_error)?;
    Ok(Json(input))
}

// ============================================================
// Project lifecycle
// ============================================================

#[derive(Debug, Deserialize)]
pub struct OpenProjectInput {
    pub path: PathBuf,
}

pub async fn open_project(
    State(state): State<AppState>,
    Json(input): Json<OpenProjectInput>,
) -> Result<Json<ProjectManifest>, (StatusCode, String)> {
    let store = ProjectStore::open(&input.path);
    let manifest = store.init().await.map_err(internal_error)?;
    state
        .config
        .update(|config| config.last_opened_project = Some(input.path.clone()))
        .map_err(internal_error)?;
    Ok(Json(manifest))
}

pub async fn load_project(
    State(state): State<AppState>,
) -> Result<Json<ProjectManifest>, (StatusCode, String)> {
    let store = current_store(&state)?;
    Ok(Json(store.load().await))
}

// ============================================================
// Documents
// ============================================================

#[derive(Debug, Deserialize)]
pub struct CreateFileInput {
    pub category: Category,
    pub title: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

pub async fn create_file(
    State(state): State<AppState>,
    Json(input): Json<CreateFileInput>,
) -> Result<(StatusCode, Json<Node>), (StatusCode, String)> {
    let store = current_store(&state)?;
    store
        .create_file(input.category, &input.title, input.parent_id)
        .await
        .map(|node| (StatusCode::CREATED, Json(node)))
        .map_err(internal_error)
}

#[derive(Debug, Deserialize)]
pub struct RenameFileInput {
    pub title: String,
}

pub async fn rename_file(
    State(state): State<AppState>,
    Path((category, id)): Path<(Category, Uuid)>,
    Json(input): Json<RenameFileInput>,
) -> Result<StatusCode, (StatusCode, String)> {
    let store = current_store(&state)?;
    if store
        .rename_file(category, id, &input.title)
        .await
        .map_err(internal_error)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path((category, id)): Path<(Category, Uuid)>,
) -> Result<StatusCode, (StatusCode, String)> {
    let store = current_store(&state)?;
    if store
        .delete_file(category, id)
        .await
        .map_err(internal_error)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

#[derive(Debug, Deserialize)]
pub struct ReorderFilesInput {
    /// `None` reorders the forest roots, otherwise the parent's children.
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    pub ids: Vec<Uuid>,
}

pub async fn reorder_files(
    State(state): State<AppState>,
    Path(category): Path<Category>,
    Json(input): Json<ReorderFilesInput>,
) -> Result<StatusCode, (StatusCode, String)> {
    let store = current_store(&state)?;
    if store
        .reorder_files(category, input.parent_id, &input.ids)
        .await
        .map_err(internal_error)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub content: String,
}

pub async fn read_content(
    State(state): State<AppState>,
    Path((category, id)): Path<(Category, Uuid)>,
) -> Result<Json<ContentResponse>, (StatusCode, String)> {
    let store = current_store(&state)?;
    let content = store.read_content(category, id).await;
    Ok(Json(ContentResponse { content }))
}

#[derive(Debug, Deserialize)]
pub struct SaveContentInput {
    pub content: String,
}

pub async fn save_content(
    State(state): State<AppState>,
    Path((category, id)): Path<(Category, Uuid)>,
    Json(input): Json<SaveContentInput>,
) -> Result<StatusCode, (StatusCode, String)> {
    let store = current_store(&state)?;
    if store
        .save_content(category, id, &input.content)
        .await
        .map_err(internal_error)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

#[derive(Debug, Deserialize)]
pub struct SetActiveInput {
    pub is_active: bool,
}

pub async fn set_active(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SetActiveInput>,
) -> Result<StatusCode, (StatusCode, String)> {
    let store = current_store(&state)?;
    if store
        .set_active(id, input.is_active)
        .await
        .map_err(internal_error)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

#[derive(Debug, Deserialize)]
pub struct SetSummaryInput {
    pub summary: String,
}

pub async fn set_summary(
    State(state): State<AppState>,
    Path((category, id)): Path<(Category, Uuid)>,
    Json(input): Json<SetSummaryInput>,
) -> Result<StatusCode, (StatusCode, String)> {
    let store = current_store(&state)?;
    if store
        .set_summary(category, id, &input.summary)
        .await
        .map_err(internal_error)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// Generate and cache a summary for one chapter.
pub async fn summarize_chapter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SummaryResponse>, (StatusCode, String)> {
    let store = current_store(&state)?;
    let text = store.read_content(Category::Content, id).await;
    if text.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Chapter is empty".to_string()));
    }
    let summary = state.gateway.summarize(&text).await.map_err(ai_error)?;
    if !store
        .set_summary(Category::Content, id, &summary)
        .await
        .map_err(internal_error)?
    {
        return Err(not_found());
    }
    Ok(Json(SummaryResponse { summary }))
}

// ============================================================
// Export
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ExportInput {
    pub category: Category,
    pub target_path: PathBuf,
}

pub async fn export_category(
    State(state): State<AppState>,
    Json(input): Json<ExportInput>,
) -> Result<StatusCode, (StatusCode, String)> {
    let store = current_store(&state)?;
    export::export_category(&store, input.category, &input.target_path)
        .await
        .map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// AI
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ChatInput {
    pub message: String,
}

pub async fn chat(
    State(state): State<AppState>,
    Json(input): Json<ChatInput>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    let message = input.message.trim().to_string();
    if message.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Message must not be empty".to_string()));
    }
    let context = story_context(&state).await;
    stream_response(&state, message, context).await
}

#[derive(Debug, Deserialize)]
pub struct ExpandInput {
    pub selection: String,
}

pub async fn expand(
    State(state): State<AppState>,
    Json(input): Json<ExpandInput>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    let selection = input.selection.trim().to_string();
    if selection.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Selection must not be empty".to_string(),
        ));
    }
    let prompt = format!("{EXPAND_INSTRUCTION}\n\n{selection}");
    let context = story_context(&state).await;
    stream_response(&state, prompt, context).await
}

/// Story Bible for the current project, when one is open and any settings
/// document is opted in. `None` means the AI call carries no system
/// instruction at all.
async fn story_context(state: &AppState) -> Option<String> {
    let config = state.config.get();
    let store = ProjectStore::open(config.last_opened_project?);
    let context = build_story_context(
        &store,
        ContextOptions {
            max_history_chapters: config.max_history_chapters,
        },
    )
    .await;
    if context.is_empty() {
        None
    } else {
        Some(context)
    }
}

/// Bridge a gateway stream onto the wire: one `delta` event per increment,
/// then a single `done` or `error`.
async fn stream_response(
    state: &AppState,
    prompt: String,
    context: Option<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    let receiver = state
        .gateway
        .stream_text(&prompt, context.as_deref())
        .await
        .map_err(ai_error)?;
    let stream = ReceiverStream::new(receiver).map(|event| {
        Ok(match event {
            StreamEvent::Delta(text) => Event::default().event("delta").data(text),
            StreamEvent::Done => Event::default().event("done").data(""),
            StreamEvent::Error(message) => Event::default().event("error").data(message),
        })
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
