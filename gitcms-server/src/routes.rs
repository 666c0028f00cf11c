//! Request handlers. Each one parses its input, runs the blocking core
//! operation on the blocking pool, and shapes the JSON reply.

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, RawPathParams, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use bytes::Bytes;
use gitcms::{ContentStore, Relocation, UploadedFile};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::RouterOptions;
use crate::error::ApiError;
use crate::upload::{discard, read_upload, UploadForm};

const PATH_PARAM: &str = "rel_path";

#[derive(Clone)]
pub struct AppState {
    pub store: ContentStore,
}

impl AppState {
    pub fn new(store: ContentStore) -> Self {
        Self { store }
    }
}

#[derive(Debug, Default, Deserialize)]
struct AuthorBody {
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateBody {
    content: String,
}

#[derive(Debug, Deserialize)]
struct CommitBody {
    files: Vec<String>,
    message: Option<String>,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResetBody {
    files: Vec<String>,
}

#[derive(Debug, Serialize)]
struct UploadReply {
    #[serde(flatten)]
    file: UploadedFile,
    relocation: Relocation,
}

pub fn router(state: AppState, options: &RouterOptions) -> Router {
    let router = Router::new()
        .route("/upload", post(upload))
        .route("/commit", post(commit))
        .route("/reset", post(reset))
        .route("/reset/all", post(reset_all))
        .route("/show/{*rel_path}", get(show))
        .route("/{*rel_path}", put(create_file).delete(delete_file))
        .layer(DefaultBodyLimit::max(options.max_upload))
        .with_state(state);

    if options.cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Run a core operation on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<gitcms::Result<T>, ApiError>
where
    F: FnOnce() -> gitcms::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(format!("worker failed: {}", e)))
}

/// The still-encoded wildcard segment; the resolver decodes it exactly once.
fn raw_path(params: &RawPathParams) -> String {
    params
        .iter()
        .find(|(name, _)| *name == PATH_PARAM)
        .map(|(_, value)| value.to_string())
        .unwrap_or_default()
}

async fn delete_file(
    State(state): State<AppState>,
    params: RawPathParams,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let rel = raw_path(&params);
    let author: AuthorBody = if body.is_empty() {
        AuthorBody::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::bad_request(e.to_string()))?
    };

    let store = state.store.clone();
    let target = rel.clone();
    let commit = blocking(move || store.delete_file(&target, author.name, author.email))
        .await?
        .map_err(|e| {
            warn!(path = %rel, error = %e, "delete failed");
            ApiError::mutation(e)
        })?;

    info!(path = %rel, commit = %commit, "deleted");
    Ok(Json(json!({ "status": "success" })))
}

async fn create_file(
    State(state): State<AppState>,
    params: RawPathParams,
    body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let rel = raw_path(&params);
    let Json(body) = body?;

    let store = state.store.clone();
    let content = body.content;
    let written = content.clone();
    blocking(move || store.create_file(&rel, written.as_bytes()))
        .await?
        .map_err(ApiError::mutation)?;

    Ok(Json(json!({ "content": content })))
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadReply>, ApiError> {
    let UploadForm { file, directory } = read_upload(state.store.stager(), &mut multipart).await?;

    let store = state.store.clone();
    let uploaded = file.clone();
    let relocation = match blocking(move || store.upload_complete(&uploaded, &directory))
        .await
        .and_then(|r| r.map_err(ApiError::mutation))
    {
        Ok(relocation) => relocation,
        Err(e) => {
            discard(&file).await;
            return Err(e);
        }
    };

    match &relocation {
        Relocation::Relocated { path } => info!(path = %path, size = file.size, "upload stored"),
        Relocation::Failed { message } => {
            warn!(staged = %file.staged_name, error = %message, "upload left in staging")
        }
    }
    Ok(Json(UploadReply { file, relocation }))
}

async fn commit(
    State(state): State<AppState>,
    body: Result<Json<CommitBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;

    let store = state.store.clone();
    let count = body.files.len();
    let commit = blocking(move || store.commit(&body.files, body.message, body.name, body.email))
        .await?
        .map_err(|e| {
            warn!(error = %e, "commit failed");
            ApiError::repository(e)
        })?;

    info!(commit = %commit, files = count, "committed");
    Ok(Json(json!({ "status": "success", "commit": commit })))
}

async fn reset(
    State(state): State<AppState>,
    body: Result<Json<ResetBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;

    let store = state.store.clone();
    blocking(move || store.reset(&body.files))
        .await?
        .map_err(ApiError::repository)?;

    Ok(Json(json!({ "status": "success" })))
}

async fn reset_all(
    State(state): State<AppState>,
    body: Result<Json<ResetBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;

    let store = state.store.clone();
    blocking(move || store.reset_all(&body.files))
        .await?
        .map_err(ApiError::repository)?;

    Ok(Json(json!({ "status": "success" })))
}

async fn show(
    State(state): State<AppState>,
    params: RawPathParams,
) -> Result<Json<Value>, ApiError> {
    let rel = raw_path(&params);

    let store = state.store.clone();
    let target = rel.clone();
    let content = blocking(move || store.show(&target))
        .await?
        .map_err(|e| ApiError::show(e, rel.clone()))?;

    Ok(Json(json!({
        "fileRelativePath": rel,
        "content": String::from_utf8_lossy(&content),
        "status": "success",
    })))
}
