use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::response::Json;
use blogvcs_service::{ServiceError, ServiceResult, VersionControl};
use blogvcs_types::{DocumentId, VersionId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;

type ApiResult = Result<Json<Value>, ApiError>;

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub service: VersionControl,
}

impl AppState {
    pub fn new(service: VersionControl) -> Self {
        Self { service }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveVersionRequest {
    #[serde(default)]
    pub blog_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub expected_revision: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertVersionRequest {
    #[serde(default)]
    pub blog_id: Option<String>,
    #[serde(default)]
    pub version_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogQuery {
    pub blog_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VersionQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    pub a: Option<String>,
    pub b: Option<String>,
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> Json<Value> {
    let config = state.service.config();
    Json(json!({
        "name": "blogvcs-server",
        "version": env!("CARGO_PKG_VERSION"),
        "diff": config.diff,
        "maxContentBytes": config.max_content_bytes,
    }))
}

/// `POST /api/save-version`
pub async fn save_version(
    State(state): State<AppState>,
    body: Result<Json<SaveVersionRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = body.map_err(|e| ApiError::invalid_input(e.body_text()))?;
    let blog_id = optional_id::<DocumentId>(req.blog_id.as_deref(), "blogId")?;
    if blog_id.is_none() && req.expected_revision.is_some() {
        return Err(ApiError::invalid_input("expectedRevision requires blogId"));
    }

    let saved = blocking(&state, move |service| match (blog_id, req.expected_revision) {
        (Some(id), Some(revision)) => {
            service.save_version_if(&id, &req.title, &req.content, revision)
        }
        (id, _) => service.save_version(id.as_ref(), &req.title, &req.content),
    })
    .await?;
    Ok(Json(json!({
        "ok": true,
        "blog": saved.document,
        "version": saved.version,
    })))
}

/// `GET /api/get-versions?blogId=`
pub async fn get_versions(State(state): State<AppState>, Query(q): Query<BlogQuery>) -> ApiResult {
    let blog_id = required_id::<DocumentId>(q.blog_id.as_deref(), "blogId")?;
    let versions = blocking(&state, move |service| service.list_versions(&blog_id)).await?;
    Ok(Json(json!({ "ok": true, "versions": versions })))
}

/// `GET /api/get-version?id=`
pub async fn get_version(State(state): State<AppState>, Query(q): Query<VersionQuery>) -> ApiResult {
    let id = required_id::<VersionId>(q.id.as_deref(), "id")?;
    let version = blocking(&state, move |service| service.get_version(&id)).await?;
    Ok(Json(json!({ "ok": true, "version": version })))
}

/// `GET /api/compare-versions?a=&b=`
pub async fn compare_versions(
    State(state): State<AppState>,
    Query(q): Query<CompareQuery>,
) -> ApiResult {
    let a = required_id::<VersionId>(q.a.as_deref(), "a")?;
    let b = required_id::<VersionId>(q.b.as_deref(), "b")?;
    let comparison = blocking(&state, move |service| service.compare_detailed(&a, &b)).await?;
    Ok(Json(json!({
        "ok": true,
        "diffHtml": comparison.markup,
        "stats": comparison.stats,
    })))
}

/// `POST /api/revert-version`
pub async fn revert_version(
    State(state): State<AppState>,
    body: Result<Json<RevertVersionRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = body.map_err(|e| ApiError::invalid_input(e.body_text()))?;
    let blog_id = required_id::<DocumentId>(req.blog_id.as_deref(), "blogId")?;
    let version_id = required_id::<VersionId>(req.version_id.as_deref(), "versionId")?;
    let saved = blocking(&state, move |service| service.revert(&blog_id, &version_id)).await?;
    Ok(Json(json!({
        "ok": true,
        "blog": saved.document,
        "version": saved.version,
    })))
}

/// `GET /api/content`
pub async fn list_content(State(state): State<AppState>) -> ApiResult {
    let posts = blocking(&state, |service| service.list_documents()).await?;
    Ok(Json(json!({ "ok": true, "posts": posts })))
}

/// Run a service call on the blocking pool: diffs are CPU-bound and journal
/// writes block on file I/O.
async fn blocking<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    F: FnOnce(&VersionControl) -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|e| ApiError(ServiceError::Internal(format!("service task failed: {e}"))))?;
    result.map_err(ApiError::from)
}

fn optional_id<T>(raw: Option<&str>, field: &str) -> Result<Option<T>, ApiError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse()
            .map(Some)
            .map_err(|e| ApiError::invalid_input(format!("{field}: {e}"))),
    }
}

fn required_id<T>(raw: Option<&str>, field: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_id(raw, field)?.ok_or_else(|| ApiError::invalid_input(format!("{field} required")))
}
