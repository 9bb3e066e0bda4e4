//! HTTP routes for the server.
//!
//! Every endpoint lives under `/api`.

use crate::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, Form, Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use projex_core::{CoreError, ExportSummary, PromptPayload, PromptRequest, UploadedFile};
use projex_patch::{MutationOperation, MutationOutcome, PatchExecutor, PatchFailure};
use projex_snapshot::SnapshotError;
use projex_util::path::expand_home;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, Span};

/// Largest accepted upload request body.
pub const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors_enabled = state.cors;

    let api = Router::new()
        .route("/health", get(health))
        .route("/projects/analyze", post(analyze_project))
        .route(
            "/projects/upload",
            post(upload_project).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/projects/download", get(download_export))
        .route("/prompts/build", post(build_prompt))
        .route("/patch/apply", post(apply_patch));

    let mut router = Router::new().nest("/api", api).with_state(state);

    if cors_enabled {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            })
            .on_response(
                |response: &axum::http::Response<_>, latency: Duration, _span: &Span| {
                    info!(
                        status = %response.status(),
                        latency = ?latency,
                        "response"
                    );
                },
            ),
    )
}

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Deserialize)]
struct AnalyzeForm {
    path: String,
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    path: String,
}

#[derive(Debug, Deserialize)]
struct ApplyRequest {
    project_root: String,
    operations: Vec<MutationOperation>,
}

#[derive(Debug, Serialize)]
struct ApplyResponse {
    status: &'static str,
    results: Vec<MutationOutcome>,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
    code: String,
    /// Outcomes of patch operations applied before the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<Vec<MutationOutcome>>,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

impl ApiError {
    fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            applied: None,
        }
    }

    fn not_found(msg: impl Into<String>) -> (StatusCode, Json<Self>) {
        (StatusCode::NOT_FOUND, Json(Self::new(msg, "NOT_FOUND")))
    }

    fn bad_request(msg: impl Into<String>) -> (StatusCode, Json<Self>) {
        (StatusCode::BAD_REQUEST, Json(Self::new(msg, "BAD_REQUEST")))
    }

    fn internal(msg: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Self::new(msg, "INTERNAL_ERROR")),
        )
    }

    fn from_core(e: CoreError) -> (StatusCode, Json<Self>) {
        match e {
            CoreError::Snapshot(e) => Self::from_snapshot(e),
            e if e.is_client_fault() => Self::bad_request(e.to_string()),
            e => Self::internal(e.to_string()),
        }
    }

    fn from_snapshot(e: SnapshotError) -> (StatusCode, Json<Self>) {
        match e {
            SnapshotError::ArtifactNotFound(_) => Self::not_found("Export not found"),
            e if e.is_client_fault() => Self::bad_request(e.to_string()),
            e => Self::internal(e.to_string()),
        }
    }

    fn from_patch(failure: PatchFailure) -> (StatusCode, Json<Self>) {
        let (status, code) = if failure.error.is_client_fault() {
            (StatusCode::BAD_REQUEST, "BAD_REQUEST")
        } else {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        };
        let mut body = Self::new(failure.error.to_string(), code);
        body.applied = Some(failure.applied);
        (status, Json(body))
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Export a directory on the server's filesystem.
async fn analyze_project(
    State(state): State<AppState>,
    Form(form): Form<AnalyzeForm>,
) -> ApiResult<Json<ExportSummary>> {
    let root = expand_home(form.path.trim());
    state
        .exports
        .export_directory(&root)
        .await
        .map(Json)
        .map_err(ApiError::from_core)
}

/// Export a folder uploaded as multipart files.
async fn upload_project(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ExportSummary>> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        files.push(UploadedFile {
            name,
            bytes: bytes.to_vec(),
        });
    }

    state
        .exports
        .export_upload(files)
        .await
        .map(Json)
        .map_err(ApiError::from_core)
}

/// Download an export artifact from the store.
async fn download_export(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> ApiResult<impl IntoResponse> {
    let path = state
        .exports
        .store()
        .locate(&query.path)
        .await
        .map_err(ApiError::from_snapshot)?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| projex_snapshot::EXPORT_FILE_NAME.to_string());

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "text/markdown; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    ))
}

async fn build_prompt(Json(request): Json<PromptRequest>) -> ApiResult<Json<PromptPayload>> {
    PromptPayload::build(request)
        .map(Json)
        .map_err(ApiError::from_core)
}

/// Apply patch operations to a project root.
async fn apply_patch(Json(request): Json<ApplyRequest>) -> ApiResult<Json<ApplyResponse>> {
    let root = expand_home(request.project_root.trim());
    let executor =
        PatchExecutor::new(&root).map_err(|_| ApiError::bad_request("Project root not found"))?;

    let results = executor
        .apply(&request.operations)
        .await
        .map_err(ApiError::from_patch)?;

    Ok(Json(ApplyResponse {
        status: "ok",
        results,
    }))
}
