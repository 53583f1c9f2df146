use crate::config::Settings;
use crate::docker::models::{ServiceStatus, StatsResponse};
use crate::docker::DockerClient;
use crate::error::{ObserverError, Result};
use crate::registry::RegctlClient;
use crate::tasks::{BatchUpdateRequest, TaskEngine, TaskKey, UpdateRequest};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub docker: Arc<DockerClient>,
    pub regctl: Arc<RegctlClient>,
    pub engine: Arc<TaskEngine>,
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = match &self {
            ObserverError::StackNotFound(_)
            | ObserverError::ServiceNotFound { .. }
            | ObserverError::TaskNotFound { .. } => StatusCode::NOT_FOUND,
            ObserverError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize, Default)]
struct DiscoveryQuery {
    #[serde(default)]
    no_cache: bool,
    #[serde(default)]
    include_stopped: bool,
    #[serde(default)]
    local_only: bool,
}

#[derive(Debug, Deserialize, Default)]
struct NoCacheQuery {
    #[serde(default)]
    no_cache: bool,
}

#[derive(Debug, Deserialize, Default)]
struct OffsetQuery {
    #[serde(default)]
    offset: usize,
}

#[derive(Debug, Deserialize, Default)]
struct RegctlQuery {
    #[serde(default)]
    tag: String,
    #[serde(default)]
    no_cache: bool,
}

#[derive(Debug, Deserialize, Default)]
struct PullImageRequest {
    #[serde(rename = "repoTag", default)]
    repo_tag: String,
}

pub fn router(state: AppState, static_dir: PathBuf) -> Router {
    Router::new()
        .route("/api", get(api_root))
        .route("/api/settings", get(get_settings))
        .route("/api/stats", get(get_stats))
        .route("/api/stacks", get(list_stacks))
        .route("/api/stacks/batch_update", post(batch_update))
        .route("/api/stacks/:stack", get(get_stack))
        .route("/api/stacks/:stack/:service", get(get_service))
        .route("/api/stacks/:stack/:service/task", post(start_task).get(read_task))
        .route("/api/images", get(list_images))
        .route("/api/images/pull", post(pull_image))
        .route("/api/regctl/digest", get(regctl_digest))
        .route("/api/regctl/inspect", get(regctl_inspect))
        .route("/api/updates/last", get(last_update_check))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16, static_dir: PathBuf) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "http server listening");
    axum::serve(listener, router(state, static_dir)).await?;
    Ok(())
}

async fn api_root() -> impl IntoResponse {
    (
        StatusCode::IM_A_TEAPOT,
        Json(json!({ "message": "This is not the endpoint you are looking for" })),
    )
}

async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.settings.clone())
}

async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<DiscoveryQuery>,
) -> Result<Json<StatsResponse>> {
    let stacks = state
        .docker
        .reconcile_stacks(query.no_cache, false, !query.local_only)
        .await?;
    let mut stats = StatsResponse {
        num_of_stacks: stacks.len(),
        ..Default::default()
    };
    for stack in &stacks {
        if stack.has_updates {
            stats.num_of_stacks_with_updates += 1;
        }
        for service in &stack.services {
            if service.status == ServiceStatus::NotLoaded || service.image.is_none() {
                continue;
            }
            stats.num_of_services += 1;
            if service.has_updates {
                stats.num_of_services_with_updates += 1;
            }
        }
    }
    Ok(Json(stats))
}

async fn list_stacks(
    State(state): State<AppState>,
    Query(query): Query<DiscoveryQuery>,
) -> Result<impl IntoResponse> {
    let stacks = state
        .docker
        .reconcile_stacks(query.no_cache, query.include_stopped, !query.local_only)
        .await?;
    Ok(Json(stacks))
}

async fn get_stack(
    State(state): State<AppState>,
    Path(stack): Path<String>,
    Query(query): Query<NoCacheQuery>,
) -> Result<impl IntoResponse> {
    let stack = state.docker.get_stack(&stack, query.no_cache).await?;
    Ok(Json(stack))
}

async fn get_service(
    State(state): State<AppState>,
    Path((stack, service)): Path<(String, String)>,
    Query(query): Query<NoCacheQuery>,
) -> Result<impl IntoResponse> {
    let service = state
        .docker
        .get_service(&stack, &service, query.no_cache)
        .await?;
    Ok(Json(service))
}

async fn start_task(
    State(state): State<AppState>,
    Path((stack, service)): Path<(String, String)>,
    Json(request): Json<UpdateRequest>,
) -> Result<impl IntoResponse> {
    let batch = BatchUpdateRequest {
        services: vec![format!("{stack}/{service}")],
        infer_env_file: request.infer_env_file,
        prune_images: request.prune_images,
        restart_containers: request.restart_containers,
    };
    state.engine.start_batch_update(&batch);
    Ok(Json(json!({})))
}

async fn read_task(
    State(state): State<AppState>,
    Path((stack, service)): Path<(String, String)>,
    Query(query): Query<OffsetQuery>,
) -> Result<impl IntoResponse> {
    let key = TaskKey {
        stack: stack.clone(),
        service: service.clone(),
    };
    let messages = state
        .engine
        .read_task(&key, query.offset)
        .ok_or(ObserverError::TaskNotFound { stack, service })?;
    Ok(Json(messages))
}

async fn batch_update(
    State(state): State<AppState>,
    Json(request): Json<BatchUpdateRequest>,
) -> Result<impl IntoResponse> {
    state.engine.start_batch_update(&request);
    Ok(Json(json!({})))
}

async fn list_images(
    State(state): State<AppState>,
    Query(query): Query<DiscoveryQuery>,
) -> Result<impl IntoResponse> {
    let entries = state
        .docker
        .image_entries(query.no_cache, !query.local_only)
        .await?;
    Ok(Json(entries))
}

async fn pull_image(
    State(state): State<AppState>,
    Json(request): Json<PullImageRequest>,
) -> Response {
    if request.repo_tag.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Missing repoTag" })),
        )
            .into_response();
    }
    let (output, result) = state.docker.pull_image(&request.repo_tag).await;
    match result {
        Ok(()) => Json(json!({ "output": output, "success": true })).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": err.to_string(), "output": output })),
        )
            .into_response(),
    }
}

async fn regctl_digest(
    State(state): State<AppState>,
    Query(query): Query<RegctlQuery>,
) -> Result<impl IntoResponse> {
    if query.tag.is_empty() {
        return Err(ObserverError::BadRequest("Missing tag".to_string()));
    }
    let digest = state
        .regctl
        .remote_digest(&query.tag, query.no_cache)
        .await?
        .unwrap_or_default();
    Ok(([(header::CONTENT_TYPE, "text/plain")], digest))
}

async fn regctl_inspect(
    State(state): State<AppState>,
    Query(query): Query<RegctlQuery>,
) -> Result<impl IntoResponse> {
    if query.tag.is_empty() {
        return Err(ObserverError::BadRequest("Missing tag".to_string()));
    }
    let inspect = state.regctl.inspect(&query.tag, query.no_cache).await?;
    Ok(Json(inspect))
}

async fn last_update_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "lastCheck": rfc3339_or_zero(state.regctl.last_check()),
        "rateLimitedUntil": rfc3339_or_zero(state.regctl.rate_limit_until()),
    }))
}

// The wire format always carries an RFC3339 timestamp; "never happened" is
// the zero-time sentinel, not null.
fn rfc3339_or_zero(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(
        || "0001-01-01T00:00:00Z".to_string(),
        |at| at.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}
