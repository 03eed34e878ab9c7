//! HTTP surface (axum).
//!
//! - `POST /:queue/:task`                → 202 + `{"queue", "task", "job_id"}`
//! - `GET  /:queue/:task`                → schema page (`text/html`)
//! - `GET  /:queue/:task/jobs/:job_id`   → `{"job_id", "state"}`
//! - `GET  /:resource`                   → bundled static asset
//! - `GET  /health`

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use super::producer::{DispatchError, Enqueued, Producer};
use super::resources::StaticResources;
use crate::domain::{BrokerError, JobHandle, JobState, RequestError};

#[derive(Clone)]
pub struct AppState {
    pub producer: Arc<Producer>,
    pub resources: Arc<StaticResources>,
}

/// Error body: a stable `title` plus a human readable `description`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    title: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    Request(RequestError),
    Broker(BrokerError),
    InvalidJobId(String),
    NotFound(String),
}

impl From<RequestError> for ApiError {
    fn from(e: RequestError) -> Self {
        ApiError::Request(e)
    }
}

impl From<DispatchError> for ApiError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::Request(e) => ApiError::Request(e),
            DispatchError::Broker(e) => ApiError::Broker(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Request(e) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    title: e.title().to_string(),
                    description: e.description(),
                    stage: e.stage().map(ToString::to_string),
                },
            ),
            ApiError::Broker(BrokerError::UnknownJob(job)) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    title: "Unknown job".to_string(),
                    description: format!("{job} is unknown job"),
                    stage: None,
                },
            ),
            ApiError::Broker(e) => (
                StatusCode::BAD_GATEWAY,
                ErrorBody {
                    title: "Broker unavailable".to_string(),
                    description: e.to_string(),
                    stage: None,
                },
            ),
            ApiError::InvalidJobId(raw) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    title: "Invalid job id".to_string(),
                    description: format!("{raw} is not a job id"),
                    stage: None,
                },
            ),
            ApiError::NotFound(name) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    title: "Not found".to_string(),
                    description: format!("{name} is not found"),
                    stage: None,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    job_id: JobHandle,
    state: JobState,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn enqueue(
    State(state): State<AppState>,
    Path((queue, task)): Path<(String, String)>,
    body: Bytes,
) -> Result<(StatusCode, Json<Enqueued>), ApiError> {
    let enqueued = state.producer.enqueue(&queue, &task, &body).await?;
    Ok((StatusCode::ACCEPTED, Json(enqueued)))
}

async fn describe(
    State(state): State<AppState>,
    Path((queue, task)): Path<(String, String)>,
) -> Result<Html<String>, ApiError> {
    let schema = state.producer.describe(&queue, &task)?;
    Ok(Html(schema.render_html()))
}

async fn job_status(
    State(state): State<AppState>,
    Path((queue, task, job_id)): Path<(String, String, String)>,
) -> Result<Json<StatusResponse>, ApiError> {
    let job: JobHandle = job_id
        .parse()
        .map_err(|_| ApiError::InvalidJobId(job_id.clone()))?;
    let job_state = state.producer.status(&queue, &task, &job).await?;
    Ok(Json(StatusResponse {
        job_id: job,
        state: job_state,
    }))
}

async fn static_resource(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<Response, ApiError> {
    let found = state
        .resources
        .load(&resource)
        .await
        .ok_or(ApiError::NotFound(resource))?;
    Ok(([(header::CONTENT_TYPE, found.content_type)], found.bytes).into_response())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/:resource", get(static_resource))
        .route("/:queue/:task", get(describe).post(enqueue))
        .route("/:queue/:task/jobs/:job_id", get(job_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
