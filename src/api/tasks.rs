//! Task REST API
//!
//! POST /api/v1/tasks                     - Submit a task
//! GET  /api/v1/tasks/:task_id            - Latest stored result of a task
//! POST /api/v1/tasks/:task_id/approve    - Approve a paused task
//! POST /api/v1/tasks/:task_id/reject     - Reject a paused task
//! POST /api/v1/tasks/:task_id/cancel     - Cancel a paused or running task
//! GET  /api/v1/approvals                 - Tasks awaiting approval

use super::{status_for, ApiResponse};
use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use conductor_core::{AgentResult, Engine, PendingSummary, TaskStatus, TaskSubmission};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Header carrying the idempotency key
pub const IDEMPOTENCY_HEADER: &str = "x-idempotency-key";

type ApiResult<T> = (StatusCode, Json<ApiResponse<T>>);

/// Reject request body
#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

/// Cancel response
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub task_id: Uuid,
    pub cancelled: bool,
}

fn fail<T>(error: conductor_core::Error) -> ApiResult<T> {
    let status = status_for(&error);
    if status.is_server_error() {
        warn!(error = %error, "Request failed");
    }
    (status, Json(ApiResponse::error(error.to_string())))
}

fn respond(result: AgentResult) -> ApiResult<AgentResult> {
    let status = match result.status {
        TaskStatus::AwaitingApproval => StatusCode::ACCEPTED,
        TaskStatus::Completed | TaskStatus::Failed => StatusCode::OK,
    };
    (status, Json(ApiResponse::success(result)))
}

/// Header key wins over a body key
fn apply_header_key(headers: &HeaderMap, mut submission: TaskSubmission) -> TaskSubmission {
    if let Some(key) = headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
    {
        submission.idempotency_key = Some(key.to_string());
    }
    submission
}

async fn submit_task(
    Extension(engine): Extension<Arc<Engine>>,
    headers: HeaderMap,
    Json(submission): Json<TaskSubmission>,
) -> ApiResult<AgentResult> {
    let submission = apply_header_key(&headers, submission);
    debug!(task_type = %submission.task_type, "Task submitted over HTTP");
    match engine.submit(submission).await {
        Ok(result) => respond(result),
        Err(e) => fail(e),
    }
}

async fn get_task(
    Extension(engine): Extension<Arc<Engine>>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<AgentResult> {
    match engine.get_task(task_id).await {
        Ok(Some(result)) => (StatusCode::OK, Json(ApiResponse::success(result))),
        Ok(None) => fail(conductor_core::Error::TaskNotFound(task_id)),
        Err(e) => fail(e),
    }
}

async fn approve_task(
    Extension(engine): Extension<Arc<Engine>>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<AgentResult> {
    match engine.approve(task_id).await {
        Ok(result) => respond(result),
        Err(e) => fail(e),
    }
}

async fn reject_task(
    Extension(engine): Extension<Arc<Engine>>,
    Path(task_id): Path<Uuid>,
    body: Option<Json<RejectRequest>>,
) -> ApiResult<AgentResult> {
    let Json(request) = body.unwrap_or_default();
    match engine.reject(task_id, request.reason).await {
        Ok(result) => respond(result),
        Err(e) => fail(e),
    }
}

async fn cancel_task(
    Extension(engine): Extension<Arc<Engine>>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<CancelResponse> {
    match engine.cancel(task_id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(ApiResponse::success(CancelResponse {
                task_id,
                cancelled: true,
            })),
        ),
        Ok(false) => fail(conductor_core::Error::TaskNotFound(task_id)),
        Err(e) => fail(e),
    }
}

async fn list_approvals(
    Extension(engine): Extension<Arc<Engine>>,
) -> ApiResult<Vec<PendingSummary>> {
    match engine.pending_approvals().await {
        Ok(pending) => (StatusCode::OK, Json(ApiResponse::success(pending))),
        Err(e) => fail(e),
    }
}

/// Create task routes
pub fn tasks_routes() -> Router {
    Router::new()
        .route("/api/v1/tasks", post(submit_task))
        .route("/api/v1/tasks/:task_id", get(get_task))
        .route("/api/v1/tasks/:task_id/approve", post(approve_task))
        .route("/api/v1/tasks/:task_id/reject", post(reject_task))
        .route("/api/v1/tasks/:task_id/cancel", post(cancel_task))
        .route("/api/v1/approvals", get(list_approvals))
}
