//! Web API module for Conductor
//!
//! Provides REST API endpoints for:
//! - Task submission, lookup and cancellation
//! - Approval decisions for paused tasks
//! - Skill catalog listing
//! - Benchmark leaderboard and snapshot sync
//! - Health checks

pub mod benchmarks;
pub mod health;
pub mod skills;
pub mod tasks;

use axum::http::StatusCode;
use axum::Router;
use conductor_core::Error;
use serde::Serialize;

pub use benchmarks::benchmarks_routes;
pub use health::health_routes;
pub use skills::skills_routes;
pub use tasks::tasks_routes;

/// Create the API router with all endpoints
pub fn api_router() -> Router {
    Router::new()
        .merge(health_routes())
        .merge(tasks_routes())
        .merge(skills_routes())
        .merge(benchmarks_routes())
}

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// HTTP status for an engine error
pub fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::TaskNotFound(_) => StatusCode::NOT_FOUND,
        Error::NotAwaitingApproval(_) | Error::DuplicateSubmission { .. } => StatusCode::CONFLICT,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&Error::MissingIdempotencyKey), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&Error::TaskNotFound(Uuid::nil())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&Error::NotAwaitingApproval(Uuid::nil())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&Error::Store("down".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_response_omits_data() {
        let json = serde_json::to_value(ApiResponse::<()>::error("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "boom"}));
    }
}
