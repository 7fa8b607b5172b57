//! Benchmark REST API
//!
//! GET  /api/v1/benchmarks/leaderboard   - Best skills by success per latency
//! GET  /api/v1/benchmarks/:skill_id     - Figures for one skill
//! POST /api/v1/benchmarks/sync          - Replace the routing snapshot

use super::ApiResponse;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use conductor_skills::{
    BenchmarkSnapshot, BenchmarkSource, BenchmarkStat, SharedBenchmarks, SkillId,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Leaderboard length
const LEADERBOARD_SIZE: usize = 15;

type ApiResult<T> = (StatusCode, Json<ApiResponse<T>>);

/// Leaderboard response
#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<BenchmarkStat>,
    pub total: usize,
}

/// Sync request body, same shape as the benchmark catalog
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub benchmarks: Vec<BenchmarkStat>,
}

/// Sync response
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub cached_count: usize,
    pub timestamp: DateTime<Utc>,
}

async fn leaderboard(
    Extension(benchmarks): Extension<Arc<SharedBenchmarks>>,
) -> Json<ApiResponse<LeaderboardResponse>> {
    let snapshot = benchmarks.snapshot().await;
    let leaderboard: Vec<BenchmarkStat> = snapshot
        .leaderboard(LEADERBOARD_SIZE)
        .into_iter()
        .cloned()
        .collect();
    Json(ApiResponse::success(LeaderboardResponse {
        total: leaderboard.len(),
        leaderboard,
    }))
}

async fn get_benchmark(
    Extension(benchmarks): Extension<Arc<SharedBenchmarks>>,
    Path(skill_id): Path<String>,
) -> ApiResult<BenchmarkStat> {
    let snapshot = benchmarks.snapshot().await;
    match snapshot.get(&SkillId::new(skill_id.as_str())) {
        Some(stat) => (StatusCode::OK, Json(ApiResponse::success(stat.clone()))),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("benchmark not found: {}", skill_id))),
        ),
    }
}

async fn sync_benchmarks(
    Extension(benchmarks): Extension<Arc<SharedBenchmarks>>,
    Json(request): Json<SyncRequest>,
) -> ApiResult<SyncResponse> {
    let snapshot = match BenchmarkSnapshot::try_from_stats(request.benchmarks) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(error = %e, "Rejected benchmark sync");
            return (StatusCode::BAD_REQUEST, Json(ApiResponse::error(e.to_string())));
        }
    };

    let cached_count = snapshot.len();
    benchmarks.replace(snapshot).await;
    info!(skills = cached_count, "Benchmarks synced over HTTP");

    (
        StatusCode::OK,
        Json(ApiResponse::success(SyncResponse {
            cached_count,
            timestamp: Utc::now(),
        })),
    )
}

/// Create benchmark routes
pub fn benchmarks_routes() -> Router {
    Router::new()
        .route("/api/v1/benchmarks/leaderboard", get(leaderboard))
        .route("/api/v1/benchmarks/sync", post(sync_benchmarks))
        .route("/api/v1/benchmarks/:skill_id", get(get_benchmark))
}
