//! Health check endpoints with component-level diagnostics.
//!
//! Provides:
//! - `/health` - simple "healthy" + version (for load balancers)
//! - `/health/detailed` - per-component status (idempotency store, engine, event_bus)

use crate::server::config::{IdempotencyBackend, IdempotencyConfig};
use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use conductor_core::{Engine, EventBus};
use serde::Serialize;
use std::sync::Arc;

/// Simple health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed health response with per-component checks
#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub checks: HealthChecks,
}

/// All component health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub idempotency_store: ComponentHealth,
    pub engine: ComponentHealth,
    pub event_bus: ComponentHealth,
}

/// Individual component health status
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ComponentHealth {
    fn healthy(latency_ms: u64) -> Self {
        Self {
            status: "healthy",
            latency_ms: Some(latency_ms),
            error: None,
            details: None,
        }
    }

    fn healthy_with_details(latency_ms: u64, details: serde_json::Value) -> Self {
        Self {
            status: "healthy",
            latency_ms: Some(latency_ms),
            error: None,
            details: Some(details),
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy",
            latency_ms: None,
            error: Some(error),
            details: None,
        }
    }
}

/// Simple health check (for load balancers)
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Detailed health check with all component statuses
async fn detailed_health_check(
    Extension(engine): Extension<Arc<Engine>>,
    Extension(event_bus): Extension<Arc<EventBus>>,
    Extension(idempotency): Extension<IdempotencyConfig>,
) -> Json<DetailedHealthResponse> {
    let store_health = match idempotency.backend {
        IdempotencyBackend::Memory => ComponentHealth::healthy(0),
        IdempotencyBackend::Redis => check_redis(&idempotency.redis_url).await,
    };

    let engine_health = check_engine(&engine).await;
    let event_bus_health = ComponentHealth::healthy_with_details(
        0,
        serde_json::json!({ "subscriber_count": event_bus.subscriber_count() }),
    );

    let components = [
        store_health.status,
        engine_health.status,
        event_bus_health.status,
    ];
    let healthy_count = components.iter().filter(|s| **s == "healthy").count();
    let unhealthy_count = components.iter().filter(|s| **s == "unhealthy").count();

    let overall_status = if unhealthy_count == 0 {
        "healthy"
    } else if healthy_count > 0 {
        "degraded"
    } else {
        "unhealthy"
    };

    Json(DetailedHealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            idempotency_store: store_health,
            engine: engine_health,
            event_bus: event_bus_health,
        },
    })
}

/// Check Redis connectivity
async fn check_redis(redis_url: &str) -> ComponentHealth {
    let start = std::time::Instant::now();
    match redis::Client::open(redis_url) {
        Ok(client) => match client.get_multiplexed_async_connection().await {
            Ok(mut conn) => match redis::cmd("PING").query_async::<String>(&mut conn).await {
                Ok(_) => ComponentHealth::healthy(start.elapsed().as_millis() as u64),
                Err(e) => ComponentHealth::unhealthy(e.to_string()),
            },
            Err(e) => ComponentHealth::unhealthy(e.to_string()),
        },
        Err(e) => ComponentHealth::unhealthy(e.to_string()),
    }
}

/// Engine load figures
async fn check_engine(engine: &Engine) -> ComponentHealth {
    let start = std::time::Instant::now();
    let pending = match engine.pending_approvals().await {
        Ok(pending) => pending.len(),
        Err(e) => return ComponentHealth::unhealthy(e.to_string()),
    };
    ComponentHealth::healthy_with_details(
        start.elapsed().as_millis() as u64,
        serde_json::json!({
            "store": engine.store_name(),
            "skills": engine.registry().len(),
            "active_tasks": engine.active_task_count(),
            "pending_approvals": pending,
        }),
    )
}

/// Create health routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/detailed", get(detailed_health_check))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_health_unhealthy() {
        let h = ComponentHealth::unhealthy("connection refused".to_string());
        assert_eq!(h.status, "unhealthy");
        assert!(h.latency_ms.is_none());
        assert_eq!(h.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_component_health_with_details() {
        let h = ComponentHealth::healthy_with_details(3, serde_json::json!({"store": "memory"}));
        assert_eq!(h.status, "healthy");
        assert_eq!(h.latency_ms, Some(3));
        assert!(h.details.is_some());
    }

    #[tokio::test]
    async fn test_health_response() {
        let Json(resp) = health_check().await;
        assert_eq!(resp.status, "healthy");
        assert_eq!(resp.version, env!("CARGO_PKG_VERSION"));
    }
}
