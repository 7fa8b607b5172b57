//! Server initialization and main run loop

use super::config::{AppConfig, IdempotencyBackend};
use super::loader::{load_benchmarks, load_config, load_skills};
use crate::api::api_router;
use anyhow::{Context, Result};
use axum::{routing::get, Extension, Router};
use conductor_core::{
    Engine, EventBus, Executor, IdempotencyStore, MemoryIdempotencyStore, RedisIdempotencyStore,
};
use conductor_skills::SharedBenchmarks;
use conductor_tools::{register_builtins, ArtifactStore, CapabilityRegistry, MemoryArtifactStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

/// Everything the HTTP layer and the CLI need from a built engine
pub struct Runtime {
    pub engine: Arc<Engine>,
    pub event_bus: Arc<EventBus>,
    pub benchmarks: Arc<SharedBenchmarks>,
}

/// Build the engine from configuration: catalogs, capabilities, stores
pub async fn build_engine(config: &AppConfig) -> Result<Runtime> {
    let engine_config = config.engine_config();
    engine_config
        .router
        .validate()
        .context("Invalid routing configuration")?;

    let registry = Arc::new(load_skills(config)?);
    let benchmarks = Arc::new(SharedBenchmarks::new(load_benchmarks(config)?));

    let mut capabilities = CapabilityRegistry::new();
    register_builtins(&mut capabilities);
    for skill in registry.iter() {
        if !capabilities.has(&skill.capability) {
            warn!(
                skill_id = %skill.id,
                capability = %skill.capability,
                "Skill is bound to an unregistered capability"
            );
        }
    }
    info!(capabilities = capabilities.len(), skills = registry.len(), "Catalog ready");

    let artifacts: Arc<dyn ArtifactStore> = Arc::new(MemoryArtifactStore::new());
    let executor = Executor::new(Arc::new(capabilities), artifacts.clone());

    let store: Arc<dyn IdempotencyStore> = match config.idempotency.backend {
        IdempotencyBackend::Memory => Arc::new(MemoryIdempotencyStore::new()),
        IdempotencyBackend::Redis => Arc::new(
            RedisIdempotencyStore::with_options(
                &config.idempotency.redis_url,
                &config.idempotency.key_prefix,
                config.idempotency.result_ttl_secs,
            )
            .context("Failed to create Redis idempotency store")?,
        ),
    };
    info!(backend = store.name(), "Idempotency store ready");

    let event_bus = Arc::new(EventBus::default());
    let engine = Engine::new(registry, Arc::new(executor), engine_config)
        .with_store(store)
        .with_artifact_store(artifacts)
        .with_benchmarks(benchmarks.clone())
        .with_event_bus(event_bus.clone());

    Ok(Runtime {
        engine: Arc::new(engine),
        event_bus,
        benchmarks,
    })
}

/// Run the server
pub async fn run() -> Result<()> {
    let config = load_config().context("Failed to load configuration")?;
    info!("Configuration loaded");

    let runtime = build_engine(&config).await?;

    // Mirror engine events into the log
    let mut events = runtime.event_bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            debug!(task_id = %event.task_id(), event = ?event, "Engine event");
        }
    });

    let app = Router::new()
        .merge(api_router())
        .route("/", get(|| async { "Conductor orchestration engine" }))
        .layer(Extension(runtime.engine.clone()))
        .layer(Extension(runtime.event_bus.clone()))
        .layer(Extension(runtime.benchmarks.clone()))
        .layer(Extension(config.idempotency.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    info!("HTTP server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Conductor shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received SIGTERM signal"),
    }
}
