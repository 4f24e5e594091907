//! Maritime route optimizer service entrypoint.
//!
//! Ported from the teacher's `main`: load config, connect to Redis and
//! SurrealDB, build shared state, spawn a background graph reload task,
//! spawn the metrics/health server, then serve gRPC. Generalized from a
//! multimodal transport optimizer to the single-mode maritime planner.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use maritime_route_optimizer::cache::redis_backend::RedisSharedCache;
use maritime_route_optimizer::cache::SharedCache;
use maritime_route_optimizer::config::Config;
use maritime_route_optimizer::db::SurrealPortStore;
use maritime_route_optimizer::grpc::route_optimizer_server;
use maritime_route_optimizer::planner::Planner;
use maritime_route_optimizer::ports::PortStore;
use maritime_route_optimizer::telemetry::{self, HealthState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting maritime route optimizer");

    let config = Config::from_env()?;
    info!(grpc_port = config.grpc_port, metrics_port = config.metrics_port, "configuration loaded");

    let port_store: Arc<dyn PortStore> = Arc::new(SurrealPortStore::connect(&config).await?);

    let shared_cache: Option<Arc<dyn SharedCache>> = match RedisSharedCache::connect(&config.redis_url()).await {
        Ok(cache) => {
            info!("connected to Dragonfly/Redis shared cache");
            Some(Arc::new(cache))
        }
        Err(e) => {
            tracing::warn!(error = %e, "shared cache unavailable, running with in-process cache only");
            None
        }
    };

    let planner = Arc::new(Planner::new(port_store, shared_cache, config.clone()));

    let health = Arc::new(HealthState::default());

    match planner.reload_graph().await {
        Ok(()) => {
            health.graph_loaded.store(true, std::sync::atomic::Ordering::Relaxed);
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to load route graph on startup, starting with an empty graph");
        }
    }

    let reload_planner = Arc::clone(&planner);
    let reload_health = Arc::clone(&health);
    let reload_interval_secs = config.graph_reload_interval_secs;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(reload_interval_secs));
        loop {
            interval.tick().await;
            match reload_planner.reload_graph().await {
                Ok(()) => reload_health.graph_loaded.store(true, std::sync::atomic::Ordering::Relaxed),
                Err(e) => tracing::warn!(error = %e, "background graph reload failed"),
            }
        }
    });

    let metrics_port = config.metrics_port;
    let metrics_health = Arc::clone(&health);
    tokio::spawn(async move {
        let app = telemetry::router(metrics_health);
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{metrics_port}"))
            .await
            .expect("failed to bind metrics listener");
        info!(port = metrics_port, "metrics server listening");
        axum::serve(listener, app).await.expect("metrics server crashed");
    });

    let addr = format!("0.0.0.0:{}", config.grpc_port).parse()?;
    info!(%addr, "gRPC server listening");

    tonic::transport::Server::builder()
        .add_service(route_optimizer_server(planner))
        .serve(addr)
        .await?;

    Ok(())
}
