//! Metrics and health endpoints.
//!
//! Ported near-verbatim from the teacher's `metrics_handler` /
//! `health_handler` pair and the axum router they were mounted on in
//! `main`, plus the Prometheus counters/histograms the planner and
//! cache layer update as they run.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use once_cell::sync::Lazy;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub static ROUTE_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("route_requests_total", "Total route planning requests by outcome"),
        &["outcome"],
    )
    .expect("metric registration is infallible for a well-formed Opts");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("metric registration is infallible once per process");
    counter
});

pub static ROUTE_CACHE_HITS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new("route_cache_hits_total", "Route cache hits across both tiers")
        .expect("metric registration is infallible for a well-formed Opts");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("metric registration is infallible once per process");
    counter
});

pub static ROUTE_CALCULATION_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    let histogram = Histogram::with_opts(HistogramOpts::new(
        "route_calculation_duration_seconds",
        "End-to-end route calculation latency",
    ))
    .expect("metric registration is infallible for a well-formed Opts");
    REGISTRY
        .register(Box::new(histogram.clone()))
        .expect("metric registration is infallible once per process");
    histogram
});

/// Health state consulted by `/health`. A shallow liveness check by
/// design: it reports whether the service can serve, not whether every
/// downstream dependency is currently reachable.
pub struct HealthState {
    pub graph_loaded: std::sync::atomic::AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        HealthState { graph_loaded: std::sync::atomic::AtomicBool::new(false) }
    }
}

pub fn router(health: Arc<HealthState>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(move || health_handler(health.clone())))
}

async fn metrics_handler() -> String {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("encoding gathered metrics cannot fail");
    String::from_utf8(buffer).expect("Prometheus text encoding is always valid UTF-8")
}

async fn health_handler(health: Arc<HealthState>) -> &'static str {
    if health.graph_loaded.load(std::sync::atomic::Ordering::Relaxed) {
        "OK"
    } else {
        "LOADING"
    }
}
