//! Runtime configuration.
//!
//! Ported from the teacher's `Config::from_env` (plain `std::env::var`
//! reads behind `.env` via `dotenvy`), generalized with the `config`
//! crate's layered `Environment` source so values can also come from a
//! config file, and extended with every planner-specific knob the route
//! search, cost model, and cache layer need.

use anyhow::{Context, Result};

/// All tunables the planner, pathfinder, and cache layer read at
/// startup. Everything has a sane default so the service runs
/// out-of-the-box against a local SurrealDB/Dragonfly instance.
#[derive(Debug, Clone)]
pub struct Config {
    pub grpc_port: u16,
    pub metrics_port: u16,

    pub surrealdb_url: String,
    pub surrealdb_user: String,
    pub surrealdb_pass: String,

    pub dragonfly_url: String,
    pub dragonfly_pass: Option<String>,

    pub graph_reload_interval_secs: u64,

    /// Ports farther apart than this never get a direct graph edge.
    pub max_edge_distance_nm: f64,
    /// Upper bound on alternative routes a single request may ask for.
    pub max_alternatives: u32,
    /// Hard ceiling on how long a single route calculation may run.
    pub route_calculation_timeout_seconds: u64,
    /// Capacity of the in-process route LRU (entry count, not bytes).
    pub route_cache_capacity: usize,
    /// TTL for cached route calculations, seconds.
    pub route_ttl_seconds: u64,
    /// TTL for cached port lookups, seconds.
    pub port_ttl_seconds: u64,
    /// A direct path is accepted over a graph search only if it is
    /// within this multiple of the vessel's maximum range.
    pub direct_safety_margin: f64,
    /// Hub-stitched paths are only accepted within this multiple of the
    /// direct great-circle-constrained shortest path.
    pub hub_detour_cap: f64,
    /// Multiplier applied to an edge's weight once it has appeared in a
    /// previously returned alternative, so the next search prefers a
    /// different path without forbidding the edge outright.
    pub penalty_factor: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            grpc_port: 50051,
            metrics_port: 8090,
            surrealdb_url: "ws://localhost:8000".to_string(),
            surrealdb_user: "root".to_string(),
            surrealdb_pass: "maritime_dev_password".to_string(),
            dragonfly_url: "redis://localhost:6379".to_string(),
            dragonfly_pass: None,
            graph_reload_interval_secs: 300,
            max_edge_distance_nm: crate::graph::DEFAULT_MAX_EDGE_DISTANCE_NM,
            max_alternatives: 5,
            route_calculation_timeout_seconds: 30,
            route_cache_capacity: 10_000,
            route_ttl_seconds: crate::cache::ROUTE_TTL_SECONDS,
            port_ttl_seconds: crate::cache::PORT_TTL_SECONDS,
            direct_safety_margin: 0.9,
            hub_detour_cap: 1.2,
            penalty_factor: crate::pathfinder::DEFAULT_PENALTY_FACTOR,
        }
    }
}

impl Config {
    /// Loads configuration from `.env` (if present) and the process
    /// environment, falling back to `Config::default()` for anything
    /// unset.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        let settings = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()
            .context("failed to assemble configuration sources")?;

        Ok(Config {
            grpc_port: settings.get("grpc_port").unwrap_or(defaults.grpc_port),
            metrics_port: settings.get("metrics_port").unwrap_or(defaults.metrics_port),
            surrealdb_url: settings.get("surrealdb_url").unwrap_or(defaults.surrealdb_url),
            surrealdb_user: settings.get("surrealdb_user").unwrap_or(defaults.surrealdb_user),
            surrealdb_pass: settings.get("surrealdb_pass").unwrap_or(defaults.surrealdb_pass),
            dragonfly_url: settings.get("dragonfly_url").unwrap_or(defaults.dragonfly_url),
            dragonfly_pass: settings.get("dragonfly_pass").ok(),
            graph_reload_interval_secs: settings
                .get("graph_reload_interval_secs")
                .unwrap_or(defaults.graph_reload_interval_secs),
            max_edge_distance_nm: settings
                .get("max_edge_distance_nm")
                .unwrap_or(defaults.max_edge_distance_nm),
            max_alternatives: settings.get("max_alternatives").unwrap_or(defaults.max_alternatives),
            route_calculation_timeout_seconds: settings
                .get("route_calculation_timeout_seconds")
                .unwrap_or(defaults.route_calculation_timeout_seconds),
            route_cache_capacity: settings
                .get("route_cache_capacity")
                .unwrap_or(defaults.route_cache_capacity),
            route_ttl_seconds: settings.get("route_ttl_seconds").unwrap_or(defaults.route_ttl_seconds),
            port_ttl_seconds: settings.get("port_ttl_seconds").unwrap_or(defaults.port_ttl_seconds),
            direct_safety_margin: settings
                .get("direct_safety_margin")
                .unwrap_or(defaults.direct_safety_margin),
            hub_detour_cap: settings.get("hub_detour_cap").unwrap_or(defaults.hub_detour_cap),
            penalty_factor: settings.get("penalty_factor").unwrap_or(defaults.penalty_factor),
        })
    }

    /// Builds the effective Redis URL, embedding `dragonfly_pass` if set,
    /// matching the teacher's inline credential-splicing.
    pub fn redis_url(&self) -> String {
        match &self.dragonfly_pass {
            Some(pass) => format!(
                "redis://:{}@{}",
                pass,
                self.dragonfly_url.trim_start_matches("redis://")
            ),
            None => self.dragonfly_url.clone(),
        }
    }
}
