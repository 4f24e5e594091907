//! SurrealDB-backed `PortStore`.
//!
//! Ported from `load_graph_from_surrealdb`: same connect/signin/use_ns
//! pattern, generalized from loading a whole transport graph to serving
//! individual port queries (`port_intelligence.py`'s `search_ports` /
//! `find_nearby_ports` / `get_port_by_code` / `get_port_statistics`,
//! reimplemented here as `PortStore` methods backed by SurrealDB
//! queries instead of raw SQL).

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use serde::Deserialize;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{PlannerError, PlannerResult};
use crate::model::{Coordinates, Port, PortOperationalStatus, PortType, VesselConstraints};
use crate::ports::{filter_nearby, rank_port_matches, PortMatch, PortStatistics, PortStore};

/// Runs `op` once, and if it fails, once more before surfacing the
/// error. A single SurrealDB hiccup (a dropped connection, a transient
/// timeout) shouldn't fail a route request outright.
async fn retry_once<T, F, Fut>(op: F) -> PlannerResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = PlannerResult<T>>,
{
    match op().await {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(error = %e, "port store operation failed, retrying once");
            op().await
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    coordinates: (f64, f64), // (lon, lat)
}

#[derive(Debug, Deserialize)]
struct RawPort {
    unlocode: String,
    name: String,
    country: String,
    location: RawLocation,
    port_type: String,
    operational_status: String,
    max_vessel_length_meters: Option<f64>,
    max_vessel_beam_meters: Option<f64>,
    max_draft_meters: Option<f64>,
    facilities: Option<HashMap<String, serde_json::Value>>,
    berth_count: Option<u32>,
}

fn parse_port_type(s: &str) -> PortType {
    match s.to_lowercase().as_str() {
        "container_terminal" => PortType::ContainerTerminal,
        "bulk_terminal" => PortType::BulkTerminal,
        "tanker_terminal" => PortType::TankerTerminal,
        "general_cargo" => PortType::GeneralCargo,
        "passenger" => PortType::Passenger,
        "fishing" => PortType::Fishing,
        _ => PortType::Multipurpose,
    }
}

fn parse_operational_status(s: &str) -> PortOperationalStatus {
    match s.to_lowercase().as_str() {
        "restricted" => PortOperationalStatus::Restricted,
        "maintenance" => PortOperationalStatus::Maintenance,
        "inactive" => PortOperationalStatus::Inactive,
        _ => PortOperationalStatus::Active,
    }
}

impl From<RawPort> for Port {
    fn from(raw: RawPort) -> Self {
        let (lon, lat) = raw.location.coordinates;
        Port {
            unlocode: raw.unlocode,
            name: raw.name,
            country: raw.country,
            coordinates: Coordinates { latitude: lat, longitude: lon },
            port_type: parse_port_type(&raw.port_type),
            operational_status: parse_operational_status(&raw.operational_status),
            max_vessel_length_meters: raw.max_vessel_length_meters,
            max_vessel_beam_meters: raw.max_vessel_beam_meters,
            max_draft_meters: raw.max_draft_meters,
            facilities: raw.facilities.unwrap_or_default(),
            berth_count: raw.berth_count.unwrap_or(0),
        }
    }
}

pub struct SurrealPortStore {
    db: Surreal<Client>,
}

impl SurrealPortStore {
    pub async fn connect(config: &Config) -> PlannerResult<Self> {
        let db = Surreal::new::<Ws>(&config.surrealdb_url)
            .await
            .map_err(|e| PlannerError::UpstreamFailure(format!("failed to connect to SurrealDB: {e}")))?;

        db.signin(Root { username: &config.surrealdb_user, password: &config.surrealdb_pass })
            .await
            .map_err(|e| PlannerError::UpstreamFailure(format!("failed to authenticate with SurrealDB: {e}")))?;

        db.use_ns("maritime_routing")
            .use_db("production")
            .await
            .map_err(|e| PlannerError::UpstreamFailure(format!("failed to select namespace: {e}")))?;

        info!("Connected to SurrealDB port store");
        Ok(SurrealPortStore { db })
    }

    async fn query_ports_once(&self, query: &str) -> PlannerResult<Vec<Port>> {
        let raw: Vec<RawPort> = self
            .db
            .query(query)
            .await
            .map_err(|e| PlannerError::UpstreamFailure(format!("SurrealDB query failed: {e}")))?
            .take(0)
            .map_err(|e| PlannerError::UpstreamFailure(format!("SurrealDB decode failed: {e}")))?;
        Ok(raw.into_iter().map(Port::from).collect())
    }

    async fn query_ports(&self, query: &str) -> PlannerResult<Vec<Port>> {
        retry_once(|| self.query_ports_once(query)).await
    }
}

#[async_trait]
impl PortStore for SurrealPortStore {
    async fn get_port(&self, unlocode: &str) -> PlannerResult<Option<Port>> {
        retry_once(|| async {
            let raw: Option<RawPort> = self
                .db
                .select(("port", unlocode))
                .await
                .map_err(|e| PlannerError::UpstreamFailure(format!("SurrealDB select failed: {e}")))?;
            Ok(raw.map(Port::from))
        })
        .await
    }

    async fn search_ports(
        &self,
        query: &str,
        limit: usize,
        country: Option<&str>,
        vessel: Option<&VesselConstraints>,
        include_inactive: bool,
    ) -> PlannerResult<Vec<PortMatch>> {
        let sql = if include_inactive { "SELECT * FROM port" } else { "SELECT * FROM port WHERE operational_status = 'active'" };
        let candidates = self.query_ports(sql).await?;
        Ok(rank_port_matches(query, candidates, limit, country, vessel, include_inactive))
    }

    async fn nearby_ports(
        &self,
        coordinates: Coordinates,
        radius_nm: f64,
        limit: usize,
        vessel: Option<&VesselConstraints>,
    ) -> PlannerResult<Vec<(Port, f64)>> {
        let candidates = self.query_ports("SELECT * FROM port WHERE operational_status = 'active'").await?;
        Ok(filter_nearby(coordinates, candidates, radius_nm, limit, vessel))
    }

    async fn all_active_ports(&self) -> PlannerResult<Vec<Port>> {
        self.query_ports("SELECT * FROM port WHERE operational_status = 'active'").await
    }

    async fn statistics(&self) -> PlannerResult<PortStatistics> {
        let all_ports = self.query_ports("SELECT * FROM port").await?;

        let mut stats = PortStatistics {
            total_ports: all_ports.len() as u32,
            ..Default::default()
        };

        for port in &all_ports {
            if port.is_active() {
                stats.active_ports += 1;
            }
            *stats.by_country.entry(port.country.clone()).or_insert(0) += 1;
            *stats.by_type.entry(port.port_type).or_insert(0) += 1;
        }

        Ok(stats)
    }
}
