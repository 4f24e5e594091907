//! End-to-end planner tests against an in-memory `PortStore` fixture.
//!
//! No SurrealDB/Redis needed: these exercise `Planner::plan_route` through
//! validation, graph construction, candidate generation, and ranking.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};

use maritime_route_optimizer::config::Config;
use maritime_route_optimizer::error::{PlannerError, PlannerResult};
use maritime_route_optimizer::model::{
    Coordinates, OptimizationCriterion, Port, PortOperationalStatus, PortType, RouteRequest,
    VesselConstraints, VesselType,
};
use maritime_route_optimizer::planner::Planner;
use maritime_route_optimizer::ports::{PortMatch, PortStatistics, PortStore};

struct FixturePortStore {
    ports: Vec<Port>,
}

impl FixturePortStore {
    fn new(ports: Vec<Port>) -> Self {
        FixturePortStore { ports }
    }
}

#[async_trait]
impl PortStore for FixturePortStore {
    async fn get_port(&self, unlocode: &str) -> PlannerResult<Option<Port>> {
        Ok(self.ports.iter().find(|p| p.unlocode == unlocode).cloned())
    }

    async fn search_ports(
        &self,
        _query: &str,
        _limit: usize,
        _country: Option<&str>,
        _vessel: Option<&VesselConstraints>,
        _include_inactive: bool,
    ) -> PlannerResult<Vec<PortMatch>> {
        Ok(Vec::new())
    }

    async fn nearby_ports(
        &self,
        _coordinates: Coordinates,
        _radius_nm: f64,
        _limit: usize,
        _vessel: Option<&VesselConstraints>,
    ) -> PlannerResult<Vec<(Port, f64)>> {
        Ok(Vec::new())
    }

    async fn all_active_ports(&self) -> PlannerResult<Vec<Port>> {
        Ok(self.ports.iter().filter(|p| p.is_active()).cloned().collect())
    }

    async fn statistics(&self) -> PlannerResult<PortStatistics> {
        Ok(PortStatistics::default())
    }
}

fn port(code: &str, lat: f64, lon: f64) -> Port {
    Port {
        unlocode: code.to_string(),
        name: code.to_string(),
        country: "XX".to_string(),
        coordinates: Coordinates { latitude: lat, longitude: lon },
        port_type: PortType::Multipurpose,
        operational_status: PortOperationalStatus::Active,
        max_vessel_length_meters: None,
        max_vessel_beam_meters: None,
        max_draft_meters: None,
        facilities: HashMap::new(),
        berth_count: 1,
    }
}

fn vessel(max_range_nautical_miles: f64) -> VesselConstraints {
    VesselConstraints {
        vessel_type: VesselType::Container,
        length_meters: 300.0,
        beam_meters: 45.0,
        draft_meters: 14.0,
        cruise_speed_knots: 18.0,
        deadweight_tonnage: Some(80_000),
        gross_tonnage: None,
        max_range_nautical_miles,
        suez_compatible: true,
        panama_compatible: true,
    }
}

fn base_request(origin: &str, destination: &str, vessel: VesselConstraints) -> RouteRequest {
    RouteRequest {
        origin_unlocode: origin.to_string(),
        destination_unlocode: destination.to_string(),
        vessel,
        criterion: OptimizationCriterion::Balanced,
        departure_time: Utc::now() + ChronoDuration::days(1),
        include_alternatives: false,
        max_alternatives: 3,
        max_connecting_ports: 0,
        timeout_seconds: 30,
    }
}

async fn planner_with(ports: Vec<Port>, config: Config) -> Planner {
    let store: Arc<dyn PortStore> = Arc::new(FixturePortStore::new(ports));
    let planner = Planner::new(store, None, config);
    planner.reload_graph().await.expect("graph should reload from fixture");
    planner
}

#[tokio::test]
async fn same_port_request_is_rejected_before_touching_the_store() {
    let ports = vec![port("SGSIN", 1.2655, 103.8201)];
    let planner = planner_with(ports, Config::default()).await;

    let request = base_request("SGSIN", "SGSIN", vessel(10_000.0));
    let result = planner.plan_route(request).await;

    assert!(matches!(result, Err(PlannerError::Validation(_))));
}

#[tokio::test]
async fn direct_route_within_range_is_a_single_segment_and_caches() {
    let ports = vec![
        port("SGSIN", 1.2655, 103.8201),
        port("NLRTM", 51.9496, 4.1453),
    ];
    let planner = planner_with(ports, Config::default()).await;

    let mut request = base_request("SGSIN", "NLRTM", vessel(10_000.0));
    request.max_connecting_ports = 0;

    let first = planner.plan_route(request.clone()).await.unwrap();
    assert_eq!(first.primary_route.segments.len(), 1);
    assert!(first.primary_route.intermediate_unlocodes.is_empty());
    assert!((first.primary_route.total_distance_nm - first.primary_route.segments[0].distance_nm).abs() < 0.01);
    assert_eq!(first.primary_route.algorithm_used, "hybrid");
    assert!(!first.cache_hit);

    let second = planner.plan_route(request).await.unwrap();
    assert!(second.cache_hit);
}

#[tokio::test]
async fn out_of_range_direct_forces_a_hub_mediated_route() {
    let ports = vec![
        port("SGSIN", 1.2655, 103.8201),
        port("NLRTM", 51.9496, 4.1453),
        port("AEJEA", 25.0657, 55.1364), // a MAJOR_HUBS member, plausibly on the way
    ];
    let planner = planner_with(ports, Config::default()).await;

    let mut request = base_request("SGSIN", "NLRTM", vessel(4_000.0));
    request.max_connecting_ports = 1;

    let result = planner.plan_route(request).await.unwrap();

    assert!(!result.primary_route.intermediate_unlocodes.is_empty());
    for segment in &result.primary_route.segments {
        assert!(segment.distance_nm <= 4_000.0);
    }
}

#[tokio::test]
async fn unreachable_pair_surfaces_no_route() {
    let ports = vec![
        port("AAAAA", 0.0, 0.0),
        port("BBBBB", 10.0, 60.0), // far beyond a 200nm edge cap, no hub present
    ];
    let mut config = Config::default();
    config.max_edge_distance_nm = 200.0;
    let planner = planner_with(ports, config).await;

    let mut request = base_request("AAAAA", "BBBBB", vessel(150.0));
    request.max_connecting_ports = 0;

    let result = planner.plan_route(request).await;
    assert!(matches!(result, Err(PlannerError::NoRoute { .. })));
}

#[tokio::test]
async fn maintenance_destination_is_reported_as_port_not_found() {
    let mut destination = port("NLRTM", 51.9496, 4.1453);
    destination.operational_status = PortOperationalStatus::Maintenance;
    let ports = vec![port("SGSIN", 1.2655, 103.8201), destination];

    let planner = planner_with(ports, Config::default()).await;
    let request = base_request("SGSIN", "NLRTM", vessel(10_000.0));

    let result = planner.plan_route(request).await;
    assert!(matches!(result, Err(PlannerError::PortNotFound(_))));
}

#[tokio::test]
async fn multiple_candidates_are_all_labeled_with_the_request_criterion() {
    // With connections and alternatives both enabled, the planner should
    // produce more than one candidate and rank every one of them under the
    // same criterion (the literal swap-in-ordering invariant is checked
    // directly against `sort_routes_by_criterion` in `planner`'s own unit
    // tests, where the inputs can be pinned exactly).
    let ports = vec![
        port("SGSIN", 1.2655, 103.8201),
        port("NLRTM", 51.9496, 4.1453),
        port("AEJEA", 25.0657, 55.1364),
    ];
    let planner = planner_with(ports, Config::default()).await;

    let mut request = base_request("SGSIN", "NLRTM", vessel(10_000.0));
    request.criterion = OptimizationCriterion::MostEconomical;
    request.include_alternatives = true;
    request.max_connecting_ports = 2;
    request.max_alternatives = 3;

    let response = planner.plan_route(request).await.unwrap();
    assert_eq!(response.primary_route.criterion, OptimizationCriterion::MostEconomical);
    for alt in &response.alternative_routes {
        assert_eq!(alt.criterion, OptimizationCriterion::MostEconomical);
    }
}

#[tokio::test]
async fn vessel_too_large_for_origin_port_is_rejected_even_via_a_hub() {
    // A vessel whose beam exceeds the origin port's berth limit can't sail
    // from it at all, regardless of which candidate tier would otherwise
    // stitch together a viable path through a hub.
    let mut origin = port("SGSIN", 1.2655, 103.8201);
    origin.max_vessel_beam_meters = Some(10.0);
    let ports = vec![origin, port("NLRTM", 51.9496, 4.1453), port("AEJEA", 25.0657, 55.1364)];
    let planner = planner_with(ports, Config::default()).await;

    let mut request = base_request("SGSIN", "NLRTM", vessel(4_000.0));
    request.max_connecting_ports = 2;
    request.include_alternatives = true;
    request.max_alternatives = 3;

    let result = planner.plan_route(request).await;
    assert!(matches!(result, Err(PlannerError::NoRoute { .. })));
}
