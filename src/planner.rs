//! Route planning orchestrator.
//!
//! Ties `ports`, `graph`, `pathfinder`, `routing`, and `cache` together
//! into the single entrypoint the gRPC layer calls. Generalizes the
//! teacher's `AppState`-holds-a-graph-behind-an-RwLock pattern (see
//! `main.rs`) to also hold a port store and two cache tiers, and adds
//! the at-most-once single-flight dedupe and timeout enforcement the
//! original service's route planner left to its caller.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rayon::prelude::*;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::cache::{compress, decompress, route_fingerprint, RouteCache, SharedCache, SingleFlightGroup};
use crate::config::Config;
use crate::cost::VoyageFactors;
use crate::error::{PlannerError, PlannerResult};
use crate::geo::great_circle_distance_nm;
use crate::graph::RouteGraph;
use crate::model::{DetailedRoute, OptimizationCriterion, Port, RouteRequest, RouteResponse};
use crate::pathfinder::{hub_mediated_candidates, k_alternative_paths, PathResult};
use crate::ports::{PortMatch, PortStore};
use crate::routing::{direct_leg_canal_feasible, materialize_route};

/// Maps a request's optimization criterion to the label recorded on its
/// materialized routes. Every candidate generated for a given request
/// carries the same label: it names the strategy associated with the
/// criterion, not the specific search that happened to produce that
/// candidate's port sequence.
fn algorithm_label(criterion: OptimizationCriterion) -> &'static str {
    match criterion {
        OptimizationCriterion::Fastest => "a_star",
        OptimizationCriterion::MostEconomical => "dijkstra",
        OptimizationCriterion::MostReliable => "maritime_custom",
        OptimizationCriterion::Balanced => "hybrid",
        OptimizationCriterion::Environmental => "dijkstra",
    }
}

/// An immutable snapshot of the routable network: the graph plus the
/// port records it was built from, swapped atomically on reload.
struct GraphSnapshot {
    graph: RouteGraph,
    ports: HashMap<String, Port>,
}

impl GraphSnapshot {
    fn empty() -> Self {
        GraphSnapshot { graph: RouteGraph::build(&[], 0.0), ports: HashMap::new() }
    }
}

pub struct Planner {
    port_store: Arc<dyn PortStore>,
    shared_cache: Option<Arc<dyn SharedCache>>,
    route_cache: RouteCache,
    snapshot: RwLock<GraphSnapshot>,
    single_flight: SingleFlightGroup<PlannerResult<RouteResponse>>,
    candidates_evaluated: AtomicUsize,
    config: Config,
}

/// Orders candidate routes best-first per the request's criterion
/// (specification §4.5 step 7): the primary route is whichever sorts
/// first, alternatives follow in the same order.
fn sort_routes_by_criterion(routes: &mut [DetailedRoute], criterion: OptimizationCriterion) {
    match criterion {
        OptimizationCriterion::Fastest => {
            routes.sort_by(|a, b| a.total_transit_hours.partial_cmp(&b.total_transit_hours).unwrap())
        }
        OptimizationCriterion::MostEconomical => {
            routes.sort_by(|a, b| a.total_cost_usd().cmp(&b.total_cost_usd()))
        }
        OptimizationCriterion::MostReliable => {
            routes.sort_by(|a, b| b.reliability_score.partial_cmp(&a.reliability_score).unwrap())
        }
        OptimizationCriterion::Environmental => routes.sort_by(|a, b| {
            a.environmental_impact_score
                .partial_cmp(&b.environmental_impact_score)
                .unwrap()
        }),
        OptimizationCriterion::Balanced => {
            routes.sort_by(|a, b| b.overall_score.partial_cmp(&a.overall_score).unwrap())
        }
    }
}

impl Planner {
    pub fn new(port_store: Arc<dyn PortStore>, shared_cache: Option<Arc<dyn SharedCache>>, config: Config) -> Self {
        let route_cache = RouteCache::new(config.route_cache_capacity);
        Planner {
            port_store,
            shared_cache,
            route_cache,
            snapshot: RwLock::new(GraphSnapshot::empty()),
            single_flight: SingleFlightGroup::new(),
            candidates_evaluated: AtomicUsize::new(0),
            config,
        }
    }

    /// Rebuilds the graph snapshot from the port store's current active
    /// ports. Intended to run once at startup and then on an interval,
    /// mirroring the teacher's background graph reload task.
    pub async fn reload_graph(&self) -> PlannerResult<()> {
        let ports = self.port_store.all_active_ports().await?;
        let graph = RouteGraph::build(&ports, self.config.max_edge_distance_nm);
        let ports_by_code = ports.into_iter().map(|p| (p.unlocode.clone(), p)).collect();

        let mut guard = self.snapshot.write().await;
        let node_count = graph.node_count();
        let edge_count = graph.edge_count();
        *guard = GraphSnapshot { graph, ports: ports_by_code };
        info!(nodes = node_count, edges = edge_count, "route graph reloaded");
        Ok(())
    }

    pub async fn graph_status(&self) -> (usize, usize) {
        let guard = self.snapshot.read().await;
        (guard.graph.node_count(), guard.graph.edge_count())
    }

    pub async fn search_ports(
        &self,
        query: &str,
        limit: usize,
        country: Option<&str>,
        vessel: Option<&crate::model::VesselConstraints>,
        include_inactive: bool,
    ) -> PlannerResult<Vec<PortMatch>> {
        self.port_store.search_ports(query, limit, country, vessel, include_inactive).await
    }

    /// Plans a route end to end: validate, resolve, check both cache
    /// tiers, compute on a miss (deduplicated via single-flight and
    /// bounded by the request's timeout), then populate both tiers.
    pub async fn plan_route(&self, request: RouteRequest) -> PlannerResult<RouteResponse> {
        let now = Utc::now();
        request.validate(now)?;

        {
            let guard = self.snapshot.read().await;
            self.require_active_port(&guard, &request.origin_unlocode)?;
            self.require_active_port(&guard, &request.destination_unlocode)?;
        }

        let fingerprint = route_fingerprint(&request)?;

        if let Some(cached) = self.route_cache.get(&fingerprint) {
            crate::telemetry::ROUTE_CACHE_HITS_TOTAL.inc();
            return Ok(RouteResponse { cache_hit: true, ..cached });
        }

        if let Some(shared) = &self.shared_cache {
            if let Some(bytes) = shared.get(&fingerprint).await.unwrap_or(None) {
                if let Ok(decompressed) = decompress(&bytes) {
                    if let Ok(response) = serde_json::from_slice::<RouteResponse>(&decompressed) {
                        crate::telemetry::ROUTE_CACHE_HITS_TOTAL.inc();
                        self.route_cache.put(
                            fingerprint.clone(),
                            response.clone(),
                            Duration::from_secs(self.config.route_ttl_seconds),
                        );
                        return Ok(RouteResponse { cache_hit: true, ..response });
                    }
                }
            }
        }

        let timeout_seconds = request.timeout_seconds.min(self.config.route_calculation_timeout_seconds);

        let result = self
            .single_flight
            .execute(&fingerprint, move || async move {
                tokio::time::timeout(
                    Duration::from_secs(timeout_seconds),
                    self.compute_route(request, now),
                )
                .await
                .unwrap_or(Err(PlannerError::CalculationTimeout(timeout_seconds)))
            })
            .await;

        if let Ok(response) = &result {
            self.route_cache.put(
                fingerprint.clone(),
                response.clone(),
                Duration::from_secs(self.config.route_ttl_seconds),
            );

            if let Some(shared) = &self.shared_cache {
                if let Ok(encoded) = serde_json::to_vec(response) {
                    let compressed = compress(&encoded);
                    if let Err(e) = shared.set(&fingerprint, &compressed, self.config.route_ttl_seconds).await {
                        warn!(error = %e, "failed to populate shared route cache");
                    }
                }
            }

            crate::telemetry::ROUTE_REQUESTS_TOTAL.with_label_values(&["ok"]).inc();
        } else {
            crate::telemetry::ROUTE_REQUESTS_TOTAL.with_label_values(&["error"]).inc();
        }

        result
    }

    /// A port that exists in the store but isn't `active` (restricted,
    /// maintenance, inactive) is treated the same as an unknown port: both
    /// surface as `PortNotFound` to the caller, since neither is usable as
    /// a routing endpoint.
    fn require_active_port(&self, snapshot: &GraphSnapshot, unlocode: &str) -> PlannerResult<()> {
        match snapshot.ports.get(unlocode) {
            Some(port) if port.is_active() => Ok(()),
            _ => Err(PlannerError::PortNotFound(unlocode.to_string())),
        }
    }

    async fn compute_route(&self, request: RouteRequest, now: chrono::DateTime<Utc>) -> PlannerResult<RouteResponse> {
        let start = std::time::Instant::now();

        let timer = crate::telemetry::ROUTE_CALCULATION_DURATION_SECONDS.start_timer();
        let response = self.compute_route_inner(&request, now).await;
        timer.observe_duration();

        response.map(|mut r| {
            r.calculation_duration_ms = start.elapsed().as_secs_f64() * 1000.0;
            r
        })
    }

    async fn compute_route_inner(&self, request: &RouteRequest, now: chrono::DateTime<Utc>) -> PlannerResult<RouteResponse> {
        let guard = self.snapshot.read().await;

        let factors = VoyageFactors::default();

        let origin_port = guard
            .ports
            .get(&request.origin_unlocode)
            .ok_or_else(|| PlannerError::PortNotFound(request.origin_unlocode.clone()))?;
        let destination_port = guard
            .ports
            .get(&request.destination_unlocode)
            .ok_or_else(|| PlannerError::PortNotFound(request.destination_unlocode.clone()))?;
        let direct_distance_nm =
            great_circle_distance_nm(origin_port.coordinates, destination_port.coordinates);

        // Candidate generation has exactly three gated tiers: a direct
        // great-circle leg when it fits within the vessel's range margin,
        // hub-mediated stitches when connections are allowed, and
        // k-alternative paths once 2+ connecting ports are allowed. There
        // is no further fallback search — if every tier is gated off or
        // comes up empty, the request has no viable route.
        let mut candidate_paths: Vec<PathResult> = Vec::new();

        // Destination-port compatibility is checked per edge inside
        // `pathfinder` (every tier's last hop lands on `destination_port`
        // through `edge_is_feasible`), but the origin port never appears as
        // an edge destination anywhere in the graph search, so it's checked
        // once here and gates every tier, not just the direct one.
        let origin_port_compatible = origin_port.is_compatible_with_vessel(
            request.vessel.length_meters,
            request.vessel.beam_meters,
            request.vessel.draft_meters,
        );
        let destination_port_compatible = destination_port.is_compatible_with_vessel(
            request.vessel.length_meters,
            request.vessel.beam_meters,
            request.vessel.draft_meters,
        );

        if origin_port_compatible {
            if direct_distance_nm > 0.0
                && direct_distance_nm <= self.config.direct_safety_margin * request.vessel.max_range_nautical_miles
                && destination_port_compatible
                && direct_leg_canal_feasible(origin_port.coordinates, destination_port.coordinates, &request.vessel)
            {
                candidate_paths.push(PathResult {
                    ports: vec![request.origin_unlocode.clone(), request.destination_unlocode.clone()],
                    total_distance_nm: direct_distance_nm,
                });
            }

            if request.max_connecting_ports >= 1 {
                let hub_candidates = hub_mediated_candidates(
                    &guard.graph,
                    &guard.ports,
                    &request.origin_unlocode,
                    &request.destination_unlocode,
                    &request.vessel,
                    direct_distance_nm,
                    5,
                );
                candidate_paths.extend(hub_candidates);
            }

            if request.include_alternatives && request.max_connecting_ports >= 2 && request.max_alternatives > 0 {
                let alternatives = k_alternative_paths(
                    &guard.graph,
                    &guard.ports,
                    &request.origin_unlocode,
                    &request.destination_unlocode,
                    &request.vessel,
                    request.max_alternatives as usize,
                    self.config.penalty_factor,
                );
                candidate_paths.extend(alternatives);
            }
        }

        if candidate_paths.is_empty() {
            return Err(PlannerError::NoRoute {
                origin: request.origin_unlocode.clone(),
                destination: request.destination_unlocode.clone(),
            });
        }

        let mut seen_port_sequences = std::collections::HashSet::new();
        candidate_paths.retain(|path| seen_port_sequences.insert(path.ports.clone()));

        self.candidates_evaluated.fetch_add(candidate_paths.len(), Ordering::Relaxed);

        let algorithm = algorithm_label(request.criterion);

        // Each candidate's cost/score is independent of the others, so
        // materialization fans out across threads rather than running
        // one candidate at a time.
        let mut routes: Vec<DetailedRoute> = candidate_paths
            .par_iter()
            .enumerate()
            .filter_map(|(i, path)| {
                match materialize_route(&path.ports, &guard.ports, &request.vessel, request.criterion, factors, algorithm, i) {
                    Ok(route) => Some(route),
                    Err(e) => {
                        warn!(error = %e, "discarding infeasible candidate route");
                        None
                    }
                }
            })
            .collect();

        if routes.is_empty() {
            return Err(PlannerError::NoRoute {
                origin: request.origin_unlocode.clone(),
                destination: request.destination_unlocode.clone(),
            });
        }

        sort_routes_by_criterion(&mut routes, request.criterion);

        let primary_route = routes.remove(0);
        let alternative_routes: Vec<DetailedRoute> =
            routes.into_iter().take(request.max_alternatives as usize).collect();

        Ok(RouteResponse {
            request_id: uuid::Uuid::new_v4().to_string(),
            calculation_timestamp: now,
            calculation_duration_ms: 0.0,
            primary_route,
            alternative_routes,
            criterion: request.criterion,
            candidates_evaluated: self.candidates_evaluated.load(Ordering::Relaxed),
            cache_hit: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CostBreakdown;
    use rust_decimal::Decimal;

    fn route(id: &str, total_transit_hours: f64, total_cost: i64, reliability: f64, environmental: f64, overall: f64) -> DetailedRoute {
        DetailedRoute {
            route_id: id.to_string(),
            display_name: "A -> B".to_string(),
            origin_unlocode: "AAAAA".to_string(),
            destination_unlocode: "BBBBB".to_string(),
            intermediate_unlocodes: Vec::new(),
            segments: Vec::new(),
            total_distance_nm: 1000.0,
            total_transit_hours,
            total_fuel_tons: Decimal::new(100, 0),
            cost_breakdown: CostBreakdown {
                fuel_cost_usd: Decimal::new(total_cost, 0),
                port_fees_usd: Decimal::ZERO,
                canal_fees_usd: Decimal::ZERO,
            },
            efficiency_score: 80.0,
            reliability_score: reliability,
            environmental_impact_score: environmental,
            overall_score: overall,
            algorithm_used: "hybrid".to_string(),
            criterion: crate::model::OptimizationCriterion::Balanced,
        }
    }

    /// Specification scenario 6: two candidates where A is faster but
    /// costs more, and B is slower but cheaper. `fastest` must keep A
    /// primary; `most_economical` must swap B to primary.
    #[test]
    fn criterion_swap_changes_primary_and_alternative() {
        let a = route("a", 100.0, 50_000, 70.0, 40.0, 60.0);
        let b = route("b", 150.0, 30_000, 90.0, 20.0, 70.0);

        let mut fastest = vec![a.clone(), b.clone()];
        sort_routes_by_criterion(&mut fastest, OptimizationCriterion::Fastest);
        assert_eq!(fastest[0].route_id, a.route_id);
        assert_eq!(fastest[1].route_id, b.route_id);

        let mut economical = vec![a.clone(), b.clone()];
        sort_routes_by_criterion(&mut economical, OptimizationCriterion::MostEconomical);
        assert_eq!(economical[0].route_id, b.route_id);
        assert_eq!(economical[1].route_id, a.route_id);

        let mut reliable = vec![a.clone(), b.clone()];
        sort_routes_by_criterion(&mut reliable, OptimizationCriterion::MostReliable);
        assert_eq!(reliable[0].route_id, b.route_id);

        let mut environmental = vec![a, b.clone()];
        sort_routes_by_criterion(&mut environmental, OptimizationCriterion::Environmental);
        assert_eq!(environmental[0].route_id, b.route_id);
    }
}
