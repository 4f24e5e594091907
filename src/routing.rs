//! Route materializer.
//!
//! Turns an ordered sequence of port codes (as produced by `pathfinder`)
//! into a fully-costed `DetailedRoute`: per-segment distance, bearing,
//! waypoints, fuel, port fees, canal fees, and risk, then route-level
//! efficiency/reliability/environmental/overall scores from `cost`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::cost::{
    calculate_port_fees, environmental_impact_score, estimate_fuel_tons, estimate_transit_hours,
    fuel_cost_usd, overall_score, route_efficiency, route_reliability, VoyageFactors,
    DEFAULT_PORT_DWELL_HOURS,
};
use crate::error::{PlannerError, PlannerResult};
use crate::geo::{great_circle_distance_nm, initial_bearing_deg, intermediate_point};
use crate::model::{
    CostBreakdown, DetailedRoute, OptimizationCriterion, Port, RouteSegment, VesselConstraints,
    Waypoint,
};

/// Number of interior waypoints generated per segment for display/plotting.
const WAYPOINTS_PER_SEGMENT: usize = 3;

/// Time a vessel spends maneuvering into/out of a port, outside of open
/// water transit time.
const PORT_APPROACH_HOURS: f64 = 2.0;

/// Default weather-risk component applied to every segment, in [0, 100].
const DEFAULT_WEATHER_RISK: f64 = 10.0;
/// Default piracy-risk component applied to every segment, in [0, 100].
const DEFAULT_PIRACY_RISK: f64 = 5.0;
/// Default political-risk component applied to every segment, in [0, 100].
const DEFAULT_POLITICAL_RISK: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Canal {
    Suez,
    Panama,
}

impl Canal {
    pub fn label(&self) -> &'static str {
        match self {
            Canal::Suez => "suez",
            Canal::Panama => "panama",
        }
    }
}

/// Infers whether a segment transits a canal from the longitude of its
/// two endpoints alone (a Pacific-Atlantic crossing implies Panama, a
/// Europe-Asia crossing implies Suez). This is the specification's exact
/// heuristic: coarse, endpoint-only, no lane-accurate modeling. Actual
/// transit fees are not charged (no tariff table exists yet; see
/// DESIGN.md).
pub fn infer_canal_transit(origin: crate::model::Coordinates, destination: crate::model::Coordinates) -> Option<Canal> {
    let (a, b) = (origin.longitude, destination.longitude);

    if (a < -100.0 && b > -40.0) || (b < -100.0 && a > -40.0) {
        return Some(Canal::Panama);
    }

    if (a < 40.0 && b > 60.0) || (b < 40.0 && a > 60.0) {
        return Some(Canal::Suez);
    }

    None
}

/// Whether `vessel` may transit `canal`.
fn vessel_canal_compatible(vessel: &VesselConstraints, canal: Canal) -> bool {
    match canal {
        Canal::Suez => vessel.suez_compatible,
        Canal::Panama => vessel.panama_compatible,
    }
}

/// Whether a direct leg between `origin` and `destination` is feasible for
/// `vessel` with respect to canal transit alone: true if no canal is
/// inferred, or one is and the vessel is compatible with it.
pub fn direct_leg_canal_feasible(
    origin: crate::model::Coordinates,
    destination: crate::model::Coordinates,
    vessel: &VesselConstraints,
) -> bool {
    match infer_canal_transit(origin, destination) {
        Some(canal) => vessel_canal_compatible(vessel, canal),
        None => true,
    }
}

/// Builds a single costed segment between two adjacent ports.
fn build_segment(
    sequence: u32,
    origin: &Port,
    destination: &Port,
    vessel: &VesselConstraints,
    factors: VoyageFactors,
) -> PlannerResult<RouteSegment> {
    let distance_nm = great_circle_distance_nm(origin.coordinates, destination.coordinates);
    if distance_nm <= 0.0 {
        return Err(PlannerError::Validation(format!(
            "segment {} -> {} has non-positive distance",
            origin.unlocode, destination.unlocode
        )));
    }

    if let Some(canal) = infer_canal_transit(origin.coordinates, destination.coordinates) {
        if !vessel_canal_compatible(vessel, canal) {
            return Err(PlannerError::VesselConstraint(format!(
                "segment {} -> {} requires {} canal transit, vessel is not compatible",
                origin.unlocode,
                destination.unlocode,
                canal.label()
            )));
        }
    }

    let bearing_degrees = initial_bearing_deg(origin.coordinates, destination.coordinates);
    let transit_hours = estimate_transit_hours(distance_nm, vessel.cruise_speed_knots, factors)?;
    let fuel_tons = estimate_fuel_tons(distance_nm, vessel, factors)?;
    let fuel_cost = fuel_cost_usd(fuel_tons);
    let port_fees = calculate_port_fees(destination, vessel, DEFAULT_PORT_DWELL_HOURS, None)?;

    let canal_fees_usd = Decimal::ZERO; // no tariff table yet; see DESIGN.md

    let waypoints: Vec<Waypoint> = (1..=WAYPOINTS_PER_SEGMENT)
        .map(|i| {
            let f = i as f64 / (WAYPOINTS_PER_SEGMENT + 1) as f64;
            let point = intermediate_point(origin.coordinates, destination.coordinates, f);
            Waypoint { latitude: point.latitude, longitude: point.longitude }
        })
        .collect();

    Ok(RouteSegment {
        sequence,
        origin_unlocode: origin.unlocode.clone(),
        destination_unlocode: destination.unlocode.clone(),
        distance_nm,
        transit_hours,
        port_approach_hours: PORT_APPROACH_HOURS,
        fuel_tons,
        fuel_cost_usd: fuel_cost,
        port_fees_usd: port_fees,
        canal_fees_usd,
        bearing_degrees,
        waypoints,
        weather_risk: DEFAULT_WEATHER_RISK,
        piracy_risk: DEFAULT_PIRACY_RISK,
        political_risk: DEFAULT_POLITICAL_RISK,
    })
}

/// Materializes an ordered port-code path into a fully-costed route.
/// `algorithm_used` is a free-form label (the planner passes the name of
/// the pathfinding strategy associated with the request's optimization
/// criterion, e.g. `"hybrid"` for `balanced`) carried through for
/// diagnostics and echoed on the wire. `route_index` is this candidate's
/// 0-based rank among the request's other candidates, used only to number
/// `display_name`.
pub fn materialize_route(
    path: &[String],
    ports: &HashMap<String, Port>,
    vessel: &VesselConstraints,
    criterion: OptimizationCriterion,
    factors: VoyageFactors,
    algorithm_used: &str,
    route_index: usize,
) -> PlannerResult<DetailedRoute> {
    if path.len() < 2 {
        return Err(PlannerError::Validation(
            "a route requires at least an origin and a destination".into(),
        ));
    }

    let resolved: Vec<&Port> = path
        .iter()
        .map(|code| {
            ports
                .get(code)
                .ok_or_else(|| PlannerError::PortNotFound(code.clone()))
        })
        .collect::<PlannerResult<_>>()?;

    let mut segments = Vec::with_capacity(resolved.len() - 1);
    for (i, pair) in resolved.windows(2).enumerate() {
        let segment = build_segment(i as u32, pair[0], pair[1], vessel, factors)?;
        segments.push(segment);
    }

    let total_distance_nm: f64 = segments.iter().map(|s| s.distance_nm).sum();
    let total_transit_hours: f64 = segments
        .iter()
        .map(|s| s.transit_hours + s.port_approach_hours)
        .sum();
    let total_fuel_tons: Decimal = segments.iter().map(|s| s.fuel_tons).sum();

    let cost_breakdown = CostBreakdown {
        fuel_cost_usd: segments.iter().map(|s| s.fuel_cost_usd).sum(),
        port_fees_usd: segments.iter().map(|s| s.port_fees_usd).sum(),
        canal_fees_usd: segments.iter().map(|s| s.canal_fees_usd).sum(),
    };

    let mean_risk = segments.iter().map(|s| s.risk_score()).sum::<f64>() / segments.len() as f64;
    let reliability_score = route_reliability(mean_risk);

    let great_circle_nm = great_circle_distance_nm(
        resolved.first().unwrap().coordinates,
        resolved.last().unwrap().coordinates,
    );
    let efficiency_score = route_efficiency(great_circle_nm, total_distance_nm);
    let environmental_impact_score_value = environmental_impact_score(
        total_fuel_tons.to_f64().unwrap_or(0.0),
        total_distance_nm,
    );
    let overall = overall_score(
        efficiency_score,
        reliability_score,
        environmental_impact_score_value,
        criterion,
    );

    let intermediate_unlocodes: Vec<String> = path[1..path.len() - 1].to_vec();

    let display_name = if intermediate_unlocodes.is_empty() {
        format!("Route {}: {} → {}", route_index + 1, path.first().unwrap(), path.last().unwrap())
    } else {
        format!(
            "Route {}: {} → {} via {}",
            route_index + 1,
            path.first().unwrap(),
            path.last().unwrap(),
            intermediate_unlocodes.join(" → "),
        )
    };

    Ok(DetailedRoute {
        route_id: Uuid::new_v4().to_string(),
        display_name,
        origin_unlocode: path.first().unwrap().clone(),
        destination_unlocode: path.last().unwrap().clone(),
        intermediate_unlocodes,
        segments,
        total_distance_nm,
        total_transit_hours,
        total_fuel_tons,
        cost_breakdown,
        efficiency_score,
        reliability_score,
        environmental_impact_score: environmental_impact_score_value,
        overall_score: overall,
        algorithm_used: algorithm_used.to_string(),
        criterion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinates, PortOperationalStatus, PortType, VesselType};

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

    fn vessel() -> VesselConstraints {
        VesselConstraints {
            vessel_type: VesselType::Container,
            length_meters: 300.0,
            beam_meters: 45.0,
            draft_meters: 14.0,
            cruise_speed_knots: 18.0,
            deadweight_tonnage: Some(80_000),
            gross_tonnage: None,
            max_range_nautical_miles: 20_000.0,
            suez_compatible: true,
            panama_compatible: true,
        }
    }

    #[test]
    fn materializes_direct_route_with_no_intermediates() {
        let mut ports = HashMap::new();
        ports.insert("SGSIN".to_string(), port("SGSIN", 1.2655, 103.8201));
        ports.insert("NLRTM".to_string(), port("NLRTM", 51.9496, 4.1453));

        let path = vec!["SGSIN".to_string(), "NLRTM".to_string()];
        let route = materialize_route(
            &path,
            &ports,
            &vessel(),
            OptimizationCriterion::Balanced,
            VoyageFactors::default(),
            "dijkstra",
            0,
        )
        .unwrap();

        assert_eq!(route.segments.len(), 1);
        assert!(route.intermediate_unlocodes.is_empty());
        assert!(route.total_distance_nm > 0.0);
        assert!(route.overall_score >= 0.0);
        assert_eq!(route.display_name, "Route 1: SGSIN → NLRTM");
    }

    #[test]
    fn display_name_numbers_the_route_and_lists_intermediates() {
        let mut ports = HashMap::new();
        ports.insert("SGSIN".to_string(), port("SGSIN", 1.2655, 103.8201));
        ports.insert("AEJEA".to_string(), port("AEJEA", 25.0657, 55.1364));
        ports.insert("NLRTM".to_string(), port("NLRTM", 51.9496, 4.1453));

        let path = vec!["SGSIN".to_string(), "AEJEA".to_string(), "NLRTM".to_string()];
        let route = materialize_route(
            &path,
            &ports,
            &vessel(),
            OptimizationCriterion::Balanced,
            VoyageFactors::default(),
            "dijkstra",
            2,
        )
        .unwrap();

        assert_eq!(route.display_name, "Route 3: SGSIN → NLRTM via AEJEA");
    }

    #[test]
    fn rejects_path_shorter_than_two_ports() {
        let ports = HashMap::new();
        let path = vec!["SGSIN".to_string()];
        assert!(materialize_route(
            &path,
            &ports,
            &vessel(),
            OptimizationCriterion::Balanced,
            VoyageFactors::default(),
            "dijkstra",
            0,
        )
        .is_err());
    }

    #[test]
    fn suez_crossing_is_detected_for_europe_to_asia_pair() {
        // The specification's canal inference is a coarse longitude-only
        // heuristic on the two endpoints: Rotterdam (lon ~4) to Singapore
        // (lon ~104) crosses the [40, 60] band and is flagged Suez.
        let nlrtm = Coordinates { latitude: 51.9496, longitude: 4.1453 };
        let sgsin = Coordinates { latitude: 1.2655, longitude: 103.8201 };
        assert_eq!(infer_canal_transit(nlrtm, sgsin), Some(Canal::Suez));
    }

    #[test]
    fn panama_crossing_is_detected_for_pacific_to_atlantic_pair() {
        let uslax = Coordinates { latitude: 33.73, longitude: -118.26 };
        let usnyc = Coordinates { latitude: 40.71, longitude: -74.0 };
        assert_eq!(infer_canal_transit(uslax, usnyc), Some(Canal::Panama));
    }

    #[test]
    fn unrelated_pair_has_no_canal() {
        let nlrtm = Coordinates { latitude: 51.9496, longitude: 4.1453 };
        let deham = Coordinates { latitude: 53.5511, longitude: 9.9937 };
        assert_eq!(infer_canal_transit(nlrtm, deham), None);
    }
}
