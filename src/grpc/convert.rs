//! Conversions between the internal domain model and the generated
//! protobuf types.
//!
//! Monetary and measurement fields cross the wire as decimal strings
//! (`Decimal::to_string()` / `str::parse`) rather than `double`, so a
//! client never has to reason about floating-point rounding on a
//! dollar figure; everything else is a direct field-by-field mapping.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tonic::Status;

use crate::error::PlannerError;
use crate::model::{
    DetailedRoute, OptimizationCriterion, RouteRequest, RouteResponse, RouteSegment,
    VesselConstraints, VesselType,
};
use crate::ports::PortMatch;

use super::proto;

fn parse_vessel_type(s: &str) -> Result<VesselType, Status> {
    match s.to_lowercase().as_str() {
        "container" => Ok(VesselType::Container),
        "bulk_carrier" => Ok(VesselType::BulkCarrier),
        "tanker" => Ok(VesselType::Tanker),
        "gas_carrier" => Ok(VesselType::GasCarrier),
        "general_cargo" => Ok(VesselType::GeneralCargo),
        "roro" => Ok(VesselType::RoRo),
        "passenger" => Ok(VesselType::Passenger),
        "offshore" => Ok(VesselType::Offshore),
        "fishing" => Ok(VesselType::Fishing),
        other => Err(Status::invalid_argument(format!("unknown vessel_type '{other}'"))),
    }
}

fn parse_criterion(s: &str) -> Result<OptimizationCriterion, Status> {
    match s.to_lowercase().as_str() {
        "fastest" => Ok(OptimizationCriterion::Fastest),
        "most_economical" => Ok(OptimizationCriterion::MostEconomical),
        "most_reliable" => Ok(OptimizationCriterion::MostReliable),
        "balanced" => Ok(OptimizationCriterion::Balanced),
        "environmental" => Ok(OptimizationCriterion::Environmental),
        other => Err(Status::invalid_argument(format!("unknown optimization_criterion '{other}'"))),
    }
}

fn criterion_to_str(criterion: OptimizationCriterion) -> &'static str {
    match criterion {
        OptimizationCriterion::Fastest => "fastest",
        OptimizationCriterion::MostEconomical => "most_economical",
        OptimizationCriterion::MostReliable => "most_reliable",
        OptimizationCriterion::Balanced => "balanced",
        OptimizationCriterion::Environmental => "environmental",
    }
}

pub fn parse_vessel_constraints(proto: &proto::VesselConstraints) -> Result<VesselConstraints, Status> {
    Ok(VesselConstraints {
        vessel_type: parse_vessel_type(&proto.vessel_type)?,
        length_meters: proto.length_meters,
        beam_meters: proto.beam_meters,
        draft_meters: proto.draft_meters,
        cruise_speed_knots: proto.cruise_speed_knots,
        deadweight_tonnage: proto.deadweight_tonnage.map(|v| v as u64),
        gross_tonnage: None,
        max_range_nautical_miles: proto.max_range_nautical_miles,
        suez_compatible: proto.suez_compatible,
        panama_compatible: proto.panama_compatible,
    })
}

pub fn parse_route_request(proto: &proto::RouteRequest) -> Result<RouteRequest, Status> {
    let vessel = proto
        .vessel
        .as_ref()
        .ok_or_else(|| Status::invalid_argument("vessel is required"))
        .and_then(parse_vessel_constraints)?;

    let departure_time: DateTime<Utc> = DateTime::parse_from_rfc3339(&proto.departure_time)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Status::invalid_argument(format!("invalid departure_time: {e}")))?;

    Ok(RouteRequest {
        origin_unlocode: proto.origin_unlocode.clone(),
        destination_unlocode: proto.destination_unlocode.clone(),
        vessel,
        criterion: parse_criterion(&proto.optimization_criterion)?,
        departure_time,
        include_alternatives: proto.include_alternatives,
        max_alternatives: proto.max_alternatives,
        max_connecting_ports: proto.max_connecting_ports,
        timeout_seconds: proto.timeout_seconds as u64,
    })
}

fn decimal_str(value: Decimal) -> String {
    value.to_string()
}

fn route_segment_to_proto(segment: &RouteSegment) -> proto::RouteSegment {
    proto::RouteSegment {
        sequence: segment.sequence,
        origin_unlocode: segment.origin_unlocode.clone(),
        destination_unlocode: segment.destination_unlocode.clone(),
        distance_nm: format!("{:.2}", segment.distance_nm),
        transit_hours: format!("{:.1}", segment.transit_hours),
        port_approach_hours: format!("{:.1}", segment.port_approach_hours),
        fuel_tons: decimal_str(segment.fuel_tons),
        fuel_cost_usd: decimal_str(segment.fuel_cost_usd),
        port_fees_usd: decimal_str(segment.port_fees_usd),
        canal_fees_usd: decimal_str(segment.canal_fees_usd),
        bearing_degrees: format!("{:.1}", segment.bearing_degrees),
        waypoints: segment
            .waypoints
            .iter()
            .map(|w| proto::Waypoint { latitude: w.latitude, longitude: w.longitude })
            .collect(),
        weather_risk: segment.weather_risk,
        piracy_risk: segment.piracy_risk,
        political_risk: segment.political_risk,
        risk_score: segment.risk_score(),
    }
}

pub fn detailed_route_to_proto(route: &DetailedRoute) -> proto::DetailedRoute {
    proto::DetailedRoute {
        route_id: route.route_id.clone(),
        display_name: route.display_name.clone(),
        origin_unlocode: route.origin_unlocode.clone(),
        destination_unlocode: route.destination_unlocode.clone(),
        intermediate_unlocodes: route.intermediate_unlocodes.clone(),
        segments: route.segments.iter().map(route_segment_to_proto).collect(),
        total_distance_nm: format!("{:.2}", route.total_distance_nm),
        total_transit_hours: format!("{:.1}", route.total_transit_hours),
        total_fuel_tons: decimal_str(route.total_fuel_tons),
        total_cost_usd: decimal_str(route.total_cost_usd()),
        total_fuel_cost_usd: decimal_str(route.cost_breakdown.fuel_cost_usd),
        total_port_fees_usd: decimal_str(route.cost_breakdown.port_fees_usd),
        total_canal_fees_usd: decimal_str(route.cost_breakdown.canal_fees_usd),
        efficiency_score: route.efficiency_score,
        reliability_score: route.reliability_score,
        environmental_impact_score: route.environmental_impact_score,
        overall_score: route.overall_score,
        algorithm_used: route.algorithm_used.clone(),
        optimization_criterion: criterion_to_str(route.criterion).to_string(),
    }
}

pub fn route_response_to_proto(response: &RouteResponse) -> proto::RouteResponse {
    proto::RouteResponse {
        request_id: response.request_id.clone(),
        calculation_timestamp: response.calculation_timestamp.to_rfc3339(),
        calculation_duration_ms: response.calculation_duration_ms,
        primary_route: Some(detailed_route_to_proto(&response.primary_route)),
        alternative_routes: response.alternative_routes.iter().map(detailed_route_to_proto).collect(),
        optimization_criterion: criterion_to_str(response.criterion).to_string(),
        candidates_evaluated: response.candidates_evaluated as u32,
        cache_hit: response.cache_hit,
    }
}

pub fn port_match_to_proto(port_match: &PortMatch) -> proto::PortMatch {
    proto::PortMatch {
        unlocode: port_match.port.unlocode.clone(),
        name: port_match.port.name.clone(),
        country: port_match.port.country.clone(),
        relevance: port_match.relevance,
    }
}

/// Maps a `PlannerError` to the gRPC status code that best matches its
/// semantics: malformed input is `InvalidArgument`, a valid-but-absent
/// reference is `NotFound`, a timeout is `DeadlineExceeded`, and an
/// internal dependency failure is `Unavailable`.
pub fn planner_error_to_status(error: PlannerError) -> Status {
    match error {
        PlannerError::Validation(msg) => Status::invalid_argument(msg),
        PlannerError::PortNotFound(code) => Status::not_found(format!("port not found: {code}")),
        PlannerError::VesselConstraint(msg) => Status::failed_precondition(msg),
        PlannerError::NoRoute { origin, destination } => {
            Status::not_found(format!("no route between {origin} and {destination}"))
        }
        PlannerError::CalculationTimeout(seconds) => {
            Status::deadline_exceeded(format!("route calculation exceeded {seconds}s"))
        }
        PlannerError::UpstreamFailure(msg) => Status::unavailable(msg),
    }
}
