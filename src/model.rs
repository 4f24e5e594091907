//! Core maritime domain model.
//!
//! Mirrors the data model in the specification: coordinates, ports,
//! vessel constraints, requests/responses, and the fully-costed route
//! types the planner assembles. Invariants are enforced by validated
//! constructors rather than left to callers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};

/// Geographic coordinates, immutable value type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> PlannerResult<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(PlannerError::Validation(format!(
                "latitude {latitude} out of range [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(PlannerError::Validation(format!(
                "longitude {longitude} out of range [-180, 180]"
            )));
        }
        Ok(Coordinates { latitude, longitude })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VesselType {
    Container,
    BulkCarrier,
    Tanker,
    GasCarrier,
    GeneralCargo,
    RoRo,
    Passenger,
    Offshore,
    Fishing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortOperationalStatus {
    Active,
    Restricted,
    Maintenance,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortType {
    ContainerTerminal,
    BulkTerminal,
    TankerTerminal,
    GeneralCargo,
    Multipurpose,
    Passenger,
    Fishing,
}

/// A seaport. UN/LOCODE is unique across the store and must be five
/// uppercase letters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    pub unlocode: String,
    pub name: String,
    pub country: String,
    pub coordinates: Coordinates,
    pub port_type: PortType,
    pub operational_status: PortOperationalStatus,
    pub max_vessel_length_meters: Option<f64>,
    pub max_vessel_beam_meters: Option<f64>,
    pub max_draft_meters: Option<f64>,
    pub facilities: HashMap<String, serde_json::Value>,
    pub berth_count: u32,
}

impl Port {
    /// Validates that the UN/LOCODE is exactly 5 uppercase ASCII letters.
    pub fn is_valid_unlocode(code: &str) -> bool {
        code.len() == 5 && code.chars().all(|c| c.is_ascii_uppercase())
    }

    pub fn is_active(&self) -> bool {
        self.operational_status == PortOperationalStatus::Active
    }

    /// Checks whether a vessel's dimensions fit within this port's maxima.
    /// Absent maxima are treated as unconstrained.
    pub fn is_compatible_with_vessel(&self, length_m: f64, beam_m: f64, draft_m: f64) -> bool {
        if let Some(max_len) = self.max_vessel_length_meters {
            if length_m > max_len {
                return false;
            }
        }
        if let Some(max_beam) = self.max_vessel_beam_meters {
            if beam_m > max_beam {
                return false;
            }
        }
        if let Some(max_draft) = self.max_draft_meters {
            if draft_m > max_draft {
                return false;
            }
        }
        true
    }
}

/// Vessel specifications and constraints used throughout cost/feasibility
/// calculations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VesselConstraints {
    pub vessel_type: VesselType,
    pub length_meters: f64,
    pub beam_meters: f64,
    pub draft_meters: f64,
    pub cruise_speed_knots: f64,
    pub deadweight_tonnage: Option<u64>,
    pub gross_tonnage: Option<u64>,
    pub max_range_nautical_miles: f64,
    pub suez_compatible: bool,
    pub panama_compatible: bool,
}

impl VesselConstraints {
    pub fn validate(&self) -> PlannerResult<()> {
        if self.length_meters <= 0.0 {
            return Err(PlannerError::Validation("vessel length must be positive".into()));
        }
        if self.beam_meters <= 0.0 {
            return Err(PlannerError::Validation("vessel beam must be positive".into()));
        }
        if self.draft_meters <= 0.0 {
            return Err(PlannerError::Validation("vessel draft must be positive".into()));
        }
        if !(0.0 < self.cruise_speed_knots && self.cruise_speed_knots <= 40.0) {
            return Err(PlannerError::Validation(
                "cruise speed must be within (0, 40] knots".into(),
            ));
        }
        if self.max_range_nautical_miles <= 0.0 {
            return Err(PlannerError::Validation("max range must be positive".into()));
        }
        Ok(())
    }

    /// Effective deadweight tonnage, defaulting to 50,000t for the fuel model.
    pub fn effective_dwt(&self) -> f64 {
        self.deadweight_tonnage.unwrap_or(50_000) as f64
    }

    /// Effective gross tonnage, defaulting to 0.6 * DWT.
    pub fn effective_grt(&self) -> f64 {
        self.gross_tonnage
            .map(|g| g as f64)
            .unwrap_or_else(|| self.effective_dwt() * 0.6)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationCriterion {
    Fastest,
    MostEconomical,
    MostReliable,
    Balanced,
    Environmental,
}

/// A full route planning request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub origin_unlocode: String,
    pub destination_unlocode: String,
    pub vessel: VesselConstraints,
    pub criterion: OptimizationCriterion,
    pub departure_time: DateTime<Utc>,
    pub include_alternatives: bool,
    pub max_alternatives: u32,
    pub max_connecting_ports: u32,
    pub timeout_seconds: u64,
}

impl RouteRequest {
    pub fn validate(&self, now: DateTime<Utc>) -> PlannerResult<()> {
        if !Port::is_valid_unlocode(&self.origin_unlocode) {
            return Err(PlannerError::Validation(format!(
                "origin UN/LOCODE '{}' is not 5 uppercase letters",
                self.origin_unlocode
            )));
        }
        if !Port::is_valid_unlocode(&self.destination_unlocode) {
            return Err(PlannerError::Validation(format!(
                "destination UN/LOCODE '{}' is not 5 uppercase letters",
                self.destination_unlocode
            )));
        }
        if self.origin_unlocode == self.destination_unlocode {
            return Err(PlannerError::Validation(
                "origin and destination must differ".into(),
            ));
        }
        self.vessel.validate()?;
        if self.departure_time < now {
            return Err(PlannerError::Validation(
                "departure time must not be in the past".into(),
            ));
        }
        if self.max_alternatives > 10 {
            return Err(PlannerError::Validation(
                "max_alternatives must be within [0, 10]".into(),
            ));
        }
        if self.max_connecting_ports > 5 {
            return Err(PlannerError::Validation(
                "max_connecting_ports must be within [0, 5]".into(),
            ));
        }
        if !(5..=120).contains(&self.timeout_seconds) {
            return Err(PlannerError::Validation(
                "timeout_seconds must be within [5, 120]".into(),
            ));
        }
        Ok(())
    }
}

/// Intermediate waypoint generated along a great-circle segment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// One leg of a materialized route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSegment {
    pub sequence: u32,
    pub origin_unlocode: String,
    pub destination_unlocode: String,
    pub distance_nm: f64,
    pub transit_hours: f64,
    pub port_approach_hours: f64,
    pub fuel_tons: Decimal,
    pub fuel_cost_usd: Decimal,
    pub port_fees_usd: Decimal,
    pub canal_fees_usd: Decimal,
    pub bearing_degrees: f64,
    pub waypoints: Vec<Waypoint>,
    pub weather_risk: f64,
    pub piracy_risk: f64,
    pub political_risk: f64,
}

impl RouteSegment {
    /// Mean of the three component risk scores, in [0, 100].
    pub fn risk_score(&self) -> f64 {
        (self.weather_risk + self.piracy_risk + self.political_risk) / 3.0
    }
}

/// Cost breakdown totals for a `DetailedRoute`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub fuel_cost_usd: Decimal,
    pub port_fees_usd: Decimal,
    pub canal_fees_usd: Decimal,
}

impl CostBreakdown {
    pub fn total(&self) -> Decimal {
        self.fuel_cost_usd + self.port_fees_usd + self.canal_fees_usd
    }
}

/// A fully materialized, fully-costed candidate route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedRoute {
    pub route_id: String,
    pub display_name: String,
    pub origin_unlocode: String,
    pub destination_unlocode: String,
    pub intermediate_unlocodes: Vec<String>,
    pub segments: Vec<RouteSegment>,
    pub total_distance_nm: f64,
    pub total_transit_hours: f64,
    pub total_fuel_tons: Decimal,
    pub cost_breakdown: CostBreakdown,
    pub efficiency_score: f64,
    pub reliability_score: f64,
    pub environmental_impact_score: f64,
    pub overall_score: f64,
    pub algorithm_used: String,
    pub criterion: OptimizationCriterion,
}

impl DetailedRoute {
    pub fn total_cost_usd(&self) -> Decimal {
        self.cost_breakdown.total()
    }
}

/// The response returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    pub request_id: String,
    pub calculation_timestamp: DateTime<Utc>,
    pub calculation_duration_ms: f64,
    pub primary_route: DetailedRoute,
    pub alternative_routes: Vec<DetailedRoute>,
    pub criterion: OptimizationCriterion,
    pub candidates_evaluated: usize,
    pub cache_hit: bool,
}
