//! Deterministic maritime cost model.
//!
//! Fuel consumption, port fees, and transit time, ported from
//! `FuelConsumptionCalculator`, `PortFeeCalculator`, and
//! `TransitTimeEstimator` in the original maritime calculation service.
//! All coefficients are static and calibrated; none are looked up from
//! a live market or weather feed.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::error::{PlannerError, PlannerResult};
use crate::model::{OptimizationCriterion, Port, VesselConstraints, VesselType};

/// Per-vessel-type fuel coefficients (tons/day at design speed, and the
/// speed-power curve exponent).
struct FuelCoefficients {
    main_engine_tons_per_day: f64,
    auxiliary_tons_per_day: f64,
    speed_power_exponent: f64,
}

const DESIGN_SPEED_KNOTS: f64 = 20.0;
const MINIMUM_CONSUMPTION_TONS_PER_DAY: f64 = 5.0;

fn fuel_coefficients(vessel_type: VesselType) -> FuelCoefficients {
    match vessel_type {
        VesselType::Container => FuelCoefficients {
            main_engine_tons_per_day: 150.0,
            auxiliary_tons_per_day: 15.0,
            speed_power_exponent: 3.2,
        },
        VesselType::BulkCarrier => FuelCoefficients {
            main_engine_tons_per_day: 120.0,
            auxiliary_tons_per_day: 12.0,
            speed_power_exponent: 3.1,
        },
        VesselType::Tanker => FuelCoefficients {
            main_engine_tons_per_day: 140.0,
            auxiliary_tons_per_day: 14.0,
            speed_power_exponent: 3.0,
        },
        VesselType::GasCarrier => FuelCoefficients {
            main_engine_tons_per_day: 160.0,
            auxiliary_tons_per_day: 18.0,
            speed_power_exponent: 3.3,
        },
        // General cargo, RoRo, passenger, offshore, fishing: no dedicated
        // calibration exists, so fall back to container coefficients.
        _ => FuelCoefficients {
            main_engine_tons_per_day: 150.0,
            auxiliary_tons_per_day: 15.0,
            speed_power_exponent: 3.2,
        },
    }
}

/// Environmental/operational factors applied to fuel and transit-time
/// calculations. Defaults represent calm-water, normally-loaded
/// operation.
#[derive(Debug, Clone, Copy)]
pub struct VoyageFactors {
    pub weather_factor: f64,
    pub load_factor: f64,
    pub operational_efficiency: f64,
    pub traffic_factor: f64,
    pub seasonal_factor: f64,
}

impl Default for VoyageFactors {
    fn default() -> Self {
        VoyageFactors {
            weather_factor: 1.0,
            load_factor: 0.8,
            operational_efficiency: 1.0,
            traffic_factor: 1.0,
            seasonal_factor: 1.0,
        }
    }
}

/// Estimates fuel consumption in metric tons for a segment of length
/// `distance_nm` sailed by `vessel`, rounded to 0.1 ton.
pub fn estimate_fuel_tons(
    distance_nm: f64,
    vessel: &VesselConstraints,
    factors: VoyageFactors,
) -> PlannerResult<Decimal> {
    if distance_nm <= 0.0 {
        return Err(PlannerError::Validation("distance must be positive".into()));
    }
    if vessel.cruise_speed_knots <= 0.0 {
        return Err(PlannerError::Validation("cruise speed must be positive".into()));
    }
    if !(0.5..=2.0).contains(&factors.weather_factor) {
        return Err(PlannerError::Validation(
            "weather factor must be within [0.5, 2.0]".into(),
        ));
    }
    if !(0.0..=1.0).contains(&factors.load_factor) {
        return Err(PlannerError::Validation("load factor must be within [0.0, 1.0]".into()));
    }

    let coefficients = fuel_coefficients(vessel.vessel_type);
    let transit_time_days = distance_nm / (vessel.cruise_speed_knots * 24.0);

    let size_factor = (vessel.effective_dwt() / 50_000.0).powf(0.7);
    let speed_factor = (vessel.cruise_speed_knots / DESIGN_SPEED_KNOTS)
        .powf(coefficients.speed_power_exponent);
    let load_impact = 1.0 + factors.load_factor * 0.15;

    let main_engine = coefficients.main_engine_tons_per_day
        * size_factor
        * speed_factor
        * load_impact
        * factors.weather_factor
        * factors.operational_efficiency;
    let auxiliary = coefficients.auxiliary_tons_per_day * size_factor;

    let total_per_day = main_engine + auxiliary;
    let total = total_per_day * transit_time_days;
    let minimum = MINIMUM_CONSUMPTION_TONS_PER_DAY * transit_time_days;

    let tons = total.max(minimum);
    Ok(round_decimal(tons, 1))
}

/// Static fuel price, USD per ton. Exposed as a configuration constant
/// per the specification's open question about the magic number.
pub const FUEL_PRICE_USD_PER_TON: f64 = 600.0;

pub fn fuel_cost_usd(fuel_tons: Decimal) -> Decimal {
    (fuel_tons * Decimal::from_f64(FUEL_PRICE_USD_PER_TON).unwrap_or_default())
        .round_dp(2)
}

/// Port tier multipliers, highest first.
const TIER_1_MULTIPLIER: f64 = 1.5;
const TIER_2_MULTIPLIER: f64 = 1.0;
const TIER_3_MULTIPLIER: f64 = 0.7;
const TIER_4_MULTIPLIER: f64 = 0.5;

/// A small enumerated set of major hubs always classified as tier 1,
/// regardless of facility/berth counts in their store record.
const MAJOR_HUB_PORTS: &[&str] = &["SGSIN", "NLRTM", "CNSHA", "AEJEA", "USLAX", "DEHAM"];

fn port_tier_multiplier(port: &Port) -> f64 {
    if MAJOR_HUB_PORTS.contains(&port.unlocode.as_str()) {
        return TIER_1_MULTIPLIER;
    }

    let facilities_count = port
        .facilities
        .get("cargo_handling")
        .and_then(|v| v.as_array())
        .map(|arr| arr.len())
        .unwrap_or(0);
    let berths = port.berth_count;

    if facilities_count >= 10 && berths >= 20 {
        TIER_1_MULTIPLIER
    } else if facilities_count >= 5 && berths >= 10 {
        TIER_2_MULTIPLIER
    } else if facilities_count >= 3 && berths >= 5 {
        TIER_3_MULTIPLIER
    } else {
        TIER_4_MULTIPLIER
    }
}

/// Calculates the total port fees for a vessel call at `port`, summing
/// pilotage, dues, berth, agency, cargo handling, and additional fee
/// components, each scaled by the port's tier multiplier.
pub fn calculate_port_fees(
    port: &Port,
    vessel: &VesselConstraints,
    port_time_hours: f64,
    cargo_volume_tons: Option<f64>,
) -> PlannerResult<Decimal> {
    if port_time_hours <= 0.0 {
        return Err(PlannerError::Validation("port time must be positive".into()));
    }

    let tier_multiplier = port_tier_multiplier(port);
    let grt = vessel.effective_grt();

    let pilotage = dec(2000.0) * dec(tier_multiplier) * dec(grt / 10_000.0).sqrt_approx();
    let dues = dec(0.15) * dec(grt) * dec(tier_multiplier);

    let port_time_days = (port_time_hours / 24.0).max(0.5);
    let berth = dec(50.0) * dec(vessel.length_meters) * dec(port_time_days) * dec(tier_multiplier);

    let size_factor = match vessel.deadweight_tonnage {
        Some(dwt) if dwt > 100_000 => 1.5,
        Some(dwt) if dwt > 50_000 => 1.2,
        _ => 1.0,
    };
    let agency = dec(2500.0) * dec(size_factor) * dec(tier_multiplier);

    let cargo_handling = match cargo_volume_tons {
        Some(volume) => dec(25.0) * dec(volume) * dec(tier_multiplier),
        None => Decimal::ZERO,
    };

    let additional = dec(1500.0) * dec(tier_multiplier);

    let total = pilotage + dues + berth + agency + cargo_handling + additional;
    Ok(total.round_dp(2))
}

/// Small helper so callers don't need `Decimal::from_f64_retain` at every
/// call site; this domain never deals in NaN/infinite inputs.
fn dec(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or_default()
}

trait SqrtApprox {
    fn sqrt_approx(self) -> Decimal;
}

impl SqrtApprox for Decimal {
    fn sqrt_approx(self) -> Decimal {
        self.to_f64()
            .map(|v| dec(v.max(0.0).sqrt()))
            .unwrap_or_default()
    }
}

/// Default dwell time used by the route materializer when none is given.
pub const DEFAULT_PORT_DWELL_HOURS: f64 = 24.0;

/// Operational buffer floor applied to transit time, in hours.
const MIN_OPERATIONAL_BUFFER_HOURS: f64 = 2.0;

/// Estimates transit time in hours for a segment of length `distance_nm`
/// sailed at `speed_knots`, including weather/traffic/seasonal
/// adjustment and the minimum 2-hour operational buffer.
pub fn estimate_transit_hours(
    distance_nm: f64,
    speed_knots: f64,
    factors: VoyageFactors,
) -> PlannerResult<f64> {
    if distance_nm <= 0.0 || speed_knots <= 0.0 {
        return Err(PlannerError::Validation(
            "distance and speed must be positive".into(),
        ));
    }

    let base_hours = distance_nm / speed_knots;
    let adjusted = base_hours * factors.weather_factor * factors.traffic_factor * factors.seasonal_factor;
    let buffer = (adjusted * 0.05).max(MIN_OPERATIONAL_BUFFER_HOURS);

    Ok(round_f64(adjusted + buffer, 1))
}

/// Route-level reliability score: `100 - mean(segment risk)`, clamped.
pub fn route_reliability(mean_risk_score: f64) -> f64 {
    (100.0 - mean_risk_score).clamp(0.0, 100.0)
}

/// Route-level efficiency score: how close total distance is to the
/// great-circle distance between endpoints, clamped to [0, 100].
/// When both distances are zero, efficiency is defined as 100.
pub fn route_efficiency(great_circle_nm: f64, total_distance_nm: f64) -> f64 {
    if great_circle_nm == 0.0 && total_distance_nm == 0.0 {
        return 100.0;
    }
    if total_distance_nm == 0.0 {
        return 0.0;
    }
    (100.0 * (great_circle_nm / total_distance_nm)).clamp(0.0, 100.0)
}

/// Piecewise environmental impact score from fuel intensity (tons per
/// 1000nm). Lower intensity is better; the returned value is the impact
/// itself (higher = worse), matching the specification's table.
pub fn environmental_impact_score(total_fuel_tons: f64, total_distance_nm: f64) -> f64 {
    if total_distance_nm <= 0.0 {
        return 80.0;
    }
    let intensity = 1000.0 * total_fuel_tons / total_distance_nm;
    if intensity < 30.0 {
        10.0
    } else if intensity < 40.0 {
        25.0
    } else if intensity < 50.0 {
        40.0
    } else if intensity < 70.0 {
        60.0
    } else {
        80.0
    }
}

/// Criterion-weighted composite score combining efficiency, reliability,
/// and the inverted environmental impact.
pub fn overall_score(
    efficiency: f64,
    reliability: f64,
    environmental_impact: f64,
    criterion: OptimizationCriterion,
) -> f64 {
    let env_score = 100.0 - environmental_impact;

    match criterion {
        OptimizationCriterion::Fastest => efficiency * 0.6 + reliability * 0.3 + env_score * 0.1,
        OptimizationCriterion::MostEconomical => efficiency * 0.4 + reliability * 0.2 + env_score * 0.4,
        OptimizationCriterion::MostReliable => efficiency * 0.3 + reliability * 0.6 + env_score * 0.1,
        OptimizationCriterion::Balanced | OptimizationCriterion::Environmental => {
            (efficiency + reliability + env_score) / 3.0
        }
    }
}

fn round_decimal(value: f64, decimals: u32) -> Decimal {
    dec(value).round_dp(decimals)
}

fn round_f64(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PortOperationalStatus, PortType};
    use std::collections::HashMap;

    fn vessel(speed: f64, dwt: Option<u64>) -> VesselConstraints {
        VesselConstraints {
            vessel_type: VesselType::Container,
            length_meters: 300.0,
            beam_meters: 45.0,
            draft_meters: 14.0,
            cruise_speed_knots: speed,
            deadweight_tonnage: dwt,
            gross_tonnage: None,
            max_range_nautical_miles: 10_000.0,
            suez_compatible: true,
            panama_compatible: true,
        }
    }

    fn port(unlocode: &str) -> Port {
        Port {
            unlocode: unlocode.to_string(),
            name: "Test Port".to_string(),
            country: "XX".to_string(),
            coordinates: crate::model::Coordinates { latitude: 0.0, longitude: 0.0 },
            port_type: PortType::Multipurpose,
            operational_status: PortOperationalStatus::Active,
            max_vessel_length_meters: None,
            max_vessel_beam_meters: None,
            max_draft_meters: None,
            facilities: HashMap::new(),
            berth_count: 2,
        }
    }

    #[test]
    fn fuel_is_monotone_in_distance() {
        let v = vessel(18.0, Some(80_000));
        let f1 = estimate_fuel_tons(1000.0, &v, VoyageFactors::default()).unwrap();
        let f2 = estimate_fuel_tons(2000.0, &v, VoyageFactors::default()).unwrap();
        assert!(f2 >= f1);
    }

    #[test]
    fn faster_vessel_burns_more_fuel_for_same_distance() {
        let slow = vessel(14.0, Some(80_000));
        let fast = vessel(22.0, Some(80_000));
        let f_slow = estimate_fuel_tons(2000.0, &slow, VoyageFactors::default()).unwrap();
        let f_fast = estimate_fuel_tons(2000.0, &fast, VoyageFactors::default()).unwrap();
        assert!(f_fast >= f_slow);
    }

    #[test]
    fn fuel_rejects_bad_inputs() {
        let v = vessel(18.0, None);
        assert!(estimate_fuel_tons(0.0, &v, VoyageFactors::default()).is_err());
        let mut bad_factors = VoyageFactors::default();
        bad_factors.weather_factor = 3.0;
        assert!(estimate_fuel_tons(1000.0, &v, bad_factors).is_err());
    }

    #[test]
    fn port_fees_are_nonnegative_and_grow_with_length() {
        let p = port("ZZLOC");
        let short = vessel(18.0, Some(60_000));
        let mut long = vessel(18.0, Some(60_000));
        long.length_meters = 350.0;

        let short_fees = calculate_port_fees(&p, &short, 24.0, None).unwrap();
        let long_fees = calculate_port_fees(&p, &long, 24.0, None).unwrap();

        assert!(short_fees >= Decimal::ZERO);
        assert!(long_fees > short_fees);
    }

    #[test]
    fn transit_time_respects_operational_buffer() {
        let hours = estimate_transit_hours(1000.0, 20.0, VoyageFactors::default()).unwrap();
        assert!(hours >= 1000.0 / 20.0 + 2.0);
    }

    #[test]
    fn efficiency_defined_as_100_when_both_distances_zero() {
        assert_eq!(route_efficiency(0.0, 0.0), 100.0);
    }

    #[test]
    fn major_hub_is_always_tier_one() {
        let hub = port("SGSIN");
        assert_eq!(port_tier_multiplier(&hub), TIER_1_MULTIPLIER);
    }
}
