//! Port lookup abstraction.
//!
//! `PortStore` is the seam between the planner and wherever port data
//! actually lives (SurrealDB in production, an in-memory fixture in
//! tests). Ported from `port_intelligence.py`'s `search_ports` /
//! `find_nearby_ports` / `get_port_by_code` / `get_port_statistics`,
//! generalized behind a trait the way the teacher seams its `db` module
//! behind `load_graph_from_surrealdb` rather than calling SurrealDB
//! directly from the optimizer.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::PlannerResult;
use crate::geo::great_circle_distance_nm;
use crate::model::{Coordinates, Port, PortType, VesselConstraints};

/// A port returned from a fuzzy search, with its computed relevance.
#[derive(Debug, Clone)]
pub struct PortMatch {
    pub port: Port,
    pub relevance: f64,
}

/// Aggregate counts over the port store's contents.
#[derive(Debug, Clone, Default)]
pub struct PortStatistics {
    pub total_ports: u32,
    pub active_ports: u32,
    pub by_country: HashMap<String, u32>,
    pub by_type: HashMap<PortType, u32>,
}

#[async_trait]
pub trait PortStore: Send + Sync {
    /// Exact lookup by UN/LOCODE.
    async fn get_port(&self, unlocode: &str) -> PlannerResult<Option<Port>>;

    /// Fuzzy text search across UN/LOCODE, name, and country, ranked by
    /// `score_port_match` and truncated to `limit`. `country` narrows to a
    /// single country code, `vessel` drops ports the vessel can't berth
    /// at, and `include_inactive` controls whether maintenance/restricted/
    /// inactive ports are eligible at all.
    async fn search_ports(
        &self,
        query: &str,
        limit: usize,
        country: Option<&str>,
        vessel: Option<&VesselConstraints>,
        include_inactive: bool,
    ) -> PlannerResult<Vec<PortMatch>>;

    /// Ports within `radius_nm` of `coordinates`, nearest first, paired
    /// with their distance. Always active; `vessel`, if given, drops ports
    /// the vessel can't berth at.
    async fn nearby_ports(
        &self,
        coordinates: Coordinates,
        radius_nm: f64,
        limit: usize,
        vessel: Option<&VesselConstraints>,
    ) -> PlannerResult<Vec<(Port, f64)>>;

    /// Every active port known to the store, used to build a `RouteGraph`.
    async fn all_active_ports(&self) -> PlannerResult<Vec<Port>>;

    async fn statistics(&self) -> PlannerResult<PortStatistics>;
}

/// Relevance score in `[0, 100]` for `query` against a candidate port.
/// Higher is more relevant; ties are broken by the caller sorting on
/// port name ascending.
pub fn score_port_match(query: &str, unlocode: &str, name: &str, country: &str) -> f64 {
    let query_upper = query.trim().to_uppercase();
    if query_upper.is_empty() {
        return 0.0;
    }

    let name_upper = name.to_uppercase();
    let unlocode_upper = unlocode.to_uppercase();
    let country_upper = country.to_uppercase();

    if unlocode_upper == query_upper {
        return 100.0;
    }
    if name_upper == query_upper {
        return 95.0;
    }
    if name_upper.starts_with(&query_upper) {
        return 90.0;
    }
    if unlocode_upper.starts_with(&query_upper) {
        return 85.0;
    }
    if name_upper.contains(&query_upper) {
        return 70.0;
    }
    if country_upper.starts_with(&query_upper) {
        return 50.0;
    }
    30.0
}

/// Whether `port` is usable by `vessel`'s dimensions, or always true if
/// `vessel` is absent.
fn vessel_fits_port(port: &Port, vessel: Option<&VesselConstraints>) -> bool {
    match vessel {
        Some(v) => port.is_compatible_with_vessel(v.length_meters, v.beam_meters, v.draft_meters),
        None => true,
    }
}

/// Ranks and truncates a set of candidate ports for a free-text `query`,
/// filtering out non-matches (score below the country-prefix floor
/// requires at least a substring/country hit; an implementation may
/// still choose to pass every port through and let the floor do the
/// filtering). `country` narrows to a single country code, `vessel` drops
/// ports the vessel can't berth at, and `include_inactive` controls
/// whether non-active ports are eligible at all.
pub fn rank_port_matches(
    query: &str,
    candidates: Vec<Port>,
    limit: usize,
    country: Option<&str>,
    vessel: Option<&VesselConstraints>,
    include_inactive: bool,
) -> Vec<PortMatch> {
    let mut scored: Vec<PortMatch> = candidates
        .into_iter()
        .filter(|p| include_inactive || p.is_active())
        .filter(|p| country.map_or(true, |c| p.country.eq_ignore_ascii_case(c)))
        .filter(|p| vessel_fits_port(p, vessel))
        .map(|port| {
            let relevance = score_port_match(query, &port.unlocode, &port.name, &port.country);
            PortMatch { port, relevance }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap()
            .then_with(|| a.port.name.cmp(&b.port.name))
    });
    scored.truncate(limit);
    scored
}

/// Filters and sorts `candidates` by distance to `origin`, keeping only
/// active ports within `radius_nm` the vessel (if any) can berth at, and
/// pairs each with its computed distance.
pub fn filter_nearby(
    origin: Coordinates,
    candidates: Vec<Port>,
    radius_nm: f64,
    limit: usize,
    vessel: Option<&VesselConstraints>,
) -> Vec<(Port, f64)> {
    let mut with_distance: Vec<(f64, Port)> = candidates
        .into_iter()
        .filter(|p| p.is_active())
        .filter(|p| vessel_fits_port(p, vessel))
        .map(|p| (great_circle_distance_nm(origin, p.coordinates), p))
        .filter(|(distance, _)| *distance <= radius_nm)
        .collect();

    with_distance.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    with_distance.truncate(limit);
    with_distance.into_iter().map(|(distance, p)| (p, distance)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_unlocode_outranks_everything() {
        assert_eq!(score_port_match("SGSIN", "SGSIN", "Singapore", "Singapore"), 100.0);
    }

    #[test]
    fn prefix_match_outranks_substring_match() {
        let prefix = score_port_match("ROTT", "NLRTM", "Rotterdam", "Netherlands");
        let substring = score_port_match("TERD", "NLRTM", "Rotterdam", "Netherlands");
        assert!(prefix > substring);
    }

    #[test]
    fn unknown_query_still_gets_a_floor_score() {
        assert_eq!(score_port_match("ZZZZ", "NLRTM", "Rotterdam", "Netherlands"), 30.0);
    }
}
