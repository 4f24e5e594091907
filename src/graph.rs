//! Weighted directed graph over ports.
//!
//! Built once per port-set snapshot (grounded in the teacher's
//! `TransportGraph`, generalized from a multimodal edge-attributed graph
//! to the specification's pure-distance maritime graph). Edges are
//! bidirectional and present iff great-circle distance is within the
//! configured `max_edge_distance_nm`. The graph is immutable once built;
//! rebuilds swap an entirely new snapshot.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};

use crate::geo::great_circle_distance_nm;
use crate::model::Port;

/// Default maximum distance (nm) for a direct edge between two ports.
pub const DEFAULT_MAX_EDGE_DISTANCE_NM: f64 = 5000.0;

/// An immutable snapshot of the shipping network graph.
///
/// Internally backed by `petgraph::UnGraph` (undirected storage mirrors
/// the bidirectional-with-equal-weight invariant exactly, one edge
/// instead of two), with a `HashMap<UN/LOCODE, NodeIndex>` index on top
/// so callers address nodes by port code as the specification requires.
pub struct RouteGraph {
    graph: UnGraph<String, f64>,
    node_index: HashMap<String, NodeIndex>,
}

impl RouteGraph {
    /// Builds a graph snapshot from `ports`, connecting every pair within
    /// `max_edge_distance_nm` of each other. `O(|ports|^2)`; acceptable
    /// because any realistic working set is bounded to the low thousands.
    pub fn build(ports: &[Port], max_edge_distance_nm: f64) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut node_index = HashMap::with_capacity(ports.len());

        for port in ports {
            let idx = graph.add_node(port.unlocode.clone());
            node_index.insert(port.unlocode.clone(), idx);
        }

        for (i, a) in ports.iter().enumerate() {
            for b in &ports[i + 1..] {
                let distance = great_circle_distance_nm(a.coordinates, b.coordinates);
                if distance <= max_edge_distance_nm {
                    let ia = node_index[&a.unlocode];
                    let ib = node_index[&b.unlocode];
                    graph.add_edge(ia, ib, distance);
                }
            }
        }

        RouteGraph { graph, node_index }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_port(&self, unlocode: &str) -> bool {
        self.node_index.contains_key(unlocode)
    }

    fn index_of(&self, unlocode: &str) -> Option<NodeIndex> {
        self.node_index.get(unlocode).copied()
    }

    /// Edge weight (distance, nm) between two ports, if an edge exists.
    pub fn edge_weight(&self, from: &str, to: &str) -> Option<f64> {
        let a = self.index_of(from)?;
        let b = self.index_of(to)?;
        self.graph.find_edge(a, b).map(|e| self.graph[e])
    }

    /// Neighbors of `unlocode` with their edge weights, in insertion order.
    pub fn neighbors(&self, unlocode: &str) -> Vec<(String, f64)> {
        let Some(idx) = self.index_of(unlocode) else {
            return Vec::new();
        };

        self.graph
            .edges(idx)
            .map(|e| {
                let other = if e.source() == idx { e.target() } else { e.source() };
                (self.graph[other].clone(), *e.weight())
            })
            .collect()
    }

    pub fn port_codes(&self) -> impl Iterator<Item = &str> {
        self.node_index.keys().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinates, PortOperationalStatus, PortType};
    use std::collections::HashMap as StdHashMap;

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
            facilities: StdHashMap::new(),
            berth_count: 1,
        }
    }

    #[test]
    fn edges_are_bidirectional_with_equal_weight() {
        let ports = vec![port("AAAAA", 1.0, 103.0), port("BBBBB", 1.5, 103.5)];
        let graph = RouteGraph::build(&ports, 5000.0);

        let forward = graph.edge_weight("AAAAA", "BBBBB");
        let backward = graph.edge_weight("BBBBB", "AAAAA");
        assert_eq!(forward, backward);
        assert!(forward.is_some());
    }

    #[test]
    fn edge_absent_beyond_max_distance() {
        let ports = vec![port("AAAAA", 1.0, 103.0), port("CCCCC", 51.9, 4.1)];
        let graph = RouteGraph::build(&ports, 200.0);
        assert!(graph.edge_weight("AAAAA", "CCCCC").is_none());
    }

    #[test]
    fn node_and_edge_counts_match_input() {
        let ports = vec![
            port("AAAAA", 1.0, 103.0),
            port("BBBBB", 1.5, 103.5),
            port("CCCCC", 51.9, 4.1),
        ];
        let graph = RouteGraph::build(&ports, 5000.0);
        assert_eq!(graph.node_count(), 3);
        assert!(graph.edge_count() >= 1);
    }
}
