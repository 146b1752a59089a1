//! Road network graph model.
//!
//! A [`RoadGraph`] is an immutable directed multigraph covering one region.
//! Map-data sources deliver a [`RegionData`] (nodes plus raw edges whose
//! lengths may be missing or malformed); [`RoadGraph::from_region`] validates
//! it and normalizes every edge weight to meters.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geodesy::{self, BoundingBox, Coordinate};

/// OpenStreetMap-style node identifier.
pub type NodeId = i64;

/// Represents a node in the road network graph.
///
/// Each node corresponds to an intersection or a point along a road.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node ID, unique within a graph
    pub id: NodeId,
    pub lat: f64,
    pub lon: f64,
}

impl Node {
    pub const fn new(id: NodeId, lat: f64, lon: f64) -> Self {
        Self { id, lat, lon }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// A directed road segment as delivered by a map-data source, before
/// weight normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEdge {
    pub from: NodeId,
    pub to: NodeId,
    /// Length in meters, if the source knows it
    pub length_m: Option<f64>,
    /// Road curve from `from` to `to`, endpoints included
    pub geometry: Option<Vec<Coordinate>>,
}

impl RawEdge {
    pub fn new(from: NodeId, to: NodeId, length_m: Option<f64>) -> Self {
        Self {
            from,
            to,
            length_m,
            geometry: None,
        }
    }

    pub fn with_geometry(mut self, geometry: Vec<Coordinate>) -> Self {
        self.geometry = Some(geometry);
        self
    }
}

/// Everything a map-data source knows about one region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionData {
    pub nodes: Vec<Node>,
    pub edges: Vec<RawEdge>,
}

/// Represents a road segment (edge) in the road network graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    /// Normalized length in meters. `None` marks an edge whose length could
    /// not be resolved; such edges are never traversed by path search.
    pub weight_m: Option<f64>,
    /// Detailed road curve from `from` to `to`, endpoints included
    pub geometry: Option<Vec<Coordinate>>,
}

impl Edge {
    pub fn is_weighted(&self) -> bool {
        self.weight_m.is_some()
    }
}

/// The complete road network graph for one region.
///
/// Iteration order of nodes and edges is the order they were supplied in,
/// which keeps nearest-node and path-search tie-breaks stable.
#[derive(Debug, Default, Clone)]
pub struct RoadGraph {
    nodes: Vec<Node>,
    /// Node ID -> position in `nodes`
    node_index: HashMap<NodeId, usize>,
    edges: Vec<Edge>,
    /// Adjacency list: maps each node ID to indices of outgoing edges
    out_edges: HashMap<NodeId, Vec<usize>>,
    /// Chosen edge for every ordered node pair, see [`RoadGraph::edge_between`]
    preferred: HashMap<(NodeId, NodeId), usize>,
    unweighted: usize,
}

impl RoadGraph {
    /// Builds a graph from raw region data, normalizing edge weights.
    ///
    /// For every edge a finite, non-negative `length_m` is used as is. Otherwise
    /// the length is derived from the edge geometry (or the straight line
    /// between its endpoints) with the haversine formula. Edges whose length
    /// still cannot be resolved are kept but marked unweighted. Edges that
    /// reference unknown nodes and repeated node IDs are dropped. All of these
    /// are reported as data-quality warnings, never as errors.
    pub fn from_region(region: RegionData) -> Self {
        let mut graph = RoadGraph::default();
        let mut duplicate_nodes = 0usize;
        let mut dangling_edges = 0usize;
        let mut derived_lengths = 0usize;

        for node in region.nodes {
            if graph.node_index.contains_key(&node.id) {
                duplicate_nodes += 1;
                continue;
            }
            graph.node_index.insert(node.id, graph.nodes.len());
            graph.nodes.push(node);
        }

        for raw in region.edges {
            let (Some(from), Some(to)) = (graph.node(raw.from), graph.node(raw.to)) else {
                dangling_edges += 1;
                continue;
            };

            let weight_m = match raw.length_m.filter(|l| l.is_finite() && *l >= 0.0) {
                Some(length) => Some(length),
                None => {
                    derived_lengths += 1;
                    let derived = match raw.geometry.as_deref() {
                        Some(points) if points.len() >= 2 => geodesy::polyline_length(points),
                        _ => geodesy::distance(from.coordinate(), to.coordinate()),
                    };
                    derived.is_finite().then_some(derived)
                }
            };

            graph.push_edge(Edge {
                from: raw.from,
                to: raw.to,
                weight_m,
                geometry: raw.geometry,
            });
        }

        if duplicate_nodes > 0 {
            tracing::warn!(duplicate_nodes, "Dropped repeated node IDs while building graph");
        }
        if dangling_edges > 0 {
            tracing::warn!(dangling_edges, "Dropped edges referencing unknown nodes");
        }
        if graph.unweighted > 0 {
            tracing::warn!(
                unweighted = graph.unweighted,
                "Edges without a resolvable length are excluded from routing"
            );
        }
        tracing::info!(
            "Edge weights normalised: {} edges weighted ({} derived from geometry), {} unweighted",
            graph.edges.len() - graph.unweighted,
            derived_lengths - graph.unweighted,
            graph.unweighted
        );

        graph
    }

    fn push_edge(&mut self, edge: Edge) {
        let index = self.edges.len();
        let key = (edge.from, edge.to);

        if !edge.is_weighted() {
            self.unweighted += 1;
        }

        // Lightest weighted edge wins; earlier edges win ties and beat unweighted ones
        match self.preferred.get(&key).map(|&i| &self.edges[i]) {
            None => {
                self.preferred.insert(key, index);
            }
            Some(current) => {
                let better = match (edge.weight_m, current.weight_m) {
                    (Some(new), Some(old)) => new < old,
                    (Some(_), None) => true,
                    _ => false,
                };
                if better {
                    self.preferred.insert(key, index);
                }
            }
        }

        self.out_edges.entry(edge.from).or_default().push(index);
        self.edges.push(edge);
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// All edges in insertion order, including unweighted ones.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_index.contains_key(&id)
    }

    /// Outgoing edges of `id` in insertion order.
    pub fn out_edges(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.out_edges
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    /// The edge used for the ordered pair `(from, to)`.
    ///
    /// With parallel edges this is the lightest weighted one, the first
    /// inserted among equals. Unweighted edges are only returned when no
    /// weighted alternative exists. Path search relaxes through the same edge,
    /// so weights and geometry always come from one edge.
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<&Edge> {
        self.preferred.get(&(from, to)).map(|&i| &self.edges[i])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn unweighted_edge_count(&self) -> usize {
        self.unweighted
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node closest to `coord` by great-circle distance.
    ///
    /// Returns the first node in insertion order among equally close ones,
    /// or `None` for an empty graph.
    pub fn nearest_node(&self, coord: Coordinate) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;
        for node in &self.nodes {
            let d = geodesy::distance(coord, node.coordinate());
            if !d.is_finite() {
                continue;
            }
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((node.id, d)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Axis-aligned extent of all nodes.
    pub fn extent(&self) -> Option<BoundingBox> {
        BoundingBox::enclosing(self.nodes.iter().map(Node::coordinate))
    }
}
