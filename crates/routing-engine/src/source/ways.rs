//! Turns OSM-style ways into routable region data.
//!
//! Ways are split at junctions (nodes shared by several ways, or way ends),
//! so each edge runs from one junction to the next and carries the
//! intermediate points as its geometry.

use std::collections::{HashMap, HashSet};

use routing_common::{Coordinate, Node, NodeId, RawEdge, RegionData};

/// Travel direction allowed along a way's node order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Direction {
    Both,
    Forward,
    Backward,
}

impl Direction {
    pub(super) fn from_tags(oneway: Option<&str>, junction: Option<&str>) -> Self {
        match oneway {
            Some("yes" | "1" | "true") => Direction::Forward,
            Some("-1" | "reverse") => Direction::Backward,
            Some("no" | "false" | "0") => Direction::Both,
            _ if junction == Some("roundabout") => Direction::Forward,
            _ => Direction::Both,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct Way {
    pub nodes: Vec<NodeId>,
    pub direction: Direction,
}

/// Determines if a highway type is suitable for vehicle traffic.
pub(super) fn is_drivable(highway_type: &str) -> bool {
    matches!(
        highway_type,
        "motorway"
            | "motorway_link"
            | "trunk"
            | "trunk_link"
            | "primary"
            | "primary_link"
            | "secondary"
            | "secondary_link"
            | "tertiary"
            | "tertiary_link"
            | "unclassified"
            | "residential"
            | "service"
            | "living_street"
    )
}

/// Builds region data from ways and the coordinates of the nodes they use.
///
/// Nodes missing from `coords` cut a way in two, which is how clipping to a
/// radius is expressed. Edge lengths are left unset for the graph to derive.
pub(super) fn assemble_region(coords: &HashMap<NodeId, Coordinate>, ways: &[Way]) -> RegionData {
    let runs: Vec<(&[NodeId], Direction)> = ways
        .iter()
        .flat_map(|way| {
            way.nodes
                .split(|id| !coords.contains_key(id))
                .filter(|run| run.len() >= 2)
                .map(move |run| (run, way.direction))
        })
        .collect();

    let mut references: HashMap<NodeId, usize> = HashMap::new();
    for (run, _) in &runs {
        for id in run.iter() {
            *references.entry(*id).or_default() += 1;
        }
    }

    let mut region = RegionData::default();
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut add_node = |region: &mut RegionData, id: NodeId| {
        if seen.insert(id) {
            let c = coords[&id];
            region.nodes.push(Node::new(id, c.lat, c.lon));
        }
    };

    for (run, direction) in runs {
        let last = run.len() - 1;
        let mut start = run[0];
        let mut geometry = vec![coords[&start]];

        for (i, &id) in run.iter().enumerate().skip(1) {
            geometry.push(coords[&id]);
            let junction = i == last || references.get(&id).copied().unwrap_or(0) > 1;
            if !junction {
                continue;
            }

            add_node(&mut region, start);
            add_node(&mut region, id);
            push_edges(&mut region, start, id, &geometry, direction);

            start = id;
            geometry = vec![coords[&id]];
        }
    }

    region
}

fn push_edges(
    region: &mut RegionData,
    start: NodeId,
    end: NodeId,
    geometry: &[Coordinate],
    direction: Direction,
) {
    let forward = |geometry: &[Coordinate]| {
        let edge = RawEdge::new(start, end, None);
        if geometry.len() > 2 {
            edge.with_geometry(geometry.to_vec())
        } else {
            edge
        }
    };
    let backward = |geometry: &[Coordinate]| {
        let edge = RawEdge::new(end, start, None);
        if geometry.len() > 2 {
            edge.with_geometry(geometry.iter().rev().copied().collect())
        } else {
            edge
        }
    };

    match direction {
        Direction::Forward => region.edges.push(forward(geometry)),
        Direction::Backward => region.edges.push(backward(geometry)),
        Direction::Both => {
            region.edges.push(forward(geometry));
            region.edges.push(backward(geometry));
        }
    }
}
