//! Route assembly: geometry stitching, per-edge steps and totals.

use routing_common::{Coordinate, NodeId, Result, RoadGraph, RoutingError};
use serde::{Serialize, Serializer};

/// One traversed edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub from_node: NodeId,
    pub to_node: NodeId,
    pub distance_m: f64,
    pub duration_s: f64,
}

/// A computed route. Serializes to the public response shape, with the
/// geometry emitted both as a `LineString` object and as a plain
/// `summary.geometry` list of `[lat, lon]` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub distance_m: f64,
    pub duration_s: f64,
    pub geometry: Vec<Coordinate>,
    pub steps: Vec<Step>,
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
struct LineString {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: Vec<[f64; 2]>,
}

#[derive(Serialize)]
struct Summary<'a> {
    distance_m: f64,
    duration_s: f64,
    geometry: &'a [[f64; 2]],
}

#[derive(Serialize)]
struct WireRoute<'a> {
    distance_m: f64,
    duration_s: f64,
    geometry: LineString,
    summary: Summary<'a>,
    steps: &'a [Step],
    warnings: &'a [String],
}

impl Serialize for RouteResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let coordinates: Vec<[f64; 2]> = self.geometry.iter().map(Coordinate::to_lat_lon).collect();
        let wire = WireRoute {
            distance_m: self.distance_m,
            duration_s: self.duration_s,
            summary: Summary {
                distance_m: self.distance_m,
                duration_s: self.duration_s,
                geometry: &coordinates,
            },
            geometry: LineString {
                kind: "LineString",
                coordinates: coordinates.clone(),
            },
            steps: &self.steps,
            warnings: &self.warnings,
        };
        wire.serialize(serializer)
    }
}

/// Converts node paths into routes under a constant-speed model.
#[derive(Debug, Clone, Copy)]
pub struct RouteBuilder {
    speed_mps: f64,
}

impl RouteBuilder {
    pub fn new(speed_kmh: f64) -> Result<Self> {
        if !(speed_kmh.is_finite() && speed_kmh > 0.0) {
            return Err(RoutingError::Config(format!(
                "speed must be a positive number of km/h, got {}",
                speed_kmh
            )));
        }
        Ok(Self {
            speed_mps: speed_kmh * 1000.0 / 3600.0,
        })
    }

    /// Travel time for `distance_m` at the configured speed.
    pub fn duration_s(&self, distance_m: f64) -> f64 {
        if distance_m <= 0.0 {
            return 0.0;
        }
        distance_m / self.speed_mps
    }

    /// Builds geometry, steps and totals for `path`. Warnings are left empty.
    ///
    /// Edges without a resolvable weight contribute geometry but neither a
    /// step nor distance.
    pub fn build(&self, graph: &RoadGraph, path: &[NodeId]) -> Result<RouteResult> {
        let geometry = stitch_geometry(graph, path)?;

        let mut steps = Vec::with_capacity(path.len().saturating_sub(1));
        for pair in path.windows(2) {
            let (u, v) = (pair[0], pair[1]);
            let Some(weight) = graph.edge_between(u, v).and_then(|e| e.weight_m) else {
                tracing::warn!(from = u, to = v, "Skipping edge without weight in route steps");
                continue;
            };
            steps.push(Step {
                from_node: u,
                to_node: v,
                distance_m: weight,
                duration_s: self.duration_s(weight),
            });
        }

        let distance_m: f64 = steps.iter().map(|s| s.distance_m).sum();
        Ok(RouteResult {
            distance_m,
            duration_s: self.duration_s(distance_m),
            geometry,
            steps,
            warnings: Vec::new(),
        })
    }
}

/// Concatenates edge geometries along `path`, falling back to straight
/// node-to-node segments. The first point of every segment after the first
/// is dropped since it repeats the shared node.
fn stitch_geometry(graph: &RoadGraph, path: &[NodeId]) -> Result<Vec<Coordinate>> {
    let coordinate = |id: NodeId| {
        graph
            .node(id)
            .map(|n| n.coordinate())
            .ok_or(RoutingError::UnknownNode(id))
    };

    match path {
        [] => return Ok(Vec::new()),
        [only] => return Ok(vec![coordinate(*only)?]),
        _ => {}
    }

    let mut coords = Vec::new();
    for (i, pair) in path.windows(2).enumerate() {
        let (u, v) = (pair[0], pair[1]);
        let detailed = graph
            .edge_between(u, v)
            .and_then(|e| e.geometry.as_deref())
            .filter(|points| points.len() >= 2);

        let segment = match detailed {
            Some(points) => points.to_vec(),
            None => vec![coordinate(u)?, coordinate(v)?],
        };

        let skip = if i == 0 { 0 } else { 1 };
        coords.extend(segment.into_iter().skip(skip));
    }
    Ok(coords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use routing_common::{Node, RawEdge, RegionData};

    fn milan_graph() -> RoadGraph {
        RoadGraph::from_region(crate::source::milan_region())
    }

    #[test]
    fn builds_steps_and_totals() {
        let builder = RouteBuilder::new(40.0).unwrap();
        let route = builder.build(&milan_graph(), &[1, 2, 3]).unwrap();

        assert_eq!(route.steps.len(), 2);
        assert_eq!(route.distance_m, 2500.0);
        assert!((route.duration_s - 225.0).abs() < 1e-9);
        assert_eq!(route.steps[0].from_node, 1);
        assert_eq!(route.steps[0].to_node, 2);
        assert_eq!(route.steps[1].distance_m, 1500.0);

        let step_total: f64 = route.steps.iter().map(|s| s.duration_s).sum();
        assert!((step_total - route.duration_s).abs() < 1e-9);
    }

    #[test]
    fn straight_segments_share_vertices_once() {
        let builder = RouteBuilder::new(40.0).unwrap();
        let route = builder.build(&milan_graph(), &[1, 2, 3]).unwrap();
        assert_eq!(
            route.geometry,
            vec![
                Coordinate::new(45.4642, 9.19),
                Coordinate::new(45.4720, 9.22),
                Coordinate::new(45.4800, 9.25),
            ]
        );
    }

    #[test]
    fn detailed_geometry_is_stitched_without_duplicates() {
        let a = Coordinate::new(45.0, 9.0);
        let bend = Coordinate::new(45.005, 9.01);
        let b = Coordinate::new(45.01, 9.0);
        let c = Coordinate::new(45.02, 9.0);
        let region = RegionData {
            nodes: vec![
                Node::new(1, a.lat, a.lon),
                Node::new(2, b.lat, b.lon),
                Node::new(3, c.lat, c.lon),
            ],
            edges: vec![
                RawEdge::new(1, 2, Some(1500.0)).with_geometry(vec![a, bend, b]),
                RawEdge::new(2, 3, Some(1100.0)),
            ],
        };
        let graph = RoadGraph::from_region(region);
        let route = RouteBuilder::new(40.0).unwrap().build(&graph, &[1, 2, 3]).unwrap();
        assert_eq!(route.geometry, vec![a, bend, b, c]);
    }

    #[test]
    fn single_node_path_is_a_single_point() {
        let route = RouteBuilder::new(40.0)
            .unwrap()
            .build(&milan_graph(), &[2])
            .unwrap();
        assert_eq!(route.geometry, vec![Coordinate::new(45.4720, 9.22)]);
        assert_eq!(route.distance_m, 0.0);
        assert_eq!(route.duration_s, 0.0);
        assert!(route.steps.is_empty());
    }

    #[test]
    fn unweighted_edges_are_skipped_in_steps() {
        let region = RegionData {
            nodes: vec![
                Node::new(1, 45.0, 9.0),
                Node::new(2, f64::NAN, 9.0),
                Node::new(3, 45.02, 9.0),
            ],
            edges: vec![RawEdge::new(1, 2, None), RawEdge::new(2, 3, Some(300.0))],
        };
        let graph = RoadGraph::from_region(region);
        let route = RouteBuilder::new(36.0).unwrap().build(&graph, &[1, 2, 3]).unwrap();
        assert_eq!(route.steps.len(), 1);
        assert_eq!(route.distance_m, 300.0);
        assert!((route.duration_s - 30.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_path_node_is_an_error() {
        let err = RouteBuilder::new(40.0)
            .unwrap()
            .build(&milan_graph(), &[1, 99])
            .unwrap_err();
        assert!(matches!(err, RoutingError::UnknownNode(99)));
    }

    #[test]
    fn invalid_speed_is_rejected() {
        assert!(RouteBuilder::new(0.0).is_err());
        assert!(RouteBuilder::new(f64::NAN).is_err());
    }

    #[test]
    fn serializes_to_response_shape() {
        let route = RouteBuilder::new(40.0)
            .unwrap()
            .build(&milan_graph(), &[1, 2])
            .unwrap();
        let json = serde_json::to_value(&route).unwrap();

        assert_eq!(json["distance_m"], 1000.0);
        assert_eq!(json["geometry"]["type"], "LineString");
        assert_eq!(json["geometry"]["coordinates"][0][0], 45.4642);
        assert_eq!(json["geometry"]["coordinates"][0][1], 9.19);
        assert_eq!(json["summary"]["geometry"], json["geometry"]["coordinates"]);
        assert_eq!(json["summary"]["duration_s"], json["duration_s"]);
        assert_eq!(json["steps"][0]["from_node"], 1);
        assert_eq!(json["steps"][0]["to_node"], 2);
        assert_eq!(json["warnings"], serde_json::json!([]));
    }
}
