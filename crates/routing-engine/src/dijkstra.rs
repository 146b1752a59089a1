use std::{cmp::Ordering, collections::BinaryHeap, collections::HashMap};

use routing_common::{NodeId, Result, RoadGraph, RoutingError};

#[derive(Copy, Clone)]
struct State {
    cost: f64,
    /// Push order, so equal costs pop first-in first-out
    seq: u64,
    node: NodeId,
}

// Implement Ord for State to use in BinaryHeap
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost, then by insertion order (reversed from standard Rust BinaryHeap)
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

/// Dijkstra's algorithm from `source` to `target` over normalized edge weights.
///
/// Returns the node sequence from `source` to `target`, both included.
/// Unweighted edges are never traversed. A node's predecessor only changes on
/// a strictly shorter path, so the first path found among equal-cost ones
/// wins, and for parallel edges the lightest one is the one relaxed, the same
/// edge [`RoadGraph::edge_between`] reports.
pub fn shortest_path(graph: &RoadGraph, source: NodeId, target: NodeId) -> Result<Vec<NodeId>> {
    for id in [source, target] {
        if !graph.contains_node(id) {
            return Err(RoutingError::UnknownNode(id));
        }
    }
    if source == target {
        return Ok(vec![source]);
    }

    let estimated_nodes = graph.node_count().min(1000);
    let mut distances: HashMap<NodeId, f64> = HashMap::with_capacity(estimated_nodes);
    let mut predecessors: HashMap<NodeId, NodeId> = HashMap::with_capacity(estimated_nodes);
    let mut heap = BinaryHeap::with_capacity(estimated_nodes / 4);
    let mut seq = 0u64;

    // Start node has distance 0
    heap.push(State {
        cost: 0.0,
        seq,
        node: source,
    });
    distances.insert(source, 0.0);

    let mut reached = false;
    while let Some(State { cost, node, .. }) = heap.pop() {
        if node == target {
            reached = true;
            break;
        }

        // Skip if we've found a better path
        if let Some(&best) = distances.get(&node) {
            if cost > best {
                continue;
            }
        }

        // Examine neighbors
        for edge in graph.out_edges(node) {
            let Some(weight) = edge.weight_m else {
                continue;
            };
            let next = edge.to;
            let next_cost = cost + weight;

            let improves = distances.get(&next).map_or(true, |&d| next_cost < d);
            if improves {
                distances.insert(next, next_cost);
                predecessors.insert(next, node);
                seq += 1;
                heap.push(State {
                    cost: next_cost,
                    seq,
                    node: next,
                });
            }
        }
    }

    if !reached {
        return Err(RoutingError::NoPathFound { from: source, to: target });
    }

    let mut path = vec![target];
    let mut current = target;
    while current != source {
        current = *predecessors
            .get(&current)
            .ok_or_else(|| RoutingError::Internal(format!("broken predecessor chain at node {current}")))?;
        path.push(current);
    }
    path.reverse();
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use routing_common::{Node, RawEdge, RegionData};

    fn graph(nodes: &[NodeId], edges: &[(NodeId, NodeId, Option<f64>)]) -> RoadGraph {
        RoadGraph::from_region(RegionData {
            nodes: nodes
                .iter()
                .map(|&id| Node::new(id, 45.0 + id as f64 * 0.01, 9.0))
                .collect(),
            edges: edges
                .iter()
                .map(|&(from, to, length)| RawEdge::new(from, to, length))
                .collect(),
        })
    }

    #[test]
    fn prefers_cheaper_chain_over_direct_edge() {
        let g = graph(
            &[1, 2, 3],
            &[(1, 2, Some(1000.0)), (2, 3, Some(1500.0)), (1, 3, Some(2600.0))],
        );
        assert_eq!(shortest_path(&g, 1, 3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn takes_direct_edge_when_cheaper() {
        let g = graph(
            &[1, 2, 3],
            &[(1, 2, Some(1000.0)), (2, 3, Some(1500.0)), (1, 3, Some(2400.0))],
        );
        assert_eq!(shortest_path(&g, 1, 3).unwrap(), vec![1, 3]);
    }

    #[test]
    fn respects_edge_direction() {
        let g = graph(&[1, 2], &[(1, 2, Some(10.0))]);
        assert!(matches!(
            shortest_path(&g, 2, 1),
            Err(RoutingError::NoPathFound { from: 2, to: 1 })
        ));
    }

    #[test]
    fn disconnected_components_have_no_path() {
        let g = graph(&[1, 2, 3, 4], &[(1, 2, Some(5.0)), (3, 4, Some(5.0))]);
        let err = shortest_path(&g, 1, 4).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn unknown_nodes_are_rejected() {
        let g = graph(&[1, 2], &[(1, 2, Some(10.0))]);
        assert!(matches!(shortest_path(&g, 1, 42), Err(RoutingError::UnknownNode(42))));
        assert!(matches!(shortest_path(&g, 42, 1), Err(RoutingError::UnknownNode(42))));
    }

    #[test]
    fn source_equals_target() {
        let g = graph(&[1, 2], &[(1, 2, Some(10.0))]);
        assert_eq!(shortest_path(&g, 2, 2).unwrap(), vec![2]);
    }

    #[test]
    fn equal_cost_paths_resolve_deterministically() {
        // 1 -> 2 -> 4 and 1 -> 3 -> 4 both cost 20; 2 is discovered first
        let g = graph(
            &[1, 2, 3, 4],
            &[
                (1, 2, Some(10.0)),
                (1, 3, Some(10.0)),
                (2, 4, Some(10.0)),
                (3, 4, Some(10.0)),
            ],
        );
        for _ in 0..5 {
            assert_eq!(shortest_path(&g, 1, 4).unwrap(), vec![1, 2, 4]);
        }
    }

    #[test]
    fn uses_lightest_parallel_edge() {
        let g = graph(
            &[1, 2, 3],
            &[(1, 2, Some(500.0)), (1, 2, Some(100.0)), (2, 3, Some(100.0)), (1, 3, Some(250.0))],
        );
        assert_eq!(shortest_path(&g, 1, 3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn zero_weight_edges_are_allowed() {
        let g = graph(&[1, 2, 3], &[(1, 2, Some(0.0)), (2, 3, Some(0.0))]);
        assert_eq!(shortest_path(&g, 1, 3).unwrap(), vec![1, 2, 3]);
    }
}
