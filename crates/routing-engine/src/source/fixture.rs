use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use routing_common::{Coordinate, Node, RawEdge, RegionData, Result};

use super::MapDataSource;

/// Three nodes near Milan: a chain 1 -> 2 -> 3 plus a slightly longer
/// direct edge 1 -> 3.
pub fn milan_region() -> RegionData {
    RegionData {
        nodes: vec![
            Node::new(1, 45.4642, 9.19),
            Node::new(2, 45.4720, 9.22),
            Node::new(3, 45.4800, 9.25),
        ],
        edges: vec![
            RawEdge::new(1, 2, Some(1000.0)),
            RawEdge::new(2, 3, Some(1500.0)),
            RawEdge::new(1, 3, Some(2600.0)),
        ],
    }
}

/// Serves the same in-memory region for every request, whatever the center
/// and radius. Counts fetches so callers can observe cache behaviour.
#[derive(Debug)]
pub struct FixtureSource {
    region: RegionData,
    fetches: AtomicUsize,
}

impl FixtureSource {
    pub fn new(region: RegionData) -> Self {
        Self {
            region,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn milan() -> Self {
        Self::new(milan_region())
    }

    /// Number of completed `fetch_region` calls.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MapDataSource for FixtureSource {
    async fn fetch_region(&self, center: Coordinate, radius_m: f64) -> Result<RegionData> {
        tracing::debug!(
            "Serving fixture region for ({:.6}, {:.6}), radius={:.1} m",
            center.lat,
            center.lon,
            radius_m
        );
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.region.clone())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
