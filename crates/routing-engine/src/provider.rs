//! Region acquisition and caching.
//!
//! [`GraphProvider`] keeps exactly one cached [`Region`] (graph plus bounding
//! box) and replaces it wholesale when a request falls outside it.

use std::sync::Arc;
use std::time::Instant;

use routing_common::geodesy;
use routing_common::{BoundingBox, Coordinate, NodeId, Result, RoadGraph, RoutingError};
use tokio::sync::{Mutex, RwLock};

use crate::source::MapDataSource;

/// Buffer added around the origin/destination distance when sizing a region.
pub const RADIUS_BUFFER_M: f64 = 2_000.0;

/// Radius of the region fetched for a trip of `distance_m`:
/// `min(1.5 * distance + 2000, max_radius_m)`.
pub fn coverage_radius_m(distance_m: f64, max_radius_m: f64) -> f64 {
    (1.5 * distance_m + RADIUS_BUFFER_M).min(max_radius_m)
}

/// A road graph together with the area it is trusted to cover.
///
/// Built once and never mutated; the provider swaps whole `Arc<Region>`s so a
/// graph is never observed with another region's box.
#[derive(Debug)]
pub struct Region {
    pub graph: RoadGraph,
    pub bbox: BoundingBox,
}

impl Region {
    pub fn covers(&self, origin: &Coordinate, destination: &Coordinate) -> bool {
        self.bbox.contains_both(origin, destination)
    }

    pub fn nearest_node(&self, coord: Coordinate) -> Result<NodeId> {
        self.graph
            .nearest_node(coord)
            .ok_or(RoutingError::GraphNotReady)
    }
}

pub struct GraphProvider {
    source: Arc<dyn MapDataSource>,
    max_radius_m: f64,
    current: RwLock<Option<Arc<Region>>>,
    /// Serializes rebuilds; readers of `current` never wait on it
    rebuild: Mutex<()>,
}

impl GraphProvider {
    pub fn new(source: Arc<dyn MapDataSource>, max_radius_m: f64) -> Self {
        tracing::info!(
            source = source.name(),
            "GraphProvider initialised (graph will be built on demand)"
        );
        Self {
            source,
            max_radius_m,
            current: RwLock::new(None),
            rebuild: Mutex::new(()),
        }
    }

    /// Snapshot of the cached region, if any.
    pub async fn current(&self) -> Option<Arc<Region>> {
        self.current.read().await.clone()
    }

    /// Returns a region whose bounding box contains both points, building and
    /// installing a new one when the cached region does not.
    ///
    /// Only one rebuild runs at a time. A caller that waited for another
    /// rebuild re-checks coverage before starting its own. The new region is
    /// installed only once fully built, so dropping this future mid-build
    /// leaves the previous region in place.
    pub async fn ensure_coverage(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Arc<Region>> {
        if let Some(region) = self.covering(&origin, &destination).await {
            return Ok(region);
        }

        let _guard = self.rebuild.lock().await;

        // Another request may have installed a covering region while we waited
        if let Some(region) = self.covering(&origin, &destination).await {
            return Ok(region);
        }

        let region = Arc::new(self.build_region(origin, destination).await?);
        *self.current.write().await = Some(Arc::clone(&region));
        Ok(region)
    }

    /// Nearest node to `coord` in the cached region.
    pub async fn nearest_node(&self, coord: Coordinate) -> Result<NodeId> {
        let region = self.current().await.ok_or(RoutingError::GraphNotReady)?;
        region.nearest_node(coord)
    }

    async fn covering(&self, origin: &Coordinate, destination: &Coordinate) -> Option<Arc<Region>> {
        self.current()
            .await
            .filter(|region| region.covers(origin, destination))
    }

    async fn build_region(&self, origin: Coordinate, destination: Coordinate) -> Result<Region> {
        let started = Instant::now();
        let distance_m = geodesy::distance(origin, destination);

        // A circle of radius R only holds both endpoints if they are <= 2R apart
        if distance_m > 2.0 * self.max_radius_m {
            tracing::warn!(
                "Requested OD distance ~{:.1} m exceeds 2×max radius={:.1} m; \
                 a region of radius {:.1} m cannot cover both endpoints",
                distance_m,
                2.0 * self.max_radius_m,
                self.max_radius_m
            );
        }

        let radius_m = coverage_radius_m(distance_m, self.max_radius_m);
        let center = origin.midpoint(&destination);

        tracing::info!(
            "Building new graph around midpoint ({:.6}, {:.6}) with radius={:.1} m (OD distance ~{:.1} m)",
            center.lat,
            center.lon,
            radius_m,
            distance_m
        );

        let data = self.source.fetch_region(center, radius_m).await?;
        let graph = RoadGraph::from_region(data);

        // Endpoints inside the fetched circle may sit past the last road node;
        // anything farther out is not covered by this graph
        let mut bbox = graph.extent().ok_or(RoutingError::EmptyRegion)?;
        for endpoint in [origin, destination] {
            if geodesy::distance(center, endpoint) <= radius_m {
                bbox = bbox.extend(&endpoint);
            }
        }

        tracing::info!(
            "Graph ready: {} nodes, {} edges; bbox N={:.6}, S={:.6}, E={:.6}, W={:.6} ({:.2} ms)",
            graph.node_count(),
            graph.edge_count(),
            bbox.north,
            bbox.south,
            bbox.east,
            bbox.west,
            started.elapsed().as_secs_f64() * 1000.0
        );

        Ok(Region { graph, bbox })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{milan_region, FixtureSource};
    use async_trait::async_trait;
    use routing_common::{Node, RawEdge, RegionData};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const ORIGIN: Coordinate = Coordinate::new(45.4642, 9.19);
    const DESTINATION: Coordinate = Coordinate::new(45.48, 9.25);

    fn provider(source: Arc<FixtureSource>) -> GraphProvider {
        GraphProvider::new(source, 15_000.0)
    }

    /// Records the requested center/radius and answers slowly.
    struct SlowSource {
        calls: AtomicUsize,
        requests: std::sync::Mutex<Vec<(Coordinate, f64)>>,
    }

    #[async_trait]
    impl MapDataSource for SlowSource {
        async fn fetch_region(&self, center: Coordinate, radius_m: f64) -> Result<RegionData> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push((center, radius_m));
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(milan_region())
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    struct FailingSource;

    #[async_trait]
    impl MapDataSource for FailingSource {
        async fn fetch_region(&self, _: Coordinate, _: f64) -> Result<RegionData> {
            Err(RoutingError::MapData("upstream unavailable".into()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[test]
    fn radius_policy_caps_long_trips() {
        assert_eq!(coverage_radius_m(10_000.0, 15_000.0), 15_000.0);
        assert_eq!(coverage_radius_m(1_000.0, 15_000.0), 3_500.0);
        assert_eq!(coverage_radius_m(0.0, 15_000.0), 2_000.0);
    }

    #[tokio::test]
    async fn nearest_node_before_any_graph_is_not_ready() {
        let provider = provider(Arc::new(FixtureSource::milan()));
        let err = provider.nearest_node(ORIGIN).await.unwrap_err();
        assert!(matches!(err, RoutingError::GraphNotReady));
        assert!(provider.current().await.is_none());
    }

    #[tokio::test]
    async fn builds_once_and_reuses_covering_region() {
        let source = Arc::new(FixtureSource::milan());
        let provider = provider(Arc::clone(&source));

        let first = provider.ensure_coverage(ORIGIN, DESTINATION).await.unwrap();
        let second = provider.ensure_coverage(ORIGIN, DESTINATION).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(provider.nearest_node(ORIGIN).await.unwrap(), 1);
        assert_eq!(provider.nearest_node(DESTINATION).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn rebuilds_when_a_point_leaves_the_box() {
        let source = Arc::new(FixtureSource::milan());
        let provider = provider(Arc::clone(&source));

        provider.ensure_coverage(ORIGIN, DESTINATION).await.unwrap();
        let far = Coordinate::new(45.60, 9.30);
        let region = provider.ensure_coverage(ORIGIN, far).await.unwrap();

        assert_eq!(source.fetch_count(), 2);
        assert!(region.covers(&ORIGIN, &far));
        let current = provider.current().await.unwrap();
        assert!(Arc::ptr_eq(&current, &region));
    }

    #[tokio::test]
    async fn bbox_spans_nodes_and_endpoints_inside_radius() {
        let provider = provider(Arc::new(FixtureSource::milan()));
        let outside = Coordinate::new(45.50, 9.30);
        let region = provider.ensure_coverage(ORIGIN, outside).await.unwrap();
        assert_eq!(region.bbox, BoundingBox::new(45.50, 45.4642, 9.30, 9.19));
    }

    /// Answers every fetch with two nodes right at the requested center.
    struct CenteredSource {
        requests: std::sync::Mutex<Vec<(Coordinate, f64)>>,
    }

    #[async_trait]
    impl MapDataSource for CenteredSource {
        async fn fetch_region(&self, center: Coordinate, radius_m: f64) -> Result<RegionData> {
            self.requests.lock().unwrap().push((center, radius_m));
            Ok(RegionData {
                nodes: vec![
                    Node::new(1, center.lat, center.lon),
                    Node::new(2, center.lat + 0.001, center.lon),
                ],
                edges: vec![RawEdge::new(1, 2, None)],
            })
        }

        fn name(&self) -> &'static str {
            "centered"
        }
    }

    #[tokio::test]
    async fn long_trip_caps_radius_and_keeps_node_extent() {
        let source = Arc::new(CenteredSource {
            requests: std::sync::Mutex::new(Vec::new()),
        });
        let provider = GraphProvider::new(source.clone(), 15_000.0);

        let origin = Coordinate::new(45.0, 9.0);
        let destination = Coordinate::new(45.6, 9.6);
        assert!(geodesy::distance(origin, destination) > 30_000.0);

        let region = provider.ensure_coverage(origin, destination).await.unwrap();
        let (center, radius) = source.requests.lock().unwrap()[0];
        assert_eq!(radius, 15_000.0);
        assert_eq!(
            region.bbox,
            BoundingBox::new(center.lat + 0.001, center.lat, center.lon, center.lon)
        );
        assert!(!region.covers(&origin, &destination));

        // A short trip near the far corner is nowhere near the cached nodes
        let a = Coordinate::new(45.01, 9.01);
        let b = Coordinate::new(45.02, 9.0);
        let rebuilt = provider.ensure_coverage(a, b).await.unwrap();
        assert_eq!(source.requests.lock().unwrap().len(), 2);
        assert!(rebuilt.covers(&a, &b));
    }

    #[tokio::test]
    async fn requests_region_at_midpoint_with_sized_radius() {
        let source = Arc::new(SlowSource {
            calls: AtomicUsize::new(0),
            requests: std::sync::Mutex::new(Vec::new()),
        });
        let provider = GraphProvider::new(source.clone(), 15_000.0);
        provider.ensure_coverage(ORIGIN, DESTINATION).await.unwrap();

        let requests = source.requests.lock().unwrap();
        let (center, radius) = requests[0];
        assert_eq!(center, ORIGIN.midpoint(&DESTINATION));
        let expected = coverage_radius_m(geodesy::distance(ORIGIN, DESTINATION), 15_000.0);
        assert_eq!(radius, expected);
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_rebuild() {
        let source = Arc::new(SlowSource {
            calls: AtomicUsize::new(0),
            requests: std::sync::Mutex::new(Vec::new()),
        });
        let provider = Arc::new(GraphProvider::new(source.clone(), 15_000.0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let provider = Arc::clone(&provider);
                tokio::spawn(async move { provider.ensure_coverage(ORIGIN, DESTINATION).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_rebuild_keeps_previous_region() {
        let source = Arc::new(SlowSource {
            calls: AtomicUsize::new(0),
            requests: std::sync::Mutex::new(Vec::new()),
        });
        let provider = GraphProvider::new(source.clone(), 15_000.0);
        let original = provider.ensure_coverage(ORIGIN, DESTINATION).await.unwrap();

        let far = Coordinate::new(46.0, 9.5);
        let attempt = tokio::time::timeout(
            Duration::from_millis(5),
            provider.ensure_coverage(ORIGIN, far),
        )
        .await;
        assert!(attempt.is_err());

        let current = provider.current().await.unwrap();
        assert!(Arc::ptr_eq(&current, &original));
    }

    #[tokio::test]
    async fn failed_fetch_is_propagated_and_nothing_is_cached() {
        let provider = GraphProvider::new(Arc::new(FailingSource), 15_000.0);
        let err = provider.ensure_coverage(ORIGIN, DESTINATION).await.unwrap_err();
        assert!(matches!(err, RoutingError::MapData(_)));
        assert!(provider.current().await.is_none());
    }

    #[tokio::test]
    async fn empty_region_is_rejected() {
        let provider = provider(Arc::new(FixtureSource::new(RegionData::default())));
        let err = provider.ensure_coverage(ORIGIN, DESTINATION).await.unwrap_err();
        assert!(matches!(err, RoutingError::EmptyRegion));
    }

    #[tokio::test]
    async fn nearest_node_uses_current_region() {
        let region = RegionData {
            nodes: vec![Node::new(7, 45.0, 9.0), Node::new(8, 45.01, 9.0)],
            edges: vec![RawEdge::new(7, 8, None)],
        };
        let provider = provider(Arc::new(FixtureSource::new(region)));
        let a = Coordinate::new(45.0, 9.0);
        let b = Coordinate::new(45.01, 9.0);
        provider.ensure_coverage(a, b).await.unwrap();
        assert_eq!(provider.nearest_node(Coordinate::new(45.009, 9.0)).await.unwrap(), 8);
    }
}
