use std::sync::Arc;
use std::time::Instant;

use routing_common::{Coordinate, Result, RoutingError};

use crate::dijkstra::shortest_path;
use crate::provider::GraphProvider;
use crate::route::{RouteBuilder, RouteResult};
use crate::source::MapDataSource;

/// Tunables for the routing engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Constant travel speed used for every duration
    pub speed_kmh: f64,
    /// Upper bound on the radius of a fetched region
    pub max_radius_m: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            speed_kmh: 40.0,
            max_radius_m: 15_000.0,
        }
    }
}

/// Facade tying region acquisition, path search and route assembly together.
pub struct RoutingEngine {
    provider: GraphProvider,
    builder: RouteBuilder,
    max_radius_m: f64,
}

impl RoutingEngine {
    pub fn new(source: Arc<dyn MapDataSource>, settings: EngineSettings) -> Result<Self> {
        if !(settings.max_radius_m.is_finite() && settings.max_radius_m > 0.0) {
            return Err(RoutingError::Config(format!(
                "max radius must be a positive number of meters, got {}",
                settings.max_radius_m
            )));
        }
        let builder = RouteBuilder::new(settings.speed_kmh)?;
        tracing::info!(
            speed_kmh = settings.speed_kmh,
            max_radius_m = settings.max_radius_m,
            "RoutingEngine initialised"
        );

        Ok(Self {
            provider: GraphProvider::new(source, settings.max_radius_m),
            builder,
            max_radius_m: settings.max_radius_m,
        })
    }

    /// Whether a region has been built yet.
    pub async fn graph_loaded(&self) -> bool {
        self.provider.current().await.is_some()
    }

    /// Computes the shortest drivable route between two points.
    ///
    /// A missing path comes back as [`RoutingError::NoPathFound`]; nothing is
    /// retried. Routes longer than twice the maximum region radius carry a
    /// warning since the region may not have covered the whole trip.
    pub async fn compute_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteResult> {
        let started = Instant::now();
        tracing::info!(
            "Received routing request from ({:.6}, {:.6}) -> ({:.6}, {:.6})",
            origin.lat,
            origin.lon,
            destination.lat,
            destination.lon
        );

        // 1) Ensure graph
        let phase = Instant::now();
        let region = self.provider.ensure_coverage(origin, destination).await?;
        tracing::info!("Graph ensured for request in {:.2} ms", elapsed_ms(phase));

        // 2) Nearest-node lookups
        let phase = Instant::now();
        let source = region.nearest_node(origin)?;
        let target = region.nearest_node(destination)?;
        tracing::info!(
            "Nearest-node lookup: origin_node={}, destination_node={}, time={:.2} ms",
            source,
            target,
            elapsed_ms(phase)
        );

        // 3) Shortest path, off the async workers and on the same snapshot
        let phase = Instant::now();
        let search_region = Arc::clone(&region);
        let path = tokio::task::spawn_blocking(move || {
            shortest_path(&search_region.graph, source, target)
        })
        .await
        .map_err(|e| RoutingError::Internal(format!("path search task failed: {}", e)))?;
        let path = match path {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!("No route between node {} and node {}: {}", source, target, err);
                return Err(err);
            }
        };
        tracing::info!(
            "Shortest path found with {} nodes in {:.2} ms",
            path.len(),
            elapsed_ms(phase)
        );

        // 4) Geometry, steps and totals
        let mut route = self.builder.build(&region.graph, &path)?;

        if route.distance_m > 2.0 * self.max_radius_m {
            let warning = format!(
                "Route distance ({:.0} m) exceeds 2×max graph radius ({:.0} m). \
                 Routing may fail or be incomplete.",
                route.distance_m,
                2.0 * self.max_radius_m
            );
            tracing::warn!("{}", warning);
            route.warnings.push(warning);
        }

        tracing::info!(
            "Route summary: distance={:.1} m, duration={:.1} s",
            route.distance_m,
            route.duration_s
        );
        tracing::info!("Total routing time: {:.2} ms", elapsed_ms(started));

        Ok(route)
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
