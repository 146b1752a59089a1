use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use osmpbfreader::{OsmObj, OsmPbfReader};
use routing_common::geodesy;
use routing_common::{Coordinate, NodeId, RegionData, Result, RoutingError};

use super::ways::{assemble_region, is_drivable, Direction, Way};
use super::MapDataSource;

/// Reads regions out of a local OpenStreetMap PBF extract.
///
/// The whole file is scanned and decoded on every fetch, so each region
/// rebuild costs time proportional to the extract size; prefer a small
/// regional extract. Only nodes within the requested radius are kept, and
/// ways leaving the circle are cut at its edge.
#[derive(Debug, Clone)]
pub struct PbfSource {
    path: PathBuf,
}

impl PbfSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MapDataSource for PbfSource {
    async fn fetch_region(&self, center: Coordinate, radius_m: f64) -> Result<RegionData> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load_region(&path, center, radius_m))
            .await
            .map_err(|e| RoutingError::Internal(format!("PBF loader task failed: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "pbf"
    }
}

fn load_region(path: &Path, center: Coordinate, radius_m: f64) -> Result<RegionData> {
    tracing::info!("🗺️ Loading map from: {}", path.display());
    let file = File::open(path)?;
    let mut pbf = OsmPbfReader::new(file);

    // Drivable ways plus the nodes they reference
    let objs = pbf
        .get_objs_and_deps(|obj| {
            obj.is_way()
                && obj
                    .tags()
                    .get("highway")
                    .map_or(false, |h| is_drivable(h.as_str()))
        })
        .map_err(|e| RoutingError::MapData(format!("Could not read PBF data: {}", e)))?;

    let mut coords: HashMap<NodeId, Coordinate> = HashMap::new();
    let mut ways = Vec::new();

    for obj in objs.values() {
        match obj {
            OsmObj::Node(n) => {
                let coord = Coordinate::new(n.lat(), n.lon());
                if geodesy::distance(center, coord) <= radius_m {
                    coords.insert(n.id.0, coord);
                }
            }
            OsmObj::Way(w) => {
                ways.push(Way {
                    nodes: w.nodes.iter().map(|id| id.0).collect(),
                    direction: Direction::from_tags(
                        w.tags.get("oneway").map(|s| s.as_str()),
                        w.tags.get("junction").map(|s| s.as_str()),
                    ),
                });
            }
            OsmObj::Relation(_) => {}
        }
    }

    let region = assemble_region(&coords, &ways);
    tracing::info!(
        "✅ Map clipped: {} nodes, {} road segments within {:.0} m",
        region.nodes.len(),
        region.edges.len(),
        radius_m
    );
    Ok(region)
}
