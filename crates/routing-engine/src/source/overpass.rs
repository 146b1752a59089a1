use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use routing_common::{Coordinate, NodeId, RegionData, Result, RoutingError};
use serde::Deserialize;

use super::ways::{assemble_region, is_drivable, Direction, Way};
use super::MapDataSource;

const DRIVABLE_HIGHWAY_REGEX: &str = "^(motorway|motorway_link|trunk|trunk_link|primary|primary_link|secondary|secondary_link|tertiary|tertiary_link|unclassified|residential|service|living_street)$";

/// Downloads drivable roads around a point from an Overpass API endpoint.
pub struct OverpassSource {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl OverpassSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .user_agent(concat!("routing-engine/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    fn query(&self, center: Coordinate, radius_m: f64) -> String {
        format!(
            r#"[out:json][timeout:{}];
(
  way["highway"~"{}"](around:{:.0},{:.7},{:.7});
);
(._;>;);
out body;"#,
            self.timeout.as_secs().max(1),
            DRIVABLE_HIGHWAY_REGEX,
            radius_m,
            center.lat,
            center.lon
        )
    }
}

#[async_trait]
impl MapDataSource for OverpassSource {
    async fn fetch_region(&self, center: Coordinate, radius_m: f64) -> Result<RegionData> {
        let query = self.query(center, radius_m);
        tracing::debug!("Overpass query:\n{}", query);

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(query)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Overpass request failed: {}", e);
                RoutingError::Http(e)
            })?;

        let status = response.status();
        tracing::info!("Received Overpass response: status={}", status);
        if !status.is_success() {
            return Err(RoutingError::MapData(format!(
                "Overpass API returned status {}",
                status
            )));
        }

        let body: OverpassResponse = response.json().await?;
        tracing::info!("Downloaded {} OSM elements", body.elements.len());

        Ok(region_from_response(&body))
    }

    fn name(&self) -> &'static str {
        "overpass"
    }
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OsmElement>,
}

#[derive(Debug, Deserialize)]
struct OsmElement {
    #[serde(rename = "type")]
    kind: String,
    id: NodeId,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    nodes: Vec<NodeId>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

fn region_from_response(response: &OverpassResponse) -> RegionData {
    let mut coords: HashMap<NodeId, Coordinate> = HashMap::new();
    let mut ways = Vec::new();

    for element in &response.elements {
        match element.kind.as_str() {
            "node" => {
                if let (Some(lat), Some(lon)) = (element.lat, element.lon) {
                    coords.insert(element.id, Coordinate::new(lat, lon));
                }
            }
            "way" => {
                let highway = element.tags.get("highway").map(String::as_str).unwrap_or("");
                if !is_drivable(highway) {
                    continue;
                }
                ways.push(Way {
                    nodes: element.nodes.clone(),
                    direction: Direction::from_tags(
                        element.tags.get("oneway").map(String::as_str),
                        element.tags.get("junction").map(String::as_str),
                    ),
                });
            }
            _ => {}
        }
    }

    assemble_region(&coords, &ways)
}
