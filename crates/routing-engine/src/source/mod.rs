//! Map-data sources.
//!
//! A [`MapDataSource`] delivers the drivable road network within a radius of a
//! center point. The provider picks one at construction time and never looks
//! at the environment to decide.

mod fixture;
mod overpass;
mod pbf;
mod ways;

use async_trait::async_trait;
use routing_common::{Coordinate, RegionData, Result};

pub use fixture::{milan_region, FixtureSource};
pub use overpass::OverpassSource;
pub use pbf::PbfSource;

#[async_trait]
pub trait MapDataSource: Send + Sync {
    /// Fetches every drivable road segment within `radius_m` of `center`.
    async fn fetch_region(&self, center: Coordinate, radius_m: f64) -> Result<RegionData>;

    /// Short label for logs.
    fn name(&self) -> &'static str;
}
